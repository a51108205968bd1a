// ==================== ADMIN ====================
// Quem é admin vem só da tabela "users"; seleção de clientes fica em JSON.

use crate::database::PortalStore;
use crate::services::json_store::JsonFileStore;
use crate::services::token_service::Claims;
use crate::utils::error::{AppError, AppResult};
use std::collections::HashSet;
use std::path::Path;

pub async fn is_admin(store: &dyn PortalStore, email: &str) -> AppResult<bool> {
    if email.is_empty() {
        return Ok(false);
    }
    Ok(store.get_user(email).await?.map(|u| u.is_admin()).unwrap_or(false))
}

pub async fn require_admin(store: &dyn PortalStore, claims: &Claims) -> AppResult<()> {
    let email = claims.email();
    if is_admin(store, &email).await? {
        Ok(())
    } else {
        log::warn!("🚫 Admin access denied for user {} ({})", claims.sub, email);
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// Trims ids, drops empties and duplicates, keeps first-seen order
pub fn normalize_selection(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

/// Client ids the admin has checked, shared across browsers
pub struct AdminSelection {
    file: JsonFileStore<Vec<String>>,
}

impl AdminSelection {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: JsonFileStore::new(data_dir.join("selected-clients.json")),
        }
    }

    pub async fn get(&self) -> AppResult<Vec<String>> {
        self.file.load().await
    }

    pub async fn set(&self, ids: Vec<String>) -> AppResult<Vec<String>> {
        let selected = normalize_selection(ids);
        let stored = selected.clone();
        self.file.update(move |current| *current = stored).await?;
        Ok(selected)
    }
}
