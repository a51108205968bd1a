// ==================== HELP-CHAT RELAY ====================
// O widget do site grava o log da conversa; o admin responde via outbox
// e o widget busca as respostas pendentes da sua sessão.

use crate::models::{ChatRole, HelpchatLogEntry, OutboxMessage};
use crate::services::json_store::JsonFileStore;
use crate::utils::error::{AppError, AppResult};
use serde::Deserialize;
use std::path::Path;

/// Oldest log entries are dropped past this size
const MAX_LOG_ENTRIES: usize = 5_000;
/// Delivered outbox messages are kept this long for the admin's history
const DELIVERED_RETENTION_SECS: i64 = 7 * 24 * 3600;
const MAX_MESSAGE_CHARS: usize = 8_000;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HelpchatLogRequest {
    pub session_id: String,
    #[serde(default = "default_role")]
    pub role: ChatRole,
    pub message: String,
    pub page: Option<String>,
}

fn default_role() -> ChatRole {
    ChatRole::User
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutboxRequest {
    pub session_id: String,
    pub message: String,
}

pub struct HelpchatService {
    log: JsonFileStore<Vec<HelpchatLogEntry>>,
    outbox: JsonFileStore<Vec<OutboxMessage>>,
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", field)));
    }
    if value.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::InvalidRequest(format!("{} is too long", field)));
    }
    Ok(value.to_string())
}

impl HelpchatService {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            log: JsonFileStore::new(data_dir.join("helpchat-log.json")),
            outbox: JsonFileStore::new(data_dir.join("helpchat-outbox.json")),
        }
    }

    /// Widget-side append. Admin entries only come from [`Self::enqueue`].
    pub async fn append_log(&self, request: HelpchatLogRequest) -> AppResult<HelpchatLogEntry> {
        if request.role == ChatRole::Admin {
            return Err(AppError::Forbidden("Admin replies go through the outbox".to_string()));
        }
        let entry = HelpchatLogEntry {
            session_id: required(&request.session_id, "sessionId")?,
            role: request.role,
            message: required(&request.message, "message")?,
            page: request.page.filter(|p| !p.trim().is_empty()),
            created_at: chrono::Utc::now().timestamp(),
        };

        let stored = entry.clone();
        self.log
            .update(move |entries| {
                entries.push(stored);
                if entries.len() > MAX_LOG_ENTRIES {
                    let excess = entries.len() - MAX_LOG_ENTRIES;
                    entries.drain(..excess);
                }
            })
            .await?;

        Ok(entry)
    }

    pub async fn list_log(&self, session_id: Option<&str>) -> AppResult<Vec<HelpchatLogEntry>> {
        let entries = self.log.load().await?;
        Ok(match session_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(session) => entries.into_iter().filter(|e| e.session_id == session).collect(),
            None => entries,
        })
    }

    pub async fn enqueue(&self, request: OutboxRequest) -> AppResult<OutboxMessage> {
        let message = OutboxMessage {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: required(&request.session_id, "sessionId")?,
            message: required(&request.message, "message")?,
            created_at: chrono::Utc::now().timestamp(),
            delivered: false,
        };

        let queued = message.clone();
        self.outbox.update(move |messages| messages.push(queued)).await?;

        // A resposta do admin também entra no log da sessão
        self.log
            .update({
                let entry = HelpchatLogEntry {
                    session_id: message.session_id.clone(),
                    role: ChatRole::Admin,
                    message: message.message.clone(),
                    page: None,
                    created_at: message.created_at,
                };
                move |entries| entries.push(entry)
            })
            .await?;

        Ok(message)
    }

    /// Returns pending messages for a session and marks them delivered.
    pub async fn take_pending(&self, session_id: &str) -> AppResult<Vec<OutboxMessage>> {
        let session_id = required(session_id, "sessionId")?;
        let now = chrono::Utc::now().timestamp();

        self.outbox
            .update(move |messages| {
                messages.retain(|m| !m.delivered || now - m.created_at < DELIVERED_RETENTION_SECS);

                let mut pending = Vec::new();
                for message in messages.iter_mut() {
                    if message.session_id == session_id && !message.delivered {
                        message.delivered = true;
                        pending.push(message.clone());
                    }
                }
                pending
            })
            .await
    }
}
