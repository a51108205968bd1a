use super::{AdminTable, PortalStore};
use crate::models::{Client, Document, Service, User};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    clients: HashMap<String, Client>,
    documents: HashMap<String, Document>,
    users: HashMap<String, User>,
    services: Vec<Service>,
}

/// In-process store used when no `DATABASE_URL` is configured.
/// Data lives only as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    fail_deletes: AtomicBool,
    #[cfg(test)]
    fail_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `delete_document` fail, to exercise the soft-hide fallback.
    #[cfg(test)]
    pub fn fail_document_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    /// Makes `insert_document` fail, to exercise the orphan cleanup.
    #[cfg(test)]
    pub fn fail_document_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }
}

fn rows<T: Serialize>(items: Vec<&T>, limit: usize) -> AppResult<Vec<serde_json::Value>> {
    items
        .into_iter()
        .take(limit)
        .map(|item| {
            serde_json::to_value(item)
                .map_err(|e| AppError::DatabaseError(format!("Failed to serialize row: {}", e)))
        })
        .collect()
}

#[async_trait]
impl PortalStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_client(&self, id: &str) -> AppResult<Option<Client>> {
        Ok(self.tables.read().await.clients.get(id).cloned())
    }

    async fn find_client_by_email(&self, email: &str) -> AppResult<Option<Client>> {
        let email = email.trim().to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.clients.values().find(|c| c.email == email).cloned())
    }

    async fn list_clients(&self) -> AppResult<Vec<Client>> {
        let tables = self.tables.read().await;
        let mut clients: Vec<Client> = tables.clients.values().cloned().collect();
        clients.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(clients)
    }

    async fn save_client(&self, client: &Client) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .clients
            .values()
            .any(|c| c.email == client.email && c.id != client.id);
        if duplicate {
            return Err(AppError::DatabaseError(format!(
                "Client with email {} already exists",
                client.email
            )));
        }
        tables.clients.insert(client.id.clone(), client.clone());
        Ok(())
    }

    async fn list_documents(&self, client_id: &str) -> AppResult<Vec<Document>> {
        let tables = self.tables.read().await;
        let mut documents: Vec<Document> = tables
            .documents
            .values()
            .filter(|d| d.client_id == client_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(documents)
    }

    async fn get_document(&self, id: &str) -> AppResult<Option<Document>> {
        Ok(self.tables.read().await.documents.get(id).cloned())
    }

    async fn insert_document(&self, document: &Document) -> AppResult<()> {
        #[cfg(test)]
        {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(AppError::DatabaseError("insert rejected".to_string()));
            }
        }
        let mut tables = self.tables.write().await;
        if tables.documents.contains_key(&document.id) {
            return Err(AppError::DatabaseError(format!("Duplicate document id {}", document.id)));
        }
        tables.documents.insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> AppResult<bool> {
        #[cfg(test)]
        {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(AppError::DatabaseError("delete rejected".to_string()));
            }
        }
        Ok(self.tables.write().await.documents.remove(id).is_some())
    }

    async fn hide_document(&self, id: &str, hidden_at: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.documents.get_mut(id) {
            Some(document) => {
                document.hidden_at = Some(hidden_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_user(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self.tables.read().await.users.get(&email).cloned())
    }

    async fn save_user(&self, user: &User) -> AppResult<()> {
        self.tables.write().await.users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn list_services(&self) -> AppResult<Vec<Service>> {
        let tables = self.tables.read().await;
        Ok(tables.services.iter().filter(|s| s.active).cloned().collect())
    }

    async fn count_services(&self) -> AppResult<u64> {
        Ok(self.tables.read().await.services.len() as u64)
    }

    async fn insert_services(&self, services: &[Service]) -> AppResult<()> {
        self.tables.write().await.services.extend_from_slice(services);
        Ok(())
    }

    async fn list_table(&self, table: AdminTable, limit: usize) -> AppResult<Vec<serde_json::Value>> {
        let tables = self.tables.read().await;
        match table {
            AdminTable::Clients => rows(tables.clients.values().collect(), limit),
            AdminTable::Documents => rows(tables.documents.values().collect(), limit),
            AdminTable::Users => rows(tables.users.values().collect(), limit),
            AdminTable::Services => rows(tables.services.iter().collect(), limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocKind, DocumentCategory, UserRole};

    fn document(id: &str, client_id: &str, uploaded_at: i64) -> Document {
        Document {
            id: id.into(),
            client_id: client_id.into(),
            name: format!("{}.pdf", id),
            category: DocumentCategory::Other,
            doc_kind: DocKind::Other,
            file_path: format!("clients/{}/other/other/{}.pdf", client_id, id),
            mime_type: "application/pdf".into(),
            file_size: 1,
            uploaded_at,
            hidden_at: None,
        }
    }

    #[tokio::test]
    async fn test_documents_are_listed_newest_first_per_client() {
        let store = MemoryStore::new();
        store.insert_document(&document("a", "c1", 10)).await.unwrap();
        store.insert_document(&document("b", "c1", 20)).await.unwrap();
        store.insert_document(&document("c", "c2", 30)).await.unwrap();

        let ids: Vec<String> = store
            .list_documents("c1")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_client_email_is_unique() {
        let store = MemoryStore::new();
        store.save_client(&Client::new("x@y.z", "X")).await.unwrap();
        assert!(store.save_client(&Client::new("X@y.z", "Other X")).await.is_err());
    }

    #[tokio::test]
    async fn test_list_table_respects_limit() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.save_user(&User::new(&format!("u{}@x.y", i), UserRole::Client)).await.unwrap();
        }
        let rows = store.list_table(AdminTable::Users, 3).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].get("_id").is_some());
    }
}
