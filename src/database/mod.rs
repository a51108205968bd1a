mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoDB;

use crate::models::{Client, Document, Service, User};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;

/// Tables the admin console may browse generically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminTable {
    Clients,
    Documents,
    Users,
    Services,
}

impl AdminTable {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "clients" => Ok(AdminTable::Clients),
            "documents" => Ok(AdminTable::Documents),
            "users" => Ok(AdminTable::Users),
            "services" => Ok(AdminTable::Services),
            other => Err(AppError::InvalidRequest(format!("Unknown table: {}", other))),
        }
    }

    pub fn collection_name(&self) -> &'static str {
        match self {
            AdminTable::Clients => "clients",
            AdminTable::Documents => "documents",
            AdminTable::Users => "users",
            AdminTable::Services => "services",
        }
    }
}

/// Persistence used by the portal.
///
/// Backed by MongoDB in production and by `MemoryStore` when no
/// `DATABASE_URL` is configured. Writes are last-write-wins.
#[async_trait]
pub trait PortalStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn get_client(&self, id: &str) -> AppResult<Option<Client>>;
    async fn find_client_by_email(&self, email: &str) -> AppResult<Option<Client>>;
    /// Newest first
    async fn list_clients(&self) -> AppResult<Vec<Client>>;
    /// Insert or replace by id
    async fn save_client(&self, client: &Client) -> AppResult<()>;

    /// All documents of a client, hidden ones included, newest first
    async fn list_documents(&self, client_id: &str) -> AppResult<Vec<Document>>;
    async fn get_document(&self, id: &str) -> AppResult<Option<Document>>;
    async fn insert_document(&self, document: &Document) -> AppResult<()>;
    /// Returns false when no row matched
    async fn delete_document(&self, id: &str) -> AppResult<bool>;
    async fn hide_document(&self, id: &str, hidden_at: i64) -> AppResult<bool>;

    async fn get_user(&self, email: &str) -> AppResult<Option<User>>;
    async fn save_user(&self, user: &User) -> AppResult<()>;

    async fn list_services(&self) -> AppResult<Vec<Service>>;
    async fn count_services(&self) -> AppResult<u64>;
    async fn insert_services(&self, services: &[Service]) -> AppResult<()>;

    async fn list_table(&self, table: AdminTable, limit: usize) -> AppResult<Vec<serde_json::Value>>;
}
