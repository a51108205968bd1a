use super::{AdminTable, PortalStore};
use crate::models::{Client, Document, Service, User};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client as MongoClient, Collection, Database, IndexModel};
use serde::de::DeserializeOwned;
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Poucos escritores (admin + clientes), pool pequeno basta
        client_options.max_pool_size = Some(10);
        client_options.min_pool_size = Some(1);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = MongoClient::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':') && !s.contains('@'))
            .unwrap_or("client_portal");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates necessary indexes for the portal queries
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        // documents(client_id, uploaded_at) - listagem por cliente
        let documents = self.collection::<mongodb::bson::Document>("documents");
        let documents_index = IndexModel::builder()
            .keys(doc! { "client_id": 1, "uploaded_at": -1 })
            .build();

        match documents.create_index(documents_index).await {
            Ok(_) => log::info!("   ✅ Index created: documents(client_id, uploaded_at)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // clients(email) - lookup do dono pelo token
        let clients = self.collection::<mongodb::bson::Document>("clients");
        let clients_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(mongodb::options::IndexOptions::builder().unique(true).build())
            .build();

        match clients.create_index(clients_index).await {
            Ok(_) => log::info!("   ✅ Index created: clients(email)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    async fn find_all<T>(
        &self,
        name: &str,
        filter: mongodb::bson::Document,
        sort: mongodb::bson::Document,
    ) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let cursor = self.collection::<T>(name).find(filter).sort(sort).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl PortalStore for MongoDB {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    async fn get_client(&self, id: &str) -> AppResult<Option<Client>> {
        Ok(self.collection::<Client>("clients").find_one(doc! { "_id": id }).await?)
    }

    async fn find_client_by_email(&self, email: &str) -> AppResult<Option<Client>> {
        let email = email.trim().to_lowercase();
        Ok(self.collection::<Client>("clients").find_one(doc! { "email": email }).await?)
    }

    async fn list_clients(&self) -> AppResult<Vec<Client>> {
        self.find_all("clients", doc! {}, doc! { "created_at": -1 }).await
    }

    async fn save_client(&self, client: &Client) -> AppResult<()> {
        self.collection::<Client>("clients")
            .replace_one(doc! { "_id": &client.id }, client)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn list_documents(&self, client_id: &str) -> AppResult<Vec<Document>> {
        self.find_all("documents", doc! { "client_id": client_id }, doc! { "uploaded_at": -1 })
            .await
    }

    async fn get_document(&self, id: &str) -> AppResult<Option<Document>> {
        Ok(self.collection::<Document>("documents").find_one(doc! { "_id": id }).await?)
    }

    async fn insert_document(&self, document: &Document) -> AppResult<()> {
        self.collection::<Document>("documents").insert_one(document).await?;
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> AppResult<bool> {
        let result = self
            .collection::<Document>("documents")
            .delete_one(doc! { "_id": id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn hide_document(&self, id: &str, hidden_at: i64) -> AppResult<bool> {
        let result = self
            .collection::<Document>("documents")
            .update_one(doc! { "_id": id }, doc! { "$set": { "hidden_at": hidden_at } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn get_user(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self.collection::<User>("users").find_one(doc! { "_id": email }).await?)
    }

    async fn save_user(&self, user: &User) -> AppResult<()> {
        self.collection::<User>("users")
            .replace_one(doc! { "_id": &user.email }, user)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn list_services(&self) -> AppResult<Vec<Service>> {
        self.find_all("services", doc! { "active": true }, doc! { "area": 1, "name": 1 })
            .await
    }

    async fn count_services(&self) -> AppResult<u64> {
        Ok(self.collection::<Service>("services").count_documents(doc! {}).await?)
    }

    async fn insert_services(&self, services: &[Service]) -> AppResult<()> {
        if services.is_empty() {
            return Ok(());
        }
        self.collection::<Service>("services").insert_many(services).await?;
        Ok(())
    }

    async fn list_table(&self, table: AdminTable, limit: usize) -> AppResult<Vec<serde_json::Value>> {
        let cursor = self
            .collection::<mongodb::bson::Document>(table.collection_name())
            .find(doc! {})
            .limit(limit as i64)
            .await?;
        let rows: Vec<mongodb::bson::Document> = cursor.try_collect().await?;

        rows.into_iter()
            .map(|row| {
                serde_json::to_value(&row)
                    .map_err(|e| AppError::DatabaseError(format!("Failed to serialize row: {}", e)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/client_portal_test".to_string());

        let db = MongoDB::new(&uri).await;
        assert!(db.is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_document_hide_and_delete() {
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/client_portal_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();

        let document = Document {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: "mongo-test-client".into(),
            name: "a.pdf".into(),
            category: crate::models::DocumentCategory::Other,
            doc_kind: crate::models::DocKind::Other,
            file_path: "clients/mongo-test-client/other/other/1-a.pdf".into(),
            mime_type: "application/pdf".into(),
            file_size: 3,
            uploaded_at: 1,
            hidden_at: None,
        };
        db.insert_document(&document).await.unwrap();
        assert!(db.hide_document(&document.id, 5).await.unwrap());
        assert_eq!(db.get_document(&document.id).await.unwrap().unwrap().hidden_at, Some(5));
        assert!(db.delete_document(&document.id).await.unwrap());
        assert!(!db.delete_document(&document.id).await.unwrap());
    }
}
