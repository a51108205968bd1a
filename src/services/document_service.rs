// ==================== CLIENT DOCUMENTS ====================
// Upload, listagem, exclusão e preview dos documentos de cada cliente.
// Documentos de identidade: um por tipo (o mais recente vence).

use crate::database::PortalStore;
use crate::models::{classify_upload, Client, DocKind, Document, IdentitySubCategory, UiCategory};
use crate::services::admin_service;
use crate::services::disk_storage::UploadedFile;
use crate::services::signed_url::SignedUrl;
use crate::services::token_service::Claims;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: Document,
    pub ui_category: UiCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_sub_category: Option<IdentitySubCategory>,
    /// Short-lived signed link, the file is never public
    pub url: String,
    pub url_expires_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    Deleted,
    Hidden,
}

pub fn to_view(state: &AppState, document: Document, now: i64) -> DocumentView {
    let signed = state.signer.sign(&document.file_path, now);
    DocumentView {
        ui_category: document.ui_category(),
        ui_sub_category: document.ui_sub_category(),
        url: signed.url,
        url_expires_at: signed.expires_at,
        document,
    }
}

/// Total order on uploads: time, then id for uploads in the same second.
fn recency(document: &Document) -> (i64, &str) {
    (document.uploaded_at, document.id.as_str())
}

/// Documents the portal shows: not hidden, newest first, and only the
/// latest document for each single-slot (identity) kind.
pub fn visible_documents(mut documents: Vec<Document>) -> Vec<Document> {
    documents.sort_by(|a, b| recency(b).cmp(&recency(a)));

    let mut seen_slots: HashSet<DocKind> = HashSet::new();
    documents
        .into_iter()
        .filter(|d| !d.is_hidden())
        .filter(|d| !d.doc_kind.is_single_slot() || seen_slots.insert(d.doc_kind))
        .collect()
}

/// Loads the client and checks the caller may act on it (owner or admin).
pub async fn authorize_client(
    store: &dyn PortalStore,
    claims: &Claims,
    client_id: &str,
) -> AppResult<Client> {
    let client = store
        .get_client(client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {}", client_id)))?;

    let email = claims.email();
    if !email.is_empty() && client.email == email {
        return Ok(client);
    }
    if admin_service::is_admin(store, &email).await? {
        return Ok(client);
    }

    log::warn!("🚫 User {} tried to access documents of client {}", claims.sub, client_id);
    Err(AppError::Forbidden("You cannot access this client's documents".to_string()))
}

async fn owned_document(store: &dyn PortalStore, client_id: &str, document_id: &str) -> AppResult<Document> {
    store
        .get_document(document_id)
        .await?
        .filter(|d| d.client_id == client_id)
        .ok_or_else(|| AppError::NotFound(format!("Document {}", document_id)))
}

pub async fn list_documents(state: &AppState, client_id: &str) -> AppResult<Vec<DocumentView>> {
    let documents = state.store.list_documents(client_id).await?;
    let now = chrono::Utc::now().timestamp();
    Ok(visible_documents(documents)
        .into_iter()
        .map(|d| to_view(state, d, now))
        .collect())
}

pub async fn upload_document(
    state: &AppState,
    client: &Client,
    ui_category: &str,
    sub_category: Option<&str>,
    file: UploadedFile,
) -> AppResult<DocumentView> {
    let (category, doc_kind) = classify_upload(ui_category, sub_category)?;

    let now = chrono::Utc::now();
    let file_path = state.storage.client_document_path(
        &client.id,
        category,
        doc_kind,
        &file.file_name,
        now.timestamp_millis(),
    );

    state.storage.write(&file_path, &file.bytes).await?;

    let document = Document {
        id: uuid::Uuid::new_v4().to_string(),
        client_id: client.id.clone(),
        name: file.file_name.clone(),
        category,
        doc_kind,
        file_path: file_path.clone(),
        mime_type: file.content_type.clone(),
        file_size: file.size(),
        uploaded_at: now.timestamp(),
        hidden_at: None,
    };

    if let Err(e) = state.store.insert_document(&document).await {
        // Sem linha de metadados o binário ficaria órfão
        log::error!("❌ Metadata insert failed for {}, removing binary: {}", file_path, e);
        if let Err(cleanup) = state.storage.remove(&file_path).await {
            log::warn!("⚠️  Could not remove orphaned file {}: {}", file_path, cleanup);
        }
        return Err(e);
    }

    if file.is_pdf() {
        state.storage.generate_thumbnail(&file_path).await;
    }

    log::info!(
        "📄 Document {} uploaded for client {} ({}/{})",
        document.id,
        client.id,
        category,
        doc_kind
    );

    if doc_kind.is_single_slot() {
        replace_previous(state, &document).await;
    }

    Ok(to_view(state, document, now.timestamp()))
}

/// Removes older documents sharing the new document's identity slot.
///
/// Only strictly older documents go, so two uploads racing in the same
/// second never remove each other.
async fn replace_previous(state: &AppState, latest: &Document) {
    let previous = match state.store.list_documents(&latest.client_id).await {
        Ok(documents) => documents,
        Err(e) => {
            log::warn!("⚠️  Could not list previous {} documents: {}", latest.doc_kind, e);
            return;
        }
    };

    for old in previous
        .into_iter()
        .filter(|d| d.doc_kind == latest.doc_kind && recency(d) < recency(latest))
    {
        match remove_document(state, &old).await {
            Ok(mode) => log::info!("♻️  Replaced {} document {} ({:?})", old.doc_kind, old.id, mode),
            Err(e) => log::warn!("⚠️  Could not replace {} document {}: {}", old.doc_kind, old.id, e),
        }
    }
}

/// Row first, then binary. A failed row delete falls back to hiding the
/// document so it cannot come back in listings.
async fn remove_document(state: &AppState, document: &Document) -> AppResult<DeleteMode> {
    match state.store.delete_document(&document.id).await {
        Ok(true) => {
            if let Err(e) = state.storage.remove(&document.file_path).await {
                log::warn!("⚠️  Row deleted but file {} remains: {}", document.file_path, e);
            }
            crate::api::metrics::increment_delete_count();
            Ok(DeleteMode::Deleted)
        }
        Ok(false) => Err(AppError::NotFound(format!("Document {}", document.id))),
        Err(e) => {
            log::warn!("⚠️  Delete of {} failed, hiding instead: {}", document.id, e);
            let hidden = state
                .store
                .hide_document(&document.id, chrono::Utc::now().timestamp())
                .await?;
            if hidden {
                Ok(DeleteMode::Hidden)
            } else {
                Err(AppError::NotFound(format!("Document {}", document.id)))
            }
        }
    }
}

pub async fn delete_document(state: &AppState, client_id: &str, document_id: &str) -> AppResult<DeleteMode> {
    let document = owned_document(state.store.as_ref(), client_id, document_id).await?;
    remove_document(state, &document).await
}

pub async fn hide_document(state: &AppState, client_id: &str, document_id: &str) -> AppResult<()> {
    let document = owned_document(state.store.as_ref(), client_id, document_id).await?;
    if document.is_hidden() {
        return Ok(());
    }
    if state
        .store
        .hide_document(&document.id, chrono::Utc::now().timestamp())
        .await?
    {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Document {}", document_id)))
    }
}

pub async fn preview_url(state: &AppState, client_id: &str, document_id: &str) -> AppResult<SignedUrl> {
    let document = owned_document(state.store.as_ref(), client_id, document_id).await?;
    if document.is_hidden() {
        return Err(AppError::NotFound(format!("Document {}", document_id)));
    }
    if !state.storage.exists(&document.file_path).await {
        return Err(AppError::NotFound(format!("File for document {}", document_id)));
    }
    Ok(state.signer.sign(&document.file_path, chrono::Utc::now().timestamp()))
}
