use crate::api::multipart::read_upload_form;
use crate::middleware::auth::Claims;
use crate::services::document_service::{self, DeleteMode, DocumentView};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentsResponse {
    pub success: bool,
    pub documents: Vec<DocumentView>,
    pub count: usize,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentResponse {
    pub success: bool,
    pub document: DocumentView,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteDocumentResponse {
    pub success: bool,
    pub mode: DeleteMode,
}

/// GET /api/clients/{client_id}/documents
#[utoipa::path(
    get,
    path = "/api/clients/{client_id}/documents",
    tag = "Documents",
    params(("client_id" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "Visible documents, newest first", body = DocumentsResponse),
        (status = 403, description = "Not the owner nor an admin"),
        (status = 404, description = "Unknown client")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_documents(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let client_id = path.into_inner();
    document_service::authorize_client(state.store.as_ref(), &user, &client_id).await?;

    let documents = document_service::list_documents(&state, &client_id).await?;
    log::info!("📂 GET /clients/{}/documents - {} visible", client_id, documents.len());

    Ok(HttpResponse::Ok().json(DocumentsResponse {
        success: true,
        count: documents.len(),
        documents,
    }))
}

/// POST /api/clients/{client_id}/documents - multipart category, sub_category, file
#[utoipa::path(
    post,
    path = "/api/clients/{client_id}/documents",
    tag = "Documents",
    params(("client_id" = String, Path, description = "Client id")),
    request_body(content_type = "multipart/form-data", description = "Fields: category, sub_category (IDENTITY only), file"),
    responses(
        (status = 200, description = "Document stored", body = DocumentResponse),
        (status = 400, description = "Unknown category or missing file"),
        (status = 403, description = "Not the owner nor an admin"),
        (status = 413, description = "File too large")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_document(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let client_id = path.into_inner();
    let client = document_service::authorize_client(state.store.as_ref(), &user, &client_id).await?;

    let form = read_upload_form(payload, state.config.max_upload_bytes).await?;
    let category = form
        .field("category")
        .ok_or_else(|| AppError::InvalidRequest("category is required".to_string()))?
        .to_string();
    let sub_category = form
        .field("sub_category")
        .or_else(|| form.field("subCategory"))
        .map(str::to_string);
    let file = form
        .file
        .ok_or_else(|| AppError::InvalidRequest("No file uploaded".to_string()))?;

    let document =
        document_service::upload_document(&state, &client, &category, sub_category.as_deref(), file).await?;
    crate::api::metrics::increment_upload_count();

    Ok(HttpResponse::Ok().json(DocumentResponse {
        success: true,
        document,
    }))
}

/// DELETE /api/clients/{client_id}/documents/{document_id}
#[utoipa::path(
    delete,
    path = "/api/clients/{client_id}/documents/{document_id}",
    tag = "Documents",
    params(
        ("client_id" = String, Path, description = "Client id"),
        ("document_id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Deleted, or hidden when the row could not be removed", body = DeleteDocumentResponse),
        (status = 403, description = "Not the owner nor an admin"),
        (status = 404, description = "Unknown document")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_document(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (client_id, document_id) = path.into_inner();
    document_service::authorize_client(state.store.as_ref(), &user, &client_id).await?;

    let mode = document_service::delete_document(&state, &client_id, &document_id).await?;
    log::info!("🗑️  Document {} of client {}: {:?}", document_id, client_id, mode);

    Ok(HttpResponse::Ok().json(DeleteDocumentResponse { success: true, mode }))
}

/// POST /api/clients/{client_id}/documents/{document_id}/hide
#[utoipa::path(
    post,
    path = "/api/clients/{client_id}/documents/{document_id}/hide",
    tag = "Documents",
    params(
        ("client_id" = String, Path, description = "Client id"),
        ("document_id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Document hidden"),
        (status = 404, description = "Unknown document")
    ),
    security(("bearer_auth" = []))
)]
pub async fn hide_document(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (client_id, document_id) = path.into_inner();
    document_service::authorize_client(state.store.as_ref(), &user, &client_id).await?;
    document_service::hide_document(&state, &client_id, &document_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

/// GET /api/clients/{client_id}/documents/{document_id}/preview
#[utoipa::path(
    get,
    path = "/api/clients/{client_id}/documents/{document_id}/preview",
    tag = "Documents",
    params(
        ("client_id" = String, Path, description = "Client id"),
        ("document_id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Short-lived signed URL", body = crate::services::signed_url::SignedUrl),
        (status = 404, description = "Unknown or hidden document")
    ),
    security(("bearer_auth" = []))
)]
pub async fn preview_document(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (client_id, document_id) = path.into_inner();
    document_service::authorize_client(state.store.as_ref(), &user, &client_id).await?;

    let signed = document_service::preview_url(&state, &client_id, &document_id).await?;
    Ok(HttpResponse::Ok().json(signed))
}

#[cfg(test)]
mod tests {
    use crate::database::MemoryStore;
    use crate::models::Client;
    use crate::test_support::{
        bearer, build_state, multipart_body, state_with_store, test_app, MultipartPart, ADMIN_EMAIL,
    };
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;
    use std::sync::Arc;

    fn passport(name: &str) -> Vec<MultipartPart> {
        vec![
            MultipartPart::text("category", "IDENTITY"),
            MultipartPart::text("sub_category", "PASSPORT"),
            MultipartPart::file("file", name, "image/jpeg", b"jpeg-bytes"),
        ]
    }

    fn upload_request(client_id: &str, email: &str, parts: &[MultipartPart]) -> test::TestRequest {
        let (content_type, body) = multipart_body(parts);
        test::TestRequest::post()
            .uri(&format!("/api/clients/{}/documents", client_id))
            .insert_header(bearer("user-1", email))
            .insert_header(("content-type", content_type))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn test_identity_upload_latest_wins() {
        let (state, _dirs) = build_state().await;
        let client = Client::new("maria@example.com", "Maria");
        state.store.save_client(&client).await.unwrap();
        let app = test::init_service(test_app(state.clone())).await;

        let resp = test::call_service(&app, upload_request(&client.id, "maria@example.com", &passport("old.jpg")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let first: Value = test::read_body_json(resp).await;
        let first_path = first["document"]["file_path"].as_str().unwrap().to_string();
        assert!(first_path.starts_with(&format!("clients/{}/identity/passport/", client.id)));

        let resp = test::call_service(&app, upload_request(&client.id, "maria@example.com", &passport("new.jpg")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/clients/{}/documents", client.id))
            .insert_header(bearer("user-1", "maria@example.com"))
            .to_request();
        let json: Value = test::read_body_json(test::call_service(&app, req).await).await;

        let documents = json["documents"].as_array().unwrap();
        let passports: Vec<&Value> = documents
            .iter()
            .filter(|d| d["ui_sub_category"] == "PASSPORT")
            .collect();
        assert_eq!(passports.len(), 1);
        assert_eq!(passports[0]["name"], "new.jpg");
        assert_eq!(passports[0]["ui_category"], "IDENTITY");
        assert!(!state.storage.exists(&first_path).await);
    }

    #[actix_web::test]
    async fn test_identity_without_sub_category_is_400() {
        let (state, _dirs) = build_state().await;
        let client = Client::new("maria@example.com", "Maria");
        state.store.save_client(&client).await.unwrap();
        let app = test::init_service(test_app(state)).await;

        let parts = vec![
            MultipartPart::text("category", "IDENTITY"),
            MultipartPart::file("file", "x.jpg", "image/jpeg", b"x"),
        ];
        let resp = test::call_service(&app, upload_request(&client.id, "maria@example.com", &parts).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_other_client_is_forbidden_admin_is_not() {
        let (state, _dirs) = build_state().await;
        let client = Client::new("maria@example.com", "Maria");
        state.store.save_client(&client).await.unwrap();
        let app = test::init_service(test_app(state)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/clients/{}/documents", client.id))
            .insert_header(bearer("user-2", "intruder@example.com"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri(&format!("/api/clients/{}/documents", client.id))
            .insert_header(bearer("admin-1", ADMIN_EMAIL))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/clients/no-such-client/documents")
            .insert_header(bearer("admin-1", ADMIN_EMAIL))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_delete_falls_back_to_hide() {
        let store = Arc::new(MemoryStore::new());
        let (state, _dirs) = state_with_store(store.clone(), |_| {}).await;
        let client = Client::new("maria@example.com", "Maria");
        state.store.save_client(&client).await.unwrap();
        let app = test::init_service(test_app(state.clone())).await;

        let parts = vec![
            MultipartPart::text("category", "BANK"),
            MultipartPart::file("file", "jan.pdf", "application/pdf", b"%PDF"),
        ];
        let resp = test::call_service(&app, upload_request(&client.id, "maria@example.com", &parts).to_request()).await;
        let uploaded: Value = test::read_body_json(resp).await;
        let document_id = uploaded["document"]["_id"].as_str().unwrap().to_string();

        store.fail_document_deletes();

        let req = test::TestRequest::delete()
            .uri(&format!("/api/clients/{}/documents/{}", client.id, document_id))
            .insert_header(bearer("user-1", "maria@example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["mode"], "hidden");

        let req = test::TestRequest::get()
            .uri(&format!("/api/clients/{}/documents", client.id))
            .insert_header(bearer("user-1", "maria@example.com"))
            .to_request();
        let json: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(json["count"], 0);

        let stored = state.store.get_document(&document_id).await.unwrap().unwrap();
        assert!(stored.is_hidden());
    }

    #[actix_web::test]
    async fn test_delete_removes_row_and_file() {
        let (state, _dirs) = build_state().await;
        let client = Client::new("maria@example.com", "Maria");
        state.store.save_client(&client).await.unwrap();
        let app = test::init_service(test_app(state.clone())).await;

        let parts = vec![
            MultipartPart::text("category", "EXPENSES"),
            MultipartPart::file("file", "taxi.png", "image/png", b"png"),
        ];
        let resp = test::call_service(&app, upload_request(&client.id, "maria@example.com", &parts).to_request()).await;
        let uploaded: Value = test::read_body_json(resp).await;
        let document_id = uploaded["document"]["_id"].as_str().unwrap().to_string();
        let file_path = uploaded["document"]["file_path"].as_str().unwrap().to_string();

        let req = test::TestRequest::delete()
            .uri(&format!("/api/clients/{}/documents/{}", client.id, document_id))
            .insert_header(bearer("user-1", "maria@example.com"))
            .to_request();
        let json: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(json["mode"], "deleted");
        assert!(state.store.get_document(&document_id).await.unwrap().is_none());
        assert!(!state.storage.exists(&file_path).await);
    }

    #[actix_web::test]
    async fn test_preview_returns_signed_url_and_hidden_is_404() {
        let (state, _dirs) = build_state().await;
        let client = Client::new("maria@example.com", "Maria");
        state.store.save_client(&client).await.unwrap();
        let app = test::init_service(test_app(state)).await;

        let parts = vec![
            MultipartPart::text("category", "COMPLIANCE"),
            MultipartPart::file("file", "kyc.pdf", "application/pdf", b"%PDF"),
        ];
        let resp = test::call_service(&app, upload_request(&client.id, "maria@example.com", &parts).to_request()).await;
        let uploaded: Value = test::read_body_json(resp).await;
        let document_id = uploaded["document"]["_id"].as_str().unwrap().to_string();
        let base = format!("/api/clients/{}/documents/{}", client.id, document_id);

        let req = test::TestRequest::get()
            .uri(&format!("{}/preview", base))
            .insert_header(bearer("user-1", "maria@example.com"))
            .to_request();
        let json: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let url = json["url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:3001/files/signed/clients/"));
        assert!(url.contains("&signature="));
        assert!(json["expiresAt"].as_i64().unwrap() > chrono::Utc::now().timestamp());

        let req = test::TestRequest::post()
            .uri(&format!("{}/hide", base))
            .insert_header(bearer("user-1", "maria@example.com"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("{}/preview", base))
            .insert_header(bearer("user-1", "maria@example.com"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_document_files_need_a_signed_link() {
        let (state, _dirs) = build_state().await;
        let client = Client::new("maria@example.com", "Maria");
        state.store.save_client(&client).await.unwrap();
        let app = test::init_service(test_app(state)).await;

        let parts = vec![
            MultipartPart::text("category", "IDENTITY"),
            MultipartPart::text("sub_category", "PASSPORT"),
            MultipartPart::file("file", "passport.jpg", "image/jpeg", b"SECRET-PASSPORT"),
        ];
        let resp = test::call_service(&app, upload_request(&client.id, "maria@example.com", &parts).to_request()).await;
        let uploaded: Value = test::read_body_json(resp).await;
        let file_path = uploaded["document"]["file_path"].as_str().unwrap().to_string();
        let url = uploaded["document"]["url"].as_str().unwrap().to_string();
        assert!(url.starts_with("http://localhost:3001/files/signed/clients/"));
        assert!(uploaded["document"]["url_expires_at"].as_i64().is_some());

        let req = test::TestRequest::get().uri(&format!("/uploads/{}", file_path)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri(url.trim_start_matches("http://localhost:3001"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await.as_ref(), b"SECRET-PASSPORT");
    }
}
