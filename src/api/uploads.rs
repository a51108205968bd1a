use crate::api::metrics;
use crate::api::multipart::read_upload_form;
use crate::middleware::auth::Claims;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{is_owned_by, normalize_relative_path, upload_owner};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub relative_path: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUploadRequest {
    #[serde(alias = "path")]
    pub relative_path: String,
}

/// POST /api/upload-to-disk - Salva arquivo em <user_id>/<category>/
#[utoipa::path(
    post,
    path = "/api/upload-to-disk",
    tag = "Uploads",
    request_body(content_type = "multipart/form-data", description = "Fields: category (text), file (binary)"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing file"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "File too large")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_to_disk(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let user_id = &user.sub;

    let form = read_upload_form(payload, state.config.max_upload_bytes).await?;
    let category = form.field("category").unwrap_or("general").to_string();
    let file = form
        .file
        .ok_or_else(|| AppError::InvalidRequest("No file uploaded".to_string()))?;

    log::info!(
        "📤 POST /upload-to-disk - {} ({} bytes, {}) for user {}",
        file.file_name,
        file.size(),
        category,
        user_id
    );

    let relative_path = state.storage.user_upload_path(
        user_id,
        &category,
        &file.file_name,
        chrono::Utc::now().timestamp_millis(),
    );
    state.storage.write(&relative_path, &file.bytes).await?;
    metrics::increment_upload_count();

    let thumbnail_url = if file.is_pdf() {
        state
            .storage
            .generate_thumbnail(&relative_path)
            .await
            .map(|thumb| state.storage.public_url(&thumb))
    } else {
        None
    };

    log::info!("✅ Stored {}", relative_path);

    Ok(HttpResponse::Ok().json(UploadResponse {
        success: true,
        url: state.storage.public_url(&relative_path),
        relative_path,
        thumbnail_url,
    }))
}

/// DELETE /api/delete-upload - Remove arquivo do próprio usuário
#[utoipa::path(
    delete,
    path = "/api/delete-upload",
    tag = "Uploads",
    request_body = DeleteUploadRequest,
    responses(
        (status = 200, description = "File removed"),
        (status = 400, description = "Invalid path"),
        (status = 403, description = "Path belongs to another user"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_upload(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    request: web::Json<DeleteUploadRequest>,
) -> AppResult<HttpResponse> {
    let user_id = &user.sub;
    let relative_path = normalize_relative_path(&request.relative_path)?;

    // Mesmo diretório que o upload gerou para este subject
    if !is_owned_by(&relative_path, &upload_owner(user_id)) {
        log::warn!("🚫 User {} tried to delete {}", user_id, relative_path);
        return Err(AppError::Forbidden("You can only delete your own files".to_string()));
    }

    log::info!("🗑️  DELETE /delete-upload - {} for user {}", relative_path, user_id);

    if !state.storage.remove(&relative_path).await? {
        return Err(AppError::NotFound(format!("File {}", relative_path)));
    }
    metrics::increment_delete_count();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "relativePath": relative_path
    })))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{bearer, build_state, multipart_body, test_app, MultipartPart};
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_upload_returns_path_rooted_at_user() {
        let (state, _dirs) = build_state().await;
        let app = test::init_service(test_app(state.clone())).await;

        let (content_type, body) = multipart_body(&[
            MultipartPart::text("category", "Bank Statements"),
            MultipartPart::file("file", "march.csv", "text/csv", b"date,amount\n"),
        ]);
        let req = test::TestRequest::post()
            .uri("/api/upload-to-disk")
            .insert_header(bearer("user-42", "client@firm.test"))
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json: Value = test::read_body_json(resp).await;
        let relative = json["relativePath"].as_str().unwrap();
        assert!(relative.starts_with("user-42/Bank_Statements/"));
        assert!(relative.ends_with("-march.csv"));
        assert_eq!(
            json["url"].as_str().unwrap(),
            format!("http://localhost:3001/uploads/{}", relative)
        );
        assert!(json.get("thumbnailUrl").is_none());
        assert!(state.storage.exists(relative).await);
    }

    #[actix_web::test]
    async fn test_upload_without_token_is_401() {
        let (state, _dirs) = build_state().await;
        let app = test::init_service(test_app(state)).await;

        let (content_type, body) =
            multipart_body(&[MultipartPart::file("file", "a.txt", "text/plain", b"x")]);
        let req = test::TestRequest::post()
            .uri("/api/upload-to-disk")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_upload_without_file_is_400() {
        let (state, _dirs) = build_state().await;
        let app = test::init_service(test_app(state)).await;

        let (content_type, body) = multipart_body(&[MultipartPart::text("category", "general")]);
        let req = test::TestRequest::post()
            .uri("/api/upload-to-disk")
            .insert_header(bearer("user-1", "a@b.c"))
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_pdf_upload_without_thumbnail_tool_still_succeeds() {
        let (state, _dirs) = build_state().await;
        let app = test::init_service(test_app(state.clone())).await;

        let (content_type, body) = multipart_body(&[
            MultipartPart::text("category", "contracts"),
            MultipartPart::file("file", "deal.pdf", "application/pdf", b"%PDF-1.4\n%%EOF"),
        ]);
        let req = test::TestRequest::post()
            .uri("/api/upload-to-disk")
            .insert_header(bearer("user-1", "a@b.c"))
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json: Value = test::read_body_json(resp).await;
        assert!(json.get("thumbnailUrl").is_none());

        let relative = json["relativePath"].as_str().unwrap();
        assert!(!state.storage.exists(&format!("{}.thumb.png", relative)).await);
    }

    #[cfg(unix)]
    #[actix_web::test]
    async fn test_pdf_upload_creates_sibling_thumbnail() {
        use crate::test_support::{build_state_with, fake_thumbnail_tool};

        let tools = tempfile::tempdir().unwrap();
        let tool = fake_thumbnail_tool(tools.path());
        let (state, _dirs) = build_state_with(|config| config.thumbnail_tool = tool.clone()).await;
        let app = test::init_service(test_app(state.clone())).await;

        let (content_type, body) = multipart_body(&[
            MultipartPart::file("file", "deal.pdf", "application/pdf", b"%PDF-1.4\n%%EOF"),
        ]);
        let req = test::TestRequest::post()
            .uri("/api/upload-to-disk")
            .insert_header(bearer("user-1", "a@b.c"))
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json: Value = test::read_body_json(resp).await;

        let relative = json["relativePath"].as_str().unwrap().to_string();
        assert!(relative.starts_with("user-1/general/"));
        assert_eq!(
            json["thumbnailUrl"].as_str().unwrap(),
            format!("http://localhost:3001/uploads/{}.thumb.png", relative)
        );
        assert!(state.storage.exists(&format!("{}.thumb.png", relative)).await);
    }

    #[actix_web::test]
    async fn test_upload_over_limit_is_413() {
        let (state, _dirs) = crate::test_support::build_state_with(|config| config.max_upload_bytes = 8).await;
        let app = test::init_service(test_app(state)).await;

        let (content_type, body) = multipart_body(&[MultipartPart::file(
            "file",
            "big.bin",
            "application/octet-stream",
            &[0u8; 64],
        )]);
        let req = test::TestRequest::post()
            .uri("/api/upload-to-disk")
            .insert_header(bearer("user-1", "a@b.c"))
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn test_delete_foreign_path_is_403() {
        let (state, _dirs) = build_state().await;
        state.storage.write("user-2/general/1-x.txt", b"x").await.unwrap();
        let app = test::init_service(test_app(state.clone())).await;

        let req = test::TestRequest::delete()
            .uri("/api/delete-upload")
            .insert_header(bearer("user-1", "a@b.c"))
            .set_json(serde_json::json!({ "relativePath": "user-2/general/1-x.txt" }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(state.storage.exists("user-2/general/1-x.txt").await);
    }

    #[actix_web::test]
    async fn test_delete_traversal_is_400() {
        let (state, _dirs) = build_state().await;
        let app = test::init_service(test_app(state)).await;

        let req = test::TestRequest::delete()
            .uri("/api/delete-upload")
            .insert_header(bearer("user-1", "a@b.c"))
            .set_json(serde_json::json!({ "path": "user-1/../user-2/x.txt" }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_delete_own_file_removes_it_and_thumbnail() {
        let (state, _dirs) = build_state().await;
        state.storage.write("user-1/general/1-a.pdf", b"%PDF").await.unwrap();
        state.storage.write("user-1/general/1-a.pdf.thumb.png", b"png").await.unwrap();
        let app = test::init_service(test_app(state.clone())).await;

        let req = test::TestRequest::delete()
            .uri("/api/delete-upload")
            .insert_header(bearer("user-1", "a@b.c"))
            .set_json(serde_json::json!({ "relativePath": "/uploads/user-1/general/1-a.pdf" }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!state.storage.exists("user-1/general/1-a.pdf").await);
        assert!(!state.storage.exists("user-1/general/1-a.pdf.thumb.png").await);

        let req = test::TestRequest::delete()
            .uri("/api/delete-upload")
            .insert_header(bearer("user-1", "a@b.c"))
            .set_json(serde_json::json!({ "relativePath": "user-1/general/1-a.pdf" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_provider_subject_can_delete_own_upload() {
        let (state, _dirs) = build_state().await;
        let app = test::init_service(test_app(state.clone())).await;

        let (content_type, body) =
            multipart_body(&[MultipartPart::file("file", "a.txt", "text/plain", b"x")]);
        let req = test::TestRequest::post()
            .uri("/api/upload-to-disk")
            .insert_header(bearer("auth0|abc123", "a@b.c"))
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let json: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let relative = json["relativePath"].as_str().unwrap().to_string();
        assert!(relative.starts_with("auth0_abc123-"));

        // Outro subject que sanitiza para o mesmo texto não é dono
        let req = test::TestRequest::delete()
            .uri("/api/delete-upload")
            .insert_header(bearer("auth0_abc123", "c@d.e"))
            .set_json(serde_json::json!({ "relativePath": relative }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri("/api/delete-upload")
            .insert_header(bearer("auth0|abc123", "a@b.c"))
            .set_json(serde_json::json!({ "relativePath": relative }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert!(!state.storage.exists(&relative).await);
    }

    #[actix_web::test]
    async fn test_subject_named_clients_cannot_delete_documents() {
        let (state, _dirs) = build_state().await;
        let document = "clients/c1/identity/passport/1-p.jpg";
        state.storage.write(document, b"jpeg").await.unwrap();
        let app = test::init_service(test_app(state.clone())).await;

        let req = test::TestRequest::delete()
            .uri("/api/delete-upload")
            .insert_header(bearer("clients", "x@y.z"))
            .set_json(serde_json::json!({ "relativePath": document }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
        assert!(state.storage.exists(document).await);
    }
}
