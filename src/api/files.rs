use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::is_client_document_path;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SignedQuery {
    pub expires: i64,
    pub signature: String,
}

async fn stored_file(state: &AppState, relative: &str) -> AppResult<HttpResponse> {
    // Caminho inválido ou fora da raiz: mesmo 404 de arquivo inexistente
    let bytes = match state.storage.read(relative).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) | Err(AppError::InvalidRequest(_)) => {
            return Err(AppError::NotFound(format!("File {}", relative)))
        }
        Err(e) => return Err(e),
    };

    let mime = mime_guess::from_path(relative).first_or_octet_stream();
    Ok(HttpResponse::Ok()
        .content_type(mime.essence_str())
        .insert_header(("Cache-Control", "private, max-age=300"))
        .body(bytes))
}

/// GET /uploads/{path} - Arquivos enviados pelo upload-to-disk
#[utoipa::path(
    get,
    path = "/uploads/{path}",
    tag = "Files",
    params(("path" = String, Path, description = "Path relative to the upload root")),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "File not found, or a client document")
    )
)]
pub async fn serve_upload(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let relative = path.into_inner();
    // Documentos de clientes só saem por URL assinada
    if is_client_document_path(&relative) {
        log::warn!("🔒 Refused public access to client document {}", relative);
        return Err(AppError::NotFound(format!("File {}", relative)));
    }
    stored_file(&state, &relative).await
}

/// GET /files/signed/{path} - Preview de documento com URL assinada
#[utoipa::path(
    get,
    path = "/files/signed/{path}",
    tag = "Files",
    params(
        ("path" = String, Path, description = "Path relative to the upload root"),
        SignedQuery
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 403, description = "Invalid or expired signature"),
        (status = 404, description = "File not found")
    )
)]
pub async fn serve_signed(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SignedQuery>,
) -> AppResult<HttpResponse> {
    let relative = path.into_inner();
    let now = chrono::Utc::now().timestamp();

    if !state.signer.verify(&relative, query.expires, &query.signature, now) {
        log::warn!("🔒 Rejected signed URL for {}", relative);
        return Err(AppError::Forbidden("Invalid or expired link".to_string()));
    }

    stored_file(&state, &relative).await
}
