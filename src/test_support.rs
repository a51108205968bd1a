// Helpers compartilhados pelos testes (config temporária, tokens, multipart)

use crate::config::AppConfig;
use crate::database::{MemoryStore, PortalStore};
use crate::middleware::auth::Claims;
use crate::models::{User, UserRole};
use crate::state::AppState;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN_EMAIL: &str = "admin@firm.test";

/// Keeps the temporary uploads/data directories alive for the test
pub struct TempDirs {
    pub uploads: TempDir,
    pub data: TempDir,
}

pub fn test_config() -> (AppConfig, TempDirs) {
    let dirs = TempDirs {
        uploads: tempfile::tempdir().unwrap(),
        data: tempfile::tempdir().unwrap(),
    };
    let config = AppConfig::for_tests(dirs.uploads.path().to_path_buf(), dirs.data.path().to_path_buf());
    (config, dirs)
}

pub fn issue_token(sub: &str, email: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        email: Some(email.to_string()),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap()
}

pub fn bearer(sub: &str, email: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", issue_token(sub, email)))
}

pub async fn build_state() -> (web::Data<AppState>, TempDirs) {
    build_state_with(|_| {}).await
}

pub async fn build_state_with(configure: impl FnOnce(&mut AppConfig)) -> (web::Data<AppState>, TempDirs) {
    state_with_store(Arc::new(MemoryStore::new()), configure).await
}

/// State over a caller-owned store, with the admin user already seeded.
pub async fn state_with_store(
    store: Arc<MemoryStore>,
    configure: impl FnOnce(&mut AppConfig),
) -> (web::Data<AppState>, TempDirs) {
    let (mut config, dirs) = test_config();
    configure(&mut config);

    store.save_user(&User::new(ADMIN_EMAIL, UserRole::Admin)).await.unwrap();

    let store: Arc<dyn PortalStore> = store;
    (web::Data::new(AppState::new(config, store)), dirs)
}

pub fn test_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(state).configure(crate::api::configure)
}

pub struct MultipartPart {
    name: String,
    file: Option<(String, String)>,
    body: Vec<u8>,
}

impl MultipartPart {
    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            file: None,
            body: value.as_bytes().to_vec(),
        }
    }

    pub fn file(name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            file: Some((file_name.to_string(), content_type.to_string())),
            body: bytes.to_vec(),
        }
    }
}

/// Returns the `content-type` header value and the encoded body
pub fn multipart_body(parts: &[MultipartPart]) -> (String, Vec<u8>) {
    let boundary = "----portal-test-boundary";
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match &part.file {
            Some((file_name, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        part.name, file_name, content_type
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
                );
            }
        }
        body.extend_from_slice(&part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}

/// Shell script standing in for pdftoppm: writes `<last arg>.png`.
#[cfg(unix)]
pub fn fake_thumbnail_tool(dir: &Path) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-pdftoppm");
    std::fs::write(&path, "#!/bin/sh\nfor last; do :; done\nprintf 'png' > \"$last.png\"\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}
