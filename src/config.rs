use crate::utils::error::AppError;
use std::env;
use std::path::PathBuf;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Runtime configuration, read once from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// MongoDB URI. Without it the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub uploads_dir: PathBuf,
    pub data_dir: PathBuf,
    pub public_base_url: String,
    pub jwks_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_audience: Option<String>,
    pub admin_emails: Vec<String>,
    pub url_signing_secret: Vec<u8>,
    pub signed_url_ttl_secs: i64,
    pub thumbnail_tool: String,
    pub max_upload_bytes: usize,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub gemini_vision_model: String,
    pub cors_origins: Vec<String>,
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::ConfigError(format!("{} has an invalid value: {}", name, raw))),
        None => Ok(default),
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();

        let port: u16 = parse_var("PORT", 3001)?;
        let jwks_url = var("JWKS_URL");
        let jwt_secret = var("JWT_SECRET");
        if jwks_url.is_none() && jwt_secret.is_none() {
            return Err(AppError::ConfigError(
                "JWKS_URL or JWT_SECRET must be set".to_string(),
            ));
        }

        let url_signing_secret = match var("URL_SIGNING_SECRET") {
            Some(secret) => secret.into_bytes(),
            None => {
                log::warn!("⚠️  URL_SIGNING_SECRET not set, signed URLs will not survive a restart");
                let mut key = vec![0u8; 32];
                rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut key);
                key
            }
        };

        let gemini_model = var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: var("DATABASE_URL"),
            uploads_dir: PathBuf::from(var("UPLOADS_DIR").unwrap_or_else(|| "./uploads".to_string())),
            data_dir: PathBuf::from(var("DATA_DIR").unwrap_or_else(|| "./data".to_string())),
            public_base_url: var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port))
                .trim_end_matches('/')
                .to_string(),
            jwks_url,
            jwt_secret,
            jwt_audience: var("JWT_AUDIENCE"),
            admin_emails: split_list(var("ADMIN_EMAILS"))
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
            url_signing_secret,
            signed_url_ttl_secs: parse_var("SIGNED_URL_TTL_SECS", 3600)?,
            thumbnail_tool: var("THUMBNAIL_TOOL").unwrap_or_else(|| "pdftoppm".to_string()),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_api_base: var("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            gemini_vision_model: var("GEMINI_VISION_MODEL").unwrap_or_else(|| gemini_model.clone()),
            gemini_model,
            cors_origins: split_list(var("CORS_ORIGINS")),
        })
    }

    /// Configuration for tests: HS256 secret, temp directories, unreachable AI backend.
    #[cfg(test)]
    pub fn for_tests(uploads_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            database_url: None,
            uploads_dir,
            data_dir,
            public_base_url: "http://localhost:3001".to_string(),
            jwks_url: None,
            jwt_secret: Some("test-secret".to_string()),
            jwt_audience: None,
            admin_emails: vec!["admin@firm.test".to_string()],
            url_signing_secret: b"signing-secret".to_vec(),
            signed_url_ttl_secs: 3600,
            thumbnail_tool: "thumbnail-tool-that-does-not-exist".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            gemini_api_key: Some("test-key".to_string()),
            gemini_api_base: "http://127.0.0.1:9".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_vision_model: DEFAULT_GEMINI_MODEL.to_string(),
            cors_origins: vec![],
        }
    }
}
