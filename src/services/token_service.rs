// ==================== TOKEN VERIFICATION ====================
// Tokens são emitidos pelo provedor de identidade; aqui só verificamos.
// Chaves assimétricas vêm do JWKS publicado; HS256 quando há segredo do projeto.

use crate::config::AppConfig;
use crate::utils::error::{AppError, AppResult};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Minimum interval between key set downloads triggered by unknown `kid`s
const JWKS_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Claims {
    /// Lower-cased email, empty when the token carries none
    pub fn email(&self) -> String {
        self.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .unwrap_or_default()
    }
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

pub struct TokenVerifier {
    secret: Option<String>,
    jwks_url: Option<String>,
    audience: Option<String>,
    http: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
    refresh_interval: Duration,
}

impl TokenVerifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            jwks_url: config.jwks_url.clone(),
            audience: config.jwt_audience.clone(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            cache: RwLock::new(None),
            refresh_interval: JWKS_REFRESH_INTERVAL,
        }
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        validation
    }

    pub async fn verify(&self, token: &str) -> AppResult<Claims> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Malformed token: {}", e)))?;

        let key = match header.alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                let secret = self.secret.as_ref().ok_or_else(|| {
                    AppError::Unauthorized("Symmetric tokens are not accepted".to_string())
                })?;
                DecodingKey::from_secret(secret.as_bytes())
            }
            _ => self.key_for(header.kid.as_deref()).await?,
        };

        decode::<Claims>(token, &key, &self.validation(header.alg))
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }

    async fn key_for(&self, kid: Option<&str>) -> AppResult<DecodingKey> {
        let kid = kid.ok_or_else(|| AppError::Unauthorized("Token has no key id".to_string()))?;

        if let Some(key) = self.cached_key(kid).await? {
            return Ok(key);
        }

        let stale = match self.cache.read().await.as_ref() {
            Some(cached) => cached.fetched_at.elapsed() >= self.refresh_interval,
            None => true,
        };
        if stale {
            self.refresh_keys().await?;
            if let Some(key) = self.cached_key(kid).await? {
                return Ok(key);
            }
        }

        Err(AppError::Unauthorized(format!("Unknown signing key: {}", kid)))
    }

    async fn cached_key(&self, kid: &str) -> AppResult<Option<DecodingKey>> {
        let cache = self.cache.read().await;
        match cache.as_ref().and_then(|cached| cached.keys.find(kid)) {
            Some(jwk) => DecodingKey::from_jwk(jwk)
                .map(Some)
                .map_err(|e| AppError::Unauthorized(format!("Unusable signing key: {}", e))),
            None => Ok(None),
        }
    }

    async fn refresh_keys(&self) -> AppResult<()> {
        let url = self.jwks_url.as_ref().ok_or_else(|| {
            AppError::Unauthorized("Asymmetric tokens need JWKS_URL".to_string())
        })?;

        log::info!("🔑 Fetching signing keys from {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamError(format!("JWKS endpoint returned {}", response.status())));
        }

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Invalid JWKS document: {}", e)))?;

        log::info!("✅ Loaded {} signing keys", keys.keys.len());

        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        Ok(())
    }
}
