use crate::config::AppConfig;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Short-lived preview links for stored documents.
///
/// The signature is HMAC-SHA256 over `<relative path>\n<expires>`.
pub struct UrlSigner {
    secret: Vec<u8>,
    public_base_url: String,
    ttl_secs: i64,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: i64,
}

impl UrlSigner {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            secret: config.url_signing_secret.clone(),
            public_base_url: config.public_base_url.clone(),
            ttl_secs: config.signed_url_ttl_secs.max(1),
        }
    }

    fn mac(&self, relative: &str, expires: i64) -> HmacSha256 {
        // HMAC aceita chave de qualquer tamanho
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(relative.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    pub fn signature(&self, relative: &str, expires: i64) -> String {
        hex::encode(self.mac(relative, expires).finalize().into_bytes())
    }

    pub fn sign(&self, relative: &str, now: i64) -> SignedUrl {
        let expires_at = now + self.ttl_secs;
        let encoded = relative
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        SignedUrl {
            url: format!(
                "{}/files/signed/{}?expires={}&signature={}",
                self.public_base_url,
                encoded,
                expires_at,
                self.signature(relative, expires_at)
            ),
            expires_at,
        }
    }

    /// Constant-time check of signature and expiry
    pub fn verify(&self, relative: &str, expires: i64, signature: &str, now: i64) -> bool {
        if expires < now {
            return false;
        }
        let provided = match hex::decode(signature) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        self.mac(relative, expires).verify_slice(&provided).is_ok()
    }
}
