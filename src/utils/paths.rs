use crate::utils::error::AppError;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};

/// Top-level directory holding client documents. Never served publicly.
pub const CLIENT_DOCUMENTS_DIR: &str = "clients";

/// Reduces a user-provided name to `[A-Za-z0-9._-]`.
///
/// Other characters become `_`, leading dots are stripped so the result is
/// never hidden or a `..` segment, and an empty result falls back to `fallback`.
pub fn sanitize_segment(raw: &str, fallback: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        // Keep names bounded, the extension survives because we cut from the front
        let max = 120;
        if cleaned.len() > max {
            cleaned[cleaned.len() - max..].to_string()
        } else {
            cleaned.to_string()
        }
    }
}

/// File name part of a multipart filename (browsers may send a full path).
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    sanitize_segment(base, "file")
}

/// Directory name owning a user's generic uploads.
///
/// A subject that is already a clean segment is used as is. Anything else
/// (e.g. `auth0|abc123`) or the reserved documents directory gets a short
/// digest of the raw subject appended, so distinct subjects never share a folder.
pub fn upload_owner(sub: &str) -> String {
    let cleaned = sanitize_segment(sub, "anonymous");
    if cleaned == sub && cleaned != CLIENT_DOCUMENTS_DIR {
        return cleaned;
    }
    let digest = hex::encode(Sha256::digest(sub.as_bytes()));
    format!("{}-{}", cleaned, &digest[..10])
}

/// True for paths under the client documents directory
pub fn is_client_document_path(relative: &str) -> bool {
    match normalize_relative_path(relative) {
        Ok(normalized) => normalized
            .split('/')
            .next()
            .map(|first| first == CLIENT_DOCUMENTS_DIR)
            .unwrap_or(false),
        // Caminho inválido nunca é servido mesmo
        Err(_) => false,
    }
}

/// Validates a storage path relative to the upload root.
///
/// Rejects empty, absolute and `..` paths. Returns the normalized form
/// with `/` separators and without `.` segments.
pub fn normalize_relative_path(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim().trim_start_matches("/uploads/");
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest("Path is required".to_string()));
    }
    if trimmed.starts_with('/') || trimmed.starts_with('\\') || trimmed.contains('\0') {
        return Err(AppError::InvalidRequest("Absolute paths are not allowed".to_string()));
    }

    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| AppError::InvalidRequest("Path is not valid UTF-8".to_string()))?;
                parts.push(part.to_string());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(AppError::InvalidRequest("Path traversal is not allowed".to_string()))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(AppError::InvalidRequest("Absolute paths are not allowed".to_string()))
            }
        }
    }

    if parts.is_empty() {
        return Err(AppError::InvalidRequest("Path is required".to_string()));
    }
    Ok(parts.join("/"))
}

/// Resolves a validated relative path under `root`.
pub fn resolve_under(root: &Path, relative: &str) -> Result<PathBuf, AppError> {
    let normalized = normalize_relative_path(relative)?;
    Ok(root.join(normalized))
}

/// True when `relative` lives under the `owner` prefix (`<owner>/...`).
pub fn is_owned_by(relative: &str, owner: &str) -> bool {
    !owner.is_empty()
        && relative
            .strip_prefix(owner)
            .map(|rest| rest.starts_with('/') && rest.len() > 1)
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("Bank Statements", "general"), "Bank_Statements");
        assert_eq!(sanitize_segment("..", "general"), "general");
        assert_eq!(sanitize_segment("../etc", "general"), "_etc");
        assert_eq!(sanitize_segment("", "general"), "general");
        assert_eq!(sanitize_segment(".env", "file"), "env");
    }

    #[test]
    fn test_sanitize_filename_strips_directories() {
        assert_eq!(sanitize_filename("C:\\Users\\me\\passport scan.pdf"), "passport_scan.pdf");
        assert_eq!(sanitize_filename("/tmp/../x.png"), "x.png");
        assert_eq!(sanitize_filename("façade.jpg"), "fa_ade.jpg");
    }

    #[test]
    fn test_long_names_keep_extension() {
        let long = format!("{}.pdf", "a".repeat(300));
        let cleaned = sanitize_filename(&long);
        assert!(cleaned.len() <= 120);
        assert!(cleaned.ends_with(".pdf"));
    }

    #[test]
    fn test_normalize_relative_path() {
        assert_eq!(normalize_relative_path("u1/docs/a.pdf").unwrap(), "u1/docs/a.pdf");
        assert_eq!(normalize_relative_path("./u1/./a.pdf").unwrap(), "u1/a.pdf");
        assert_eq!(normalize_relative_path("/uploads/u1/a.pdf").unwrap(), "u1/a.pdf");
        assert!(normalize_relative_path("u1/../u2/a.pdf").is_err());
        assert!(normalize_relative_path("/etc/passwd").is_err());
        assert!(normalize_relative_path("   ").is_err());
    }

    #[test]
    fn test_upload_owner() {
        assert_eq!(upload_owner("user-42"), "user-42");

        let auth0 = upload_owner("auth0|abc123");
        assert!(auth0.starts_with("auth0_abc123-"));
        assert_ne!(auth0, upload_owner("auth0_abc123"));
        assert_eq!(auth0, upload_owner("auth0|abc123"));

        assert!(upload_owner("clients").starts_with("clients-"));
        assert!(upload_owner("").starts_with("anonymous-"));
    }

    #[test]
    fn test_is_client_document_path() {
        assert!(is_client_document_path("clients/c1/identity/passport/1-p.jpg"));
        assert!(is_client_document_path("./clients/c1/a.pdf"));
        assert!(is_client_document_path("/uploads/clients/c1/a.pdf"));
        assert!(!is_client_document_path("clients-1a2b/general/a.pdf"));
        assert!(!is_client_document_path("user-1/clients/a.pdf"));
    }

    #[test]
    fn test_is_owned_by() {
        assert!(is_owned_by("user-1/docs/a.pdf", "user-1"));
        assert!(!is_owned_by("user-10/docs/a.pdf", "user-1"));
        assert!(!is_owned_by("user-1", "user-1"));
        assert!(!is_owned_by("user-1/", "user-1"));
        assert!(!is_owned_by("other/user-1/a.pdf", "user-1"));
        assert!(!is_owned_by("a.pdf", ""));
    }
}
