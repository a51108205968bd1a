// ==================== DISK STORAGE ====================
// Binários ficam em disco sob UPLOADS_DIR; o banco guarda só o caminho relativo.

use crate::config::AppConfig;
use crate::models::{DocKind, DocumentCategory};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{
    normalize_relative_path, resolve_under, sanitize_filename, sanitize_segment, upload_owner,
    CLIENT_DOCUMENTS_DIR,
};
use std::path::PathBuf;
use tokio::process::Command;

const THUMBNAIL_SUFFIX: &str = ".thumb.png";
const THUMBNAIL_WIDTH: &str = "480";

/// A file received from a multipart form, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type.eq_ignore_ascii_case("application/pdf")
            || self.file_name.to_lowercase().ends_with(".pdf")
    }
}

pub struct DiskStorage {
    root: PathBuf,
    public_base_url: String,
    thumbnail_tool: String,
}

/// Sibling thumbnail path for a stored file
pub fn thumbnail_path(relative: &str) -> String {
    format!("{}{}", relative, THUMBNAIL_SUFFIX)
}

fn encode_path(relative: &str) -> String {
    relative
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl DiskStorage {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            root: config.uploads_dir.clone(),
            public_base_url: config.public_base_url.clone(),
            thumbnail_tool: config.thumbnail_tool.clone(),
        }
    }

    /// `<owner>/<category>/<millis>-<name>` for the generic upload endpoint,
    /// `owner` being [`upload_owner`] of the token subject
    pub fn user_upload_path(&self, user_id: &str, category: &str, file_name: &str, millis: i64) -> String {
        format!(
            "{}/{}/{}-{}",
            upload_owner(user_id),
            sanitize_segment(category, "general"),
            millis,
            sanitize_filename(file_name)
        )
    }

    /// `clients/<client_id>/<category>/<doc_kind>/<millis>-<name>` for client documents
    pub fn client_document_path(
        &self,
        client_id: &str,
        category: DocumentCategory,
        doc_kind: DocKind,
        file_name: &str,
        millis: i64,
    ) -> String {
        format!(
            "{}/{}/{}/{}/{}-{}",
            CLIENT_DOCUMENTS_DIR,
            sanitize_segment(client_id, "unknown"),
            category,
            doc_kind,
            millis,
            sanitize_filename(file_name)
        )
    }

    pub fn public_url(&self, relative: &str) -> String {
        format!("{}/uploads/{}", self.public_base_url, encode_path(relative))
    }

    pub async fn write(&self, relative: &str, bytes: &[u8]) -> AppResult<()> {
        let path = resolve_under(&self.root, relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Escreve num temporário e renomeia, leitores nunca veem arquivo parcial
        let tmp = path.with_extension(format!("{}.part", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        log::debug!("💾 Stored {} ({} bytes)", relative, bytes.len());
        Ok(())
    }

    pub async fn exists(&self, relative: &str) -> bool {
        match resolve_under(&self.root, relative) {
            Ok(path) => tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Reads a stored file. `None` when absent or not a regular file.
    pub async fn read(&self, relative: &str) -> AppResult<Option<Vec<u8>>> {
        let path = resolve_under(&self.root, relative)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(tokio::fs::read(&path).await?)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes a file and its thumbnail. Returns false when the file did not exist.
    pub async fn remove(&self, relative: &str) -> AppResult<bool> {
        let normalized = normalize_relative_path(relative)?;
        let path = self.root.join(&normalized);

        let removed = match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(AppError::StorageError(format!("Failed to remove {}: {}", normalized, e))),
        };

        let thumb = self.root.join(thumbnail_path(&normalized));
        match tokio::fs::remove_file(&thumb).await {
            Ok(()) => log::debug!("🗑️  Removed thumbnail for {}", normalized),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("⚠️  Could not remove thumbnail for {}: {}", normalized, e),
        }

        Ok(removed)
    }

    /// Renders the first page of a stored PDF to `<file>.thumb.png`.
    ///
    /// Never fails the caller: any problem is logged and `None` returned.
    pub async fn generate_thumbnail(&self, relative: &str) -> Option<String> {
        let source = match resolve_under(&self.root, relative) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("⚠️  Thumbnail skipped for {}: {}", relative, e);
                return None;
            }
        };
        let thumb_relative = thumbnail_path(relative);
        // pdftoppm -singlefile acrescenta ".png" ao prefixo de saída
        let output_prefix = self.root.join(format!("{}.thumb", relative));

        let result = Command::new(&self.thumbnail_tool)
            .arg("-png")
            .arg("-singlefile")
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg("1")
            .arg("-scale-to")
            .arg(THUMBNAIL_WIDTH)
            .arg(&source)
            .arg(&output_prefix)
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                if self.exists(&thumb_relative).await {
                    log::info!("🖼️  Thumbnail created: {}", thumb_relative);
                    Some(thumb_relative)
                } else {
                    log::warn!("⚠️  Thumbnail tool succeeded but produced no file for {}", relative);
                    None
                }
            }
            Ok(output) => {
                log::warn!(
                    "⚠️  Thumbnail tool failed for {} ({}): {}",
                    relative,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                log::warn!("⚠️  Thumbnail tool '{}' unavailable: {}", self.thumbnail_tool, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;

    #[test]
    fn test_paths_are_sanitized() {
        let (config, _dirs) = test_config();
        let storage = DiskStorage::new(&config);

        assert_eq!(
            storage.user_upload_path("user-1", "../Bank Docs", "my file.pdf", 42),
            "user-1/_Bank_Docs/42-my_file.pdf"
        );
        assert!(storage
            .user_upload_path("clients", "general", "a.txt", 1)
            .starts_with("clients-"));
        assert_eq!(
            storage.client_document_path("c1", DocumentCategory::Identity, DocKind::Passport, "p.jpg", 7),
            "clients/c1/identity/passport/7-p.jpg"
        );
    }

    #[test]
    fn test_public_url_encodes_segments() {
        let (config, _dirs) = test_config();
        let storage = DiskStorage::new(&config);
        assert_eq!(
            storage.public_url("u1/general/1-a b.pdf"),
            "http://localhost:3001/uploads/u1/general/1-a%20b.pdf"
        );
    }

    #[tokio::test]
    async fn test_write_read_remove() {
        let (config, _dirs) = test_config();
        let storage = DiskStorage::new(&config);

        storage.write("u1/general/1-a.txt", b"hello").await.unwrap();
        storage.write("u1/general/1-a.txt.thumb.png", b"png").await.unwrap();
        assert_eq!(storage.read("u1/general/1-a.txt").await.unwrap().unwrap(), b"hello");

        assert!(storage.remove("u1/general/1-a.txt").await.unwrap());
        assert!(!storage.exists("u1/general/1-a.txt.thumb.png").await);
        assert!(!storage.remove("u1/general/1-a.txt").await.unwrap());
        assert!(storage.read("u1/general/1-a.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let (config, _dirs) = test_config();
        let storage = DiskStorage::new(&config);
        assert!(storage.write("../escape.txt", b"x").await.is_err());
        assert!(storage.read("u1/../../etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_thumbnail_tool_is_swallowed() {
        let (config, _dirs) = test_config();
        let storage = DiskStorage::new(&config);
        storage.write("u1/general/1-doc.pdf", b"%PDF-1.4").await.unwrap();

        assert!(storage.generate_thumbnail("u1/general/1-doc.pdf").await.is_none());
    }

    #[test]
    fn test_is_pdf() {
        let file = UploadedFile {
            file_name: "SCAN.PDF".into(),
            content_type: "application/octet-stream".into(),
            bytes: vec![],
        };
        assert!(file.is_pdf());
        let file = UploadedFile {
            file_name: "scan".into(),
            content_type: "application/pdf".into(),
            bytes: vec![],
        };
        assert!(file.is_pdf());
    }
}
