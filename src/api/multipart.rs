use crate::services::disk_storage::UploadedFile;
use crate::utils::error::{AppError, AppResult};
use actix_multipart::Multipart;
use futures::stream::TryStreamExt;
use std::collections::HashMap;

const MAX_TEXT_FIELD_BYTES: usize = 4 * 1024;

/// Text fields plus the (single) `file` field of an upload form
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
    }
}

/// Buffers a multipart upload, enforcing `max_file_bytes` on the `file` field.
pub async fn read_upload_form(mut payload: Multipart, max_file_bytes: usize) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string)
                .unwrap_or_else(|| "file".to_string());
            let content_type = field
                .content_type()
                .map(|m| m.essence_str().to_string())
                .or_else(|| mime_guess::from_path(&file_name).first().map(|m| m.essence_str().to_string()))
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let mut bytes = Vec::new();
            while let Some(chunk) = field.try_next().await? {
                if bytes.len() + chunk.len() > max_file_bytes {
                    return Err(AppError::PayloadTooLarge(format!(
                        "File exceeds the {} byte limit",
                        max_file_bytes
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }

            form.file = Some(UploadedFile {
                file_name,
                content_type,
                bytes,
            });
        } else {
            let mut value = Vec::new();
            while let Some(chunk) = field.try_next().await? {
                if value.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
                    return Err(AppError::InvalidRequest(format!("Field '{}' is too long", name)));
                }
                value.extend_from_slice(&chunk);
            }
            let value = String::from_utf8(value)
                .map_err(|_| AppError::InvalidRequest(format!("Field '{}' is not valid UTF-8", name)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
