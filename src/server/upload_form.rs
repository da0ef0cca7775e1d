//! Multipart forms mixing text fields and uploaded files.

use axum::extract::{multipart::MultipartRejection, Multipart};
use std::collections::HashMap;

use crate::error::{ApiError, ApiResult};
use crate::media::MediaUpload;

#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, MediaUpload>,
}

impl UploadForm {
    /// Buffers every part. Parts carrying a file name are files.
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Self> {
        let mut multipart = multipart.map_err(|e| ApiError::invalid(e.body_text()))?;
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::invalid(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::invalid(e.body_text()))?;

            if file_name.is_some() {
                form.files.insert(
                    name,
                    MediaUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    },
                );
            } else {
                form.fields
                    .insert(name, String::from_utf8_lossy(&bytes).into_owned());
            }
        }
        Ok(form)
    }

    /// Empty when absent, so blank checks downstream report it as required.
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn take_file(&mut self, name: &str) -> Option<MediaUpload> {
        self.files.remove(name)
    }

    pub fn require_file(&mut self, name: &str) -> ApiResult<MediaUpload> {
        self.take_file(name)
            .ok_or_else(|| ApiError::invalid(format!("{} file is required", name)))
    }
}
