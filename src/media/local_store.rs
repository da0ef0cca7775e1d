use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{MediaError, MediaKind, MediaStore, MediaUpload, MEDIA_URL_PREFIX};

/// Keeps media on the local filesystem as `<root>/<kind>/<uuid>.<ext>`.
pub struct LocalMediaStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalMediaStore {
    pub fn new<P: AsRef<Path>>(root: P, max_bytes: usize) -> Self {
        LocalMediaStore {
            root: root.as_ref().to_path_buf(),
            max_bytes,
        }
    }

    /// Maps a public URL back to a path inside the root, refusing anything
    /// that would escape it.
    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(MEDIA_URL_PREFIX)?.trim_start_matches('/');
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

fn extension_for(upload: &MediaUpload, sniffed: Option<&infer::Type>) -> String {
    if let Some(kind) = sniffed {
        return kind.extension().to_string();
    }
    upload
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, kind: MediaKind, upload: MediaUpload) -> Result<String, MediaError> {
        if upload.bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(MediaError::TooLarge {
                size: upload.bytes.len(),
                max: self.max_bytes,
            });
        }

        let sniffed = infer::get(&upload.bytes);
        let extension = extension_for(&upload, sniffed.as_ref());
        let content_type = sniffed
            .map(|t| t.mime_type().to_string())
            .or_else(|| upload.content_type.clone())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        if !content_type.starts_with(kind.expected_family()) {
            return Err(MediaError::WrongType {
                expected: kind.expected_family(),
                actual: content_type,
            });
        }

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let dir = self.root.join(kind.dir_name());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &upload.bytes).await?;
        debug!(
            "Stored {} bytes of {} as {}/{}",
            upload.bytes.len(),
            content_type,
            kind.dir_name(),
            file_name
        );

        Ok(format!(
            "{}/{}/{}",
            MEDIA_URL_PREFIX,
            kind.dir_name(),
            file_name
        ))
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let Some(path) = self.path_for_url(url) else {
            warn!("Refusing to delete media outside the store: {}", url);
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
