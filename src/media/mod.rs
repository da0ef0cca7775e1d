//! Storage for uploaded video, thumbnail and profile image files.

mod local_store;

pub use local_store::LocalMediaStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::ApiError;

/// Public path prefix under which stored files are served.
pub const MEDIA_URL_PREFIX: &str = "/media";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Thumbnail,
    Avatar,
    Cover,
}

impl MediaKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Thumbnail => "thumbnail",
            MediaKind::Avatar => "avatar",
            MediaKind::Cover => "cover",
        }
    }

    /// MIME family every file of this kind must belong to.
    pub fn expected_family(&self) -> &'static str {
        match self {
            MediaKind::Video => "video/",
            MediaKind::Thumbnail | MediaKind::Avatar | MediaKind::Cover => "image/",
        }
    }
}

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Uploaded file is empty")]
    Empty,

    #[error("Uploaded file is {size} bytes, the limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("Expected a {expected}* file, got {actual}")]
    WrongType {
        expected: &'static str,
        actual: String,
    },

    #[error("Media I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Io(io) => ApiError::Internal(io.into()),
            other => ApiError::InvalidArgument(other.to_string()),
        }
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Validates and persists the upload, returning its public URL.
    async fn store(&self, kind: MediaKind, upload: MediaUpload) -> Result<String, MediaError>;

    /// Removes a previously stored file. Unknown URLs are ignored.
    async fn delete(&self, url: &str) -> Result<(), MediaError>;
}
