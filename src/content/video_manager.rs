use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{required, ApiError, ApiResult};
use crate::media::{MediaKind, MediaStore, MediaUpload};
use crate::social::{authorize, toggle, visible_video, LikeRelation, Toggled};
use crate::store::{
    FullStore, Like, LikeTarget, NewVideo, Video, VideoChanges, VideoQuery, VideoWithOwner,
};

/// Fields of a video upload form.
#[derive(Debug)]
pub struct VideoUpload {
    pub title: String,
    pub description: String,
    pub video: MediaUpload,
    pub thumbnail: Option<MediaUpload>,
}

pub struct VideoManager {
    store: Arc<dyn FullStore>,
    media: Arc<dyn MediaStore>,
}

impl VideoManager {
    pub fn new(store: Arc<dyn FullStore>, media: Arc<dyn MediaStore>) -> Self {
        VideoManager { store, media }
    }

    pub async fn publish(&self, owner_id: Uuid, upload: VideoUpload) -> ApiResult<Video> {
        let title = required("title", &upload.title)?;
        let description = required("description", &upload.description)?;

        let video_url = self.media.store(MediaKind::Video, upload.video).await?;
        let thumbnail_url = match upload.thumbnail {
            Some(thumbnail) => match self.media.store(MediaKind::Thumbnail, thumbnail).await {
                Ok(url) => Some(url),
                Err(err) => {
                    self.discard_media(&video_url).await;
                    return Err(err.into());
                }
            },
            None => None,
        };

        let inserted = self.store.insert_video(NewVideo {
            owner_id,
            title,
            description,
            video_url: video_url.clone(),
            thumbnail_url: thumbnail_url.clone(),
        });
        let video = match inserted {
            Ok(video) => video,
            Err(err) => {
                self.discard_media(&video_url).await;
                if let Some(thumbnail_url) = &thumbnail_url {
                    self.discard_media(thumbnail_url).await;
                }
                return Err(err.into());
            }
        };
        info!("User {} published video {}", owner_id, video.id);
        Ok(video)
    }

    pub fn list(&self, query: &VideoQuery) -> ApiResult<Vec<VideoWithOwner>> {
        Ok(self.store.list_videos(query)?)
    }

    /// Fetches a video and counts the view. Unpublished videos are only
    /// visible to their owner; an identified viewer also gets a history entry.
    pub fn watch(&self, video_id: Uuid, viewer: Option<Uuid>) -> ApiResult<Video> {
        let video = visible_video(self.store.get_video(video_id), viewer)?;
        self.store.record_view(video_id, viewer)?;
        Ok(Video {
            views: video.views + 1,
            ..video
        })
    }

    pub fn update(&self, principal: Uuid, video_id: Uuid, changes: VideoChanges) -> ApiResult<Video> {
        let changes = VideoChanges {
            title: changes.title.map(|t| required("title", &t)).transpose()?,
            description: changes
                .description
                .map(|d| required("description", &d))
                .transpose()?,
            thumbnail_url: changes
                .thumbnail_url
                .map(|t| required("thumbnail_url", &t))
                .transpose()?,
        };
        if changes.is_empty() {
            return Err(ApiError::invalid(
                "title, description or thumbnail_url is required",
            ));
        }

        authorize(self.store.get_video(video_id), principal)?;
        self.store
            .update_video(video_id, &changes)?
            .ok_or_else(|| ApiError::not_found("Video"))
    }

    pub async fn delete(&self, principal: Uuid, video_id: Uuid) -> ApiResult<Video> {
        let video = authorize(self.store.get_video(video_id), principal)?;
        if !self.store.delete_video(video_id)? {
            return Err(ApiError::not_found("Video"));
        }
        self.discard_media(&video.video_url).await;
        if let Some(thumbnail_url) = &video.thumbnail_url {
            self.discard_media(thumbnail_url).await;
        }
        info!("User {} deleted video {}", principal, video_id);
        Ok(video)
    }

    pub fn toggle_publish(&self, principal: Uuid, video_id: Uuid) -> ApiResult<Video> {
        let video = authorize(self.store.get_video(video_id), principal)?;
        self.store
            .set_video_published(video_id, !video.is_published)?
            .ok_or_else(|| ApiError::not_found("Video"))
    }

    pub fn toggle_like(&self, principal: Uuid, video_id: Uuid) -> ApiResult<Toggled<Like>> {
        toggle::<LikeRelation, _>(self.store.as_ref(), principal, LikeTarget::Video(video_id))
    }

    async fn discard_media(&self, url: &str) {
        if let Err(err) = self.media.delete(url).await {
            warn!("Could not delete media {}: {}", url, err);
        }
    }
}
