//! Video catalog: listing, upload, watch, edit, publish toggle and likes.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::content::VideoUpload;
use crate::error::{ApiError, ApiResult};
use crate::social::Toggled;
use crate::store::{
    Like, Page, SortDirection, Video, VideoChanges, VideoQuery, VideoSortField, VideoWithOwner,
};

use super::comment_routes::{add_video_comment, get_video_comments};
use super::envelope::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use super::session::Session;
use super::state::{GuardedVideoManager, ServerState};
use super::upload_form::UploadForm;

#[derive(Deserialize, Debug, Default)]
pub(super) struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Page numbers start at 1; the limit is capped at `Page::MAX_LIMIT`.
    pub fn to_page(&self) -> ApiResult<Page> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(Page::DEFAULT_LIMIT);
        if page == 0 {
            return Err(ApiError::invalid("page must be at least 1"));
        }
        if limit == 0 {
            return Err(ApiError::invalid("limit must be at least 1"));
        }
        Ok(Page {
            page,
            limit: limit.min(Page::MAX_LIMIT),
        })
    }
}

#[derive(Deserialize, Debug, Default)]
struct ListVideosQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub query: Option<String>,
    pub sort_by: Option<VideoSortField>,
    pub sort_type: Option<SortDirection>,
    pub user_id: Option<Uuid>,
}

impl ListVideosQuery {
    fn to_video_query(&self) -> ApiResult<VideoQuery> {
        Ok(VideoQuery {
            page: PageQuery {
                page: self.page,
                limit: self.limit,
            }
            .to_page()?,
            title_contains: self
                .query
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_direction: self.sort_type.unwrap_or_default(),
            owner_id: self.user_id,
        })
    }
}

#[derive(Deserialize, Debug)]
struct UpdateVideoBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

async fn list_videos(
    State(videos): State<GuardedVideoManager>,
    ApiQuery(query): ApiQuery<ListVideosQuery>,
) -> ApiResult<ApiResponse<Vec<VideoWithOwner>>> {
    let videos = videos.list(&query.to_video_query()?)?;
    Ok(ApiResponse::ok(videos, "Videos"))
}

async fn publish_video(
    State(videos): State<GuardedVideoManager>,
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<Video>> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = VideoUpload {
        title: form.text("title").to_string(),
        description: form.text("description").to_string(),
        video: form.require_file("video")?,
        thumbnail: form.take_file("thumbnail"),
    };
    let video = videos.publish(session.user_id, upload).await?;
    Ok(ApiResponse::created(video, "Video published"))
}

async fn get_video(
    State(videos): State<GuardedVideoManager>,
    session: Option<Session>,
    ApiPath(video_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Video>> {
    let video = videos.watch(video_id, session.map(|s| s.user_id))?;
    Ok(ApiResponse::ok(video, "Video"))
}

async fn update_video(
    State(videos): State<GuardedVideoManager>,
    session: Session,
    ApiPath(video_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateVideoBody>,
) -> ApiResult<ApiResponse<Video>> {
    let changes = VideoChanges {
        title: body.title,
        description: body.description,
        thumbnail_url: body.thumbnail_url,
    };
    let video = videos.update(session.user_id, video_id, changes)?;
    Ok(ApiResponse::ok(video, "Video updated"))
}

async fn delete_video(
    State(videos): State<GuardedVideoManager>,
    session: Session,
    ApiPath(video_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Video>> {
    let video = videos.delete(session.user_id, video_id).await?;
    Ok(ApiResponse::ok(video, "Video deleted"))
}

async fn toggle_publish(
    State(videos): State<GuardedVideoManager>,
    session: Session,
    ApiPath(video_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Video>> {
    let video = videos.toggle_publish(session.user_id, video_id)?;
    debug!("Video {} published: {}", video.id, video.is_published);
    Ok(ApiResponse::ok(video, "Publish status toggled"))
}

async fn toggle_video_like(
    State(videos): State<GuardedVideoManager>,
    session: Session,
    ApiPath(video_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Toggled<Like>>> {
    let toggled = videos.toggle_like(session.user_id, video_id)?;
    Ok(ApiResponse::toggled(toggled, "Like"))
}

pub fn video_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route(
            "/{video_id}",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/{video_id}/publish", patch(toggle_publish))
        .route(
            "/{video_id}/comments",
            get(get_video_comments).post(add_video_comment),
        )
        .route("/{video_id}/like", post(toggle_video_like))
}
