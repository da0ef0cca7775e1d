use axum::{
    extract::State,
    routing::{patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::social::Toggled;
use crate::store::{Comment, CommentWithOwner, Like};

use super::envelope::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use super::session::Session;
use super::state::{GuardedCommentManager, ServerState};
use super::video_routes::PageQuery;

#[derive(Deserialize, Debug)]
pub(super) struct CommentBody {
    #[serde(default)]
    pub content: String,
}

pub(super) async fn get_video_comments(
    State(comments): State<GuardedCommentManager>,
    session: Option<Session>,
    ApiPath(video_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<ApiResponse<Vec<CommentWithOwner>>> {
    let viewer = session.map(|s| s.user_id);
    let comments = comments.list(video_id, viewer, query.to_page()?)?;
    Ok(ApiResponse::ok(comments, "Comments"))
}

pub(super) async fn add_video_comment(
    State(comments): State<GuardedCommentManager>,
    session: Session,
    ApiPath(video_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CommentBody>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment = comments.add(session.user_id, video_id, &body.content)?;
    Ok(ApiResponse::created(comment, "Comment added"))
}

async fn update_comment(
    State(comments): State<GuardedCommentManager>,
    session: Session,
    ApiPath(comment_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CommentBody>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment = comments.update(session.user_id, comment_id, &body.content)?;
    Ok(ApiResponse::ok(comment, "Comment updated"))
}

async fn delete_comment(
    State(comments): State<GuardedCommentManager>,
    session: Session,
    ApiPath(comment_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment = comments.delete(session.user_id, comment_id)?;
    Ok(ApiResponse::ok(comment, "Comment deleted"))
}

async fn toggle_comment_like(
    State(comments): State<GuardedCommentManager>,
    session: Session,
    ApiPath(comment_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Toggled<Like>>> {
    let toggled = comments.toggle_like(session.user_id, comment_id)?;
    Ok(ApiResponse::toggled(toggled, "Like"))
}

pub fn comment_routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/{comment_id}",
            patch(update_comment).delete(delete_comment),
        )
        .route("/{comment_id}/like", post(toggle_comment_like))
}
