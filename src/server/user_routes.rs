//! Account endpoints of the current user, and public per-user listings.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::identity::IdentityManager;
use crate::store::{HistoryEntry, Playlist, ProfileImage, Tweet, User, UserSummary, VideoWithOwner};

use super::envelope::{ApiJson, ApiPath, ApiResponse};
use super::session::Session;
use super::state::{
    GuardedIdentityManager, GuardedPlaylistManager, GuardedTweetManager, GuardedViewManager,
    ServerState,
};
use super::upload_form::UploadForm;

#[derive(Deserialize, Debug)]
struct UpdateDetailsBody {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct ChangePasswordBody {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

async fn get_current_user(
    State(identity): State<GuardedIdentityManager>,
    session: Session,
) -> ApiResult<ApiResponse<User>> {
    let user = identity.current_user(session.user_id)?;
    Ok(ApiResponse::ok(user, "Current user"))
}

async fn update_details(
    State(identity): State<GuardedIdentityManager>,
    session: Session,
    ApiJson(body): ApiJson<UpdateDetailsBody>,
) -> ApiResult<ApiResponse<User>> {
    let user = identity.update_details(
        session.user_id,
        body.full_name.as_deref(),
        body.email.as_deref(),
    )?;
    Ok(ApiResponse::ok(user, "Account details updated"))
}

async fn change_password(
    State(identity): State<GuardedIdentityManager>,
    session: Session,
    ApiJson(body): ApiJson<ChangePasswordBody>,
) -> ApiResult<ApiResponse<()>> {
    identity.change_password(session.user_id, &body.old_password, &body.new_password)?;
    Ok(ApiResponse::ok((), "Password changed"))
}

async fn update_image(
    identity: &IdentityManager,
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
    slot: ProfileImage,
    field: &str,
) -> ApiResult<User> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.require_file(field)?;
    identity.update_image(session.user_id, slot, upload).await
}

async fn update_avatar(
    State(identity): State<GuardedIdentityManager>,
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<User>> {
    let user = update_image(&identity, session, multipart, ProfileImage::Avatar, "avatar").await?;
    Ok(ApiResponse::ok(user, "Avatar updated"))
}

async fn update_cover(
    State(identity): State<GuardedIdentityManager>,
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<User>> {
    let user = update_image(
        &identity,
        session,
        multipart,
        ProfileImage::Cover,
        "cover_image",
    )
    .await?;
    Ok(ApiResponse::ok(user, "Cover image updated"))
}

async fn get_watch_history(
    State(views): State<GuardedViewManager>,
    session: Session,
) -> ApiResult<ApiResponse<Vec<HistoryEntry>>> {
    let history = views.watch_history(session.user_id)?;
    Ok(ApiResponse::ok(history, "Watch history"))
}

async fn get_liked_videos(
    State(views): State<GuardedViewManager>,
    session: Session,
) -> ApiResult<ApiResponse<Vec<VideoWithOwner>>> {
    let videos = views.liked_videos(session.user_id)?;
    Ok(ApiResponse::ok(videos, "Liked videos"))
}

async fn get_user_subscriptions(
    State(views): State<GuardedViewManager>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<UserSummary>>> {
    let channels = views.subscriptions(user_id)?;
    Ok(ApiResponse::ok(channels, "Subscribed channels"))
}

async fn get_user_tweets(
    State(tweets): State<GuardedTweetManager>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<Tweet>>> {
    let tweets = tweets.list_for_user(user_id)?;
    Ok(ApiResponse::ok(tweets, "User tweets"))
}

async fn get_user_playlists(
    State(playlists): State<GuardedPlaylistManager>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<Playlist>>> {
    let playlists = playlists.list_for_user(user_id)?;
    Ok(ApiResponse::ok(playlists, "User playlists"))
}

pub fn user_routes() -> Router<ServerState> {
    Router::new()
        .route("/me", get(get_current_user).patch(update_details))
        .route("/me/password", post(change_password))
        .route("/me/avatar", patch(update_avatar))
        .route("/me/cover", patch(update_cover))
        .route("/me/history", get(get_watch_history))
        .route("/me/liked-videos", get(get_liked_videos))
        .route("/{user_id}/subscriptions", get(get_user_subscriptions))
        .route("/{user_id}/tweets", get(get_user_tweets))
        .route("/{user_id}/playlists", get(get_user_playlists))
}
