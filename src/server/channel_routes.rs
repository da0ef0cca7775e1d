//! Channel pages: profile, stats, videos, subscribers, and the subscribe toggle.

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::social::{toggle, SubscriptionRelation, Toggled};
use crate::store::{ChannelProfile, ChannelStats, Subscription, UserSummary, VideoWithOwner};

use super::envelope::{ApiPath, ApiResponse};
use super::session::Session;
use super::state::{GuardedStore, GuardedViewManager, ServerState};

async fn get_channel_profile(
    State(views): State<GuardedViewManager>,
    session: Option<Session>,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<ApiResponse<ChannelProfile>> {
    let profile = views.channel_profile(&username, session.map(|s| s.user_id))?;
    Ok(ApiResponse::ok(profile, "Channel profile"))
}

async fn get_channel_stats(
    State(views): State<GuardedViewManager>,
    ApiPath(channel_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<ChannelStats>> {
    let stats = views.channel_stats(channel_id)?;
    Ok(ApiResponse::ok(stats, "Channel stats"))
}

async fn get_channel_videos(
    State(views): State<GuardedViewManager>,
    session: Option<Session>,
    ApiPath(channel_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<VideoWithOwner>>> {
    let videos = views.channel_videos(channel_id, session.map(|s| s.user_id))?;
    Ok(ApiResponse::ok(videos, "Channel videos"))
}

async fn get_channel_subscribers(
    State(views): State<GuardedViewManager>,
    ApiPath(channel_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<UserSummary>>> {
    let subscribers = views.subscribers(channel_id)?;
    Ok(ApiResponse::ok(subscribers, "Channel subscribers"))
}

async fn toggle_subscription(
    State(store): State<GuardedStore>,
    session: Session,
    ApiPath(channel_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Toggled<Subscription>>> {
    let toggled = toggle::<SubscriptionRelation, _>(
        store.as_ref(),
        session.user_id,
        channel_id,
    )?;
    debug!(
        "Subscription {} -> {}: {}",
        session.user_id,
        channel_id,
        toggled.state.as_str()
    );
    Ok(ApiResponse::toggled(toggled, "Subscription"))
}

pub fn channel_routes() -> Router<ServerState> {
    Router::new()
        .route("/by-username/{username}", get(get_channel_profile))
        .route("/{channel_id}/stats", get(get_channel_stats))
        .route("/{channel_id}/videos", get(get_channel_videos))
        .route("/{channel_id}/subscribers", get(get_channel_subscribers))
        .route("/{channel_id}/subscribe", post(toggle_subscription))
}
