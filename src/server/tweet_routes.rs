use axum::{
    extract::State,
    routing::{patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::social::Toggled;
use crate::store::{Like, Tweet};

use super::envelope::{ApiJson, ApiPath, ApiResponse};
use super::session::Session;
use super::state::{GuardedTweetManager, ServerState};

#[derive(Deserialize, Debug)]
struct TweetBody {
    #[serde(default)]
    pub content: String,
}

async fn create_tweet(
    State(tweets): State<GuardedTweetManager>,
    session: Session,
    ApiJson(body): ApiJson<TweetBody>,
) -> ApiResult<ApiResponse<Tweet>> {
    let tweet = tweets.create(session.user_id, &body.content)?;
    Ok(ApiResponse::created(tweet, "Tweet created"))
}

async fn update_tweet(
    State(tweets): State<GuardedTweetManager>,
    session: Session,
    ApiPath(tweet_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<TweetBody>,
) -> ApiResult<ApiResponse<Tweet>> {
    let tweet = tweets.update(session.user_id, tweet_id, &body.content)?;
    Ok(ApiResponse::ok(tweet, "Tweet updated"))
}

async fn delete_tweet(
    State(tweets): State<GuardedTweetManager>,
    session: Session,
    ApiPath(tweet_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Tweet>> {
    let tweet = tweets.delete(session.user_id, tweet_id)?;
    Ok(ApiResponse::ok(tweet, "Tweet deleted"))
}

async fn toggle_tweet_like(
    State(tweets): State<GuardedTweetManager>,
    session: Session,
    ApiPath(tweet_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Toggled<Like>>> {
    let toggled = tweets.toggle_like(session.user_id, tweet_id)?;
    Ok(ApiResponse::toggled(toggled, "Like"))
}

pub fn tweet_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/{tweet_id}", patch(update_tweet).delete(delete_tweet))
        .route("/{tweet_id}/like", post(toggle_tweet_like))
}
