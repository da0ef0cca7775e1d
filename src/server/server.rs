use anyhow::{Context, Result};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;
use uuid::Uuid;

use crate::content::{CommentManager, PlaylistManager, TweetManager, VideoManager};
use crate::identity::{IdentityManager, TokenIssuer};
use crate::media::{MediaStore, MEDIA_URL_PREFIX};
use crate::store::FullStore;
use crate::views::ViewManager;

use super::auth_routes::auth_routes;
use super::channel_routes::channel_routes;
use super::comment_routes::comment_routes;
use super::envelope::{route_not_found, ApiResponse};
use super::metrics::metrics_handler;
use super::playlist_routes::playlist_routes;
use super::session::Session;
use super::state::ServerState;
use super::tweet_routes::tweet_routes;
use super::user_routes::user_routes;
use super::video_routes::video_routes;
use super::{log_requests, ServerConfig};

/// Room for multipart boundaries and text fields on top of the file limit.
const UPLOAD_FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub user_id: Option<Uuid>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(
    session: Option<Session>,
    State(state): State<ServerState>,
) -> ApiResponse<ServerStats> {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        user_id: session.map(|s| s.user_id),
    };
    ApiResponse::ok(stats, "Clipnest is running")
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn FullStore>,
        media: Arc<dyn MediaStore>,
        tokens: TokenIssuer,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            hash: env!("CLIPNEST_BUILD_HASH").to_owned(),
            identity: Arc::new(IdentityManager::new(store.clone(), media.clone(), tokens)),
            videos: Arc::new(VideoManager::new(store.clone(), media)),
            comments: Arc::new(CommentManager::new(store.clone())),
            tweets: Arc::new(TweetManager::new(store.clone())),
            playlists: Arc::new(PlaylistManager::new(store.clone())),
            views: Arc::new(ViewManager::new(store.clone())),
            store,
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    store: Arc<dyn FullStore>,
    media: Arc<dyn MediaStore>,
    tokens: TokenIssuer,
) -> Router {
    let body_limit = config
        .max_upload_bytes
        .saturating_add(UPLOAD_FORM_OVERHEAD_BYTES);
    let media_service = ServeDir::new(&config.media_dir);
    let state = ServerState::new(config, store, media, tokens);

    let api_routes: Router<ServerState> = Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/channels", channel_routes())
        .nest("/videos", video_routes())
        .nest("/comments", comment_routes())
        .nest("/tweets", tweet_routes())
        .nest("/playlists", playlist_routes());

    Router::new()
        .route("/", get(home))
        .nest("/v1", api_routes)
        .nest_service(MEDIA_URL_PREFIX, media_service)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub async fn run_server(
    config: ServerConfig,
    store: Arc<dyn FullStore>,
    media: Arc<dyn MediaStore>,
    tokens: TokenIssuer,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, store, media, tokens);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Could not bind port {}", port))?;
    let metrics_listener = TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Could not bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    let api = async {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("API server failed")
    };
    let metrics = async {
        axum::serve(metrics_listener, make_metrics_app())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Metrics server failed")
    };
    tokio::try_join!(api, metrics)?;
    Ok(())
}
