use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::store::Playlist;

use super::envelope::{ApiJson, ApiPath, ApiResponse};
use super::session::Session;
use super::state::{GuardedPlaylistManager, ServerState};

#[derive(Deserialize, Debug)]
struct CreatePlaylistBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Debug)]
struct UpdatePlaylistBody {
    pub name: Option<String>,
    pub description: Option<String>,
}

async fn create_playlist(
    State(playlists): State<GuardedPlaylistManager>,
    session: Session,
    ApiJson(body): ApiJson<CreatePlaylistBody>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist = playlists.create(session.user_id, &body.name, &body.description)?;
    Ok(ApiResponse::created(playlist, "Playlist created"))
}

async fn get_playlist(
    State(playlists): State<GuardedPlaylistManager>,
    ApiPath(playlist_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist = playlists.get(playlist_id)?;
    Ok(ApiResponse::ok(playlist, "Playlist"))
}

async fn update_playlist(
    State(playlists): State<GuardedPlaylistManager>,
    session: Session,
    ApiPath(playlist_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdatePlaylistBody>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist = playlists.update(
        session.user_id,
        playlist_id,
        body.name.as_deref(),
        body.description.as_deref(),
    )?;
    Ok(ApiResponse::ok(playlist, "Playlist updated"))
}

async fn delete_playlist(
    State(playlists): State<GuardedPlaylistManager>,
    session: Session,
    ApiPath(playlist_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist = playlists.delete(session.user_id, playlist_id)?;
    Ok(ApiResponse::ok(playlist, "Playlist deleted"))
}

async fn add_playlist_video(
    State(playlists): State<GuardedPlaylistManager>,
    session: Session,
    ApiPath((playlist_id, video_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist = playlists.add_video(session.user_id, playlist_id, video_id)?;
    debug!("Playlist {} now has {} videos", playlist.id, playlist.videos.len());
    Ok(ApiResponse::ok(playlist, "Video added to playlist"))
}

async fn remove_playlist_video(
    State(playlists): State<GuardedPlaylistManager>,
    session: Session,
    ApiPath((playlist_id, video_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<ApiResponse<Playlist>> {
    let playlist = playlists.remove_video(session.user_id, playlist_id, video_id)?;
    Ok(ApiResponse::ok(playlist, "Video removed from playlist"))
}

pub fn playlist_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(create_playlist))
        .route(
            "/{playlist_id}",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route(
            "/{playlist_id}/videos/{video_id}",
            post(add_playlist_video).delete(remove_playlist_video),
        )
}
