use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{required, ApiError, ApiResult};
use crate::social::{authorize, visible_video};
use crate::store::{FullStore, Insertion, Playlist};

pub const MAX_PLAYLIST_SIZE: usize = 300;

pub struct PlaylistManager {
    store: Arc<dyn FullStore>,
}

impl PlaylistManager {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        PlaylistManager { store }
    }

    pub fn create(&self, principal: Uuid, name: &str, description: &str) -> ApiResult<Playlist> {
        let name = required("name", name)?;
        let description = required("description", description)?;
        Ok(self.store.insert_playlist(principal, &name, &description)?)
    }

    pub fn get(&self, playlist_id: Uuid) -> ApiResult<Playlist> {
        self.store
            .get_playlist(playlist_id)?
            .ok_or_else(|| ApiError::not_found("Playlist"))
    }

    pub fn list_for_user(&self, user_id: Uuid) -> ApiResult<Vec<Playlist>> {
        if self.store.get_user(user_id)?.is_none() {
            return Err(ApiError::not_found("User"));
        }
        Ok(self.store.list_user_playlists(user_id)?)
    }

    pub fn update(
        &self,
        principal: Uuid,
        playlist_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ApiResult<Playlist> {
        if name.is_none() && description.is_none() {
            return Err(ApiError::invalid("name or description is required"));
        }
        let name = name.map(|n| required("name", n)).transpose()?;
        let description = description
            .map(|d| required("description", d))
            .transpose()?;

        authorize(self.store.get_playlist(playlist_id), principal)?;
        self.store
            .update_playlist(playlist_id, name.as_deref(), description.as_deref())?
            .ok_or_else(|| ApiError::not_found("Playlist"))
    }

    pub fn delete(&self, principal: Uuid, playlist_id: Uuid) -> ApiResult<Playlist> {
        let playlist = authorize(self.store.get_playlist(playlist_id), principal)?;
        if !self.store.delete_playlist(playlist_id)? {
            return Err(ApiError::not_found("Playlist"));
        }
        Ok(playlist)
    }

    pub fn add_video(&self, principal: Uuid, playlist_id: Uuid, video_id: Uuid) -> ApiResult<Playlist> {
        let playlist = authorize(self.store.get_playlist(playlist_id), principal)?;
        visible_video(self.store.get_video(video_id), Some(principal))?;
        if playlist.videos.contains(&video_id) {
            return Err(ApiError::conflict("Video is already in the playlist"));
        }
        if playlist.videos.len() >= MAX_PLAYLIST_SIZE {
            return Err(ApiError::invalid(format!(
                "A playlist holds at most {} videos",
                MAX_PLAYLIST_SIZE
            )));
        }

        match self.store.add_playlist_video(playlist_id, video_id)? {
            Insertion::Inserted(()) => {}
            Insertion::Duplicate => {
                return Err(ApiError::conflict("Video is already in the playlist"))
            }
        }
        debug!("Added video {} to playlist {}", video_id, playlist_id);
        self.get(playlist_id)
    }

    pub fn remove_video(
        &self,
        principal: Uuid,
        playlist_id: Uuid,
        video_id: Uuid,
    ) -> ApiResult<Playlist> {
        let playlist = authorize(self.store.get_playlist(playlist_id), principal)?;
        if !playlist.videos.contains(&video_id)
            || !self.store.remove_playlist_video(playlist_id, video_id)?
        {
            return Err(ApiError::not_found("Video in playlist"));
        }
        self.get(playlist_id)
    }
}
