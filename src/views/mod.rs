//! Read-only composed views over channels and users.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::store::{
    ChannelProfile, ChannelStats, FullStore, HistoryEntry, UserSummary, VideoWithOwner,
};

pub struct ViewManager {
    store: Arc<dyn FullStore>,
}

impl ViewManager {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        ViewManager { store }
    }

    fn require_user(&self, user_id: Uuid, what: &str) -> ApiResult<()> {
        if self.store.get_user(user_id)?.is_none() {
            return Err(ApiError::not_found(what));
        }
        Ok(())
    }

    pub fn channel_stats(&self, channel_id: Uuid) -> ApiResult<ChannelStats> {
        self.require_user(channel_id, "Channel")?;
        Ok(self.store.channel_stats(channel_id)?)
    }

    /// `is_subscribed` reflects the viewer, and is false for anonymous viewers.
    pub fn channel_profile(&self, username: &str, viewer: Option<Uuid>) -> ApiResult<ChannelProfile> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(ApiError::invalid("username is required"));
        }
        let user = self
            .store
            .get_user_by_username(&username)?
            .ok_or_else(|| ApiError::not_found("Channel"))?;

        let is_subscribed = match viewer {
            Some(viewer) => self.store.is_subscribed(viewer, user.id)?,
            None => false,
        };
        Ok(ChannelProfile {
            subscribers_count: self.store.count_subscribers(user.id)?,
            subscribed_to_count: self.store.count_subscriptions(user.id)?,
            is_subscribed,
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
        })
    }

    pub fn watch_history(&self, user_id: Uuid) -> ApiResult<Vec<HistoryEntry>> {
        self.require_user(user_id, "User")?;
        Ok(self.store.watch_history(user_id)?)
    }

    pub fn subscribers(&self, channel_id: Uuid) -> ApiResult<Vec<UserSummary>> {
        self.require_user(channel_id, "Channel")?;
        Ok(self.store.list_subscribers(channel_id)?)
    }

    pub fn subscriptions(&self, user_id: Uuid) -> ApiResult<Vec<UserSummary>> {
        self.require_user(user_id, "User")?;
        Ok(self.store.list_subscriptions(user_id)?)
    }

    pub fn liked_videos(&self, user_id: Uuid) -> ApiResult<Vec<VideoWithOwner>> {
        self.require_user(user_id, "User")?;
        Ok(self.store.liked_videos(user_id)?)
    }

    /// The owner also sees their unpublished videos.
    pub fn channel_videos(
        &self,
        channel_id: Uuid,
        viewer: Option<Uuid>,
    ) -> ApiResult<Vec<VideoWithOwner>> {
        self.require_user(channel_id, "Channel")?;
        Ok(self
            .store
            .channel_videos(channel_id, viewer == Some(channel_id))?)
    }
}
