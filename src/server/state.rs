use axum::extract::FromRef;

use crate::content::{CommentManager, PlaylistManager, TweetManager, VideoManager};
use crate::identity::IdentityManager;
use crate::store::FullStore;
use crate::views::ViewManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedStore = Arc<dyn FullStore>;
pub type GuardedIdentityManager = Arc<IdentityManager>;
pub type GuardedVideoManager = Arc<VideoManager>;
pub type GuardedCommentManager = Arc<CommentManager>;
pub type GuardedTweetManager = Arc<TweetManager>;
pub type GuardedPlaylistManager = Arc<PlaylistManager>;
pub type GuardedViewManager = Arc<ViewManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub store: GuardedStore,
    pub identity: GuardedIdentityManager,
    pub videos: GuardedVideoManager,
    pub comments: GuardedCommentManager,
    pub tweets: GuardedTweetManager,
    pub playlists: GuardedPlaylistManager,
    pub views: GuardedViewManager,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}

impl FromRef<ServerState> for GuardedIdentityManager {
    fn from_ref(input: &ServerState) -> Self {
        input.identity.clone()
    }
}

impl FromRef<ServerState> for GuardedVideoManager {
    fn from_ref(input: &ServerState) -> Self {
        input.videos.clone()
    }
}

impl FromRef<ServerState> for GuardedCommentManager {
    fn from_ref(input: &ServerState) -> Self {
        input.comments.clone()
    }
}

impl FromRef<ServerState> for GuardedTweetManager {
    fn from_ref(input: &ServerState) -> Self {
        input.tweets.clone()
    }
}

impl FromRef<ServerState> for GuardedPlaylistManager {
    fn from_ref(input: &ServerState) -> Self {
        input.playlists.clone()
    }
}

impl FromRef<ServerState> for GuardedViewManager {
    fn from_ref(input: &ServerState) -> Self {
        input.views.clone()
    }
}
