//! Video, comment, tweet and playlist operations: validate, look up,
//! authorize, then mutate.

mod comment_manager;
mod playlist_manager;
mod tweet_manager;
mod video_manager;

pub use comment_manager::CommentManager;
pub use playlist_manager::{PlaylistManager, MAX_PLAYLIST_SIZE};
pub use tweet_manager::TweetManager;
pub use video_manager::{VideoManager, VideoUpload};
