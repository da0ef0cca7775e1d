mod models;
mod schema;
mod sqlite_store;
mod trait_def;

pub use models::*;
pub use sqlite_store::SqliteStore;
pub use trait_def::{
    CommentStore, FullStore, PlaylistStore, RelationStore, TweetStore, UserStore, VideoStore,
    ViewStore,
};
