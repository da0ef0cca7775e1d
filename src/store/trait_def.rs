use super::models::*;
use crate::identity::CredentialHasher;
use crate::social::{LikeRelation, Relation, SubscriptionRelation};
use anyhow::Result;
use uuid::Uuid;

pub trait UserStore: Send + Sync {
    /// Creates a user together with its password credentials.
    /// Returns Insertion::Duplicate if the username or email is taken.
    fn create_user(
        &self,
        new_user: NewUser,
        hasher: CredentialHasher,
        salt: String,
        hash: String,
    ) -> Result<Insertion<User>>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Returns Ok(None) if no user has that (lowercased) username.
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Looks a user up by username or by email.
    fn find_user_by_login(&self, login: &str) -> Result<Option<User>>;

    fn is_username_or_email_taken(&self, username: &str, email: &str) -> Result<bool>;

    /// Updates full name and/or email. Returns Insertion::Duplicate if the
    /// new email belongs to another user, Ok(Inserted(None)) if the user is gone.
    fn update_user_details(
        &self,
        user_id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Insertion<Option<User>>>;

    /// Sets the avatar or cover url and returns the previous one.
    fn set_user_image(&self, user_id: Uuid, slot: ProfileImage, url: &str)
        -> Result<Option<String>>;

    fn get_password_credentials(&self, user_id: Uuid) -> Result<Option<PasswordCredentials>>;

    fn update_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()>;

    fn touch_password_credentials(&self, user_id: Uuid) -> Result<()>;

    fn get_refresh_token(&self, user_id: Uuid) -> Result<Option<String>>;

    /// Overwrites (or clears, with None) the single refresh token slot.
    fn set_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<()>;

    /// Replaces the stored refresh token only if it still equals `expected`.
    /// Returns false when the slot held anything else.
    fn swap_refresh_token(&self, user_id: Uuid, expected: &str, replacement: &str)
        -> Result<bool>;

    /// Owned tweet ids, kept in lockstep with tweet creation and deletion.
    fn get_user_tweet_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;
}

pub trait VideoStore: Send + Sync {
    fn insert_video(&self, video: NewVideo) -> Result<Video>;

    /// Returns Ok(None) if the video does not exist.
    fn get_video(&self, video_id: Uuid) -> Result<Option<Video>>;

    /// Published videos only, filtered, sorted and paginated.
    fn list_videos(&self, query: &VideoQuery) -> Result<Vec<VideoWithOwner>>;

    /// Returns Ok(None) if the video does not exist.
    fn update_video(&self, video_id: Uuid, changes: &VideoChanges) -> Result<Option<Video>>;

    fn set_video_published(&self, video_id: Uuid, published: bool) -> Result<Option<Video>>;

    /// Deletes the video along with its comments, likes, playlist entries
    /// and history entries. Returns false if nothing was deleted.
    fn delete_video(&self, video_id: Uuid) -> Result<bool>;

    /// Increments the view count and, for a known viewer, moves the video to
    /// the front of their watch history.
    fn record_view(&self, video_id: Uuid, viewer: Option<Uuid>) -> Result<()>;
}

pub trait CommentStore: Send + Sync {
    fn insert_comment(&self, owner_id: Uuid, video_id: Uuid, content: &str) -> Result<Comment>;

    fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>>;

    /// Newest first.
    fn list_video_comments(&self, video_id: Uuid, page: Page) -> Result<Vec<CommentWithOwner>>;

    fn update_comment(&self, comment_id: Uuid, content: &str) -> Result<Option<Comment>>;

    /// Deletes the comment and the likes targeting it.
    fn delete_comment(&self, comment_id: Uuid) -> Result<bool>;
}

pub trait TweetStore: Send + Sync {
    /// Inserts the tweet and the owner's back-reference in one transaction.
    fn insert_tweet(&self, owner_id: Uuid, content: &str) -> Result<Tweet>;

    fn get_tweet(&self, tweet_id: Uuid) -> Result<Option<Tweet>>;

    /// Newest first.
    fn list_user_tweets(&self, owner_id: Uuid) -> Result<Vec<Tweet>>;

    fn update_tweet(&self, tweet_id: Uuid, content: &str) -> Result<Option<Tweet>>;

    /// Deletes the tweet, the owner's back-reference and the likes targeting it.
    fn delete_tweet(&self, tweet_id: Uuid) -> Result<bool>;
}

pub trait PlaylistStore: Send + Sync {
    fn insert_playlist(&self, owner_id: Uuid, name: &str, description: &str) -> Result<Playlist>;

    fn get_playlist(&self, playlist_id: Uuid) -> Result<Option<Playlist>>;

    fn list_user_playlists(&self, owner_id: Uuid) -> Result<Vec<Playlist>>;

    fn update_playlist(
        &self,
        playlist_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Playlist>>;

    fn delete_playlist(&self, playlist_id: Uuid) -> Result<bool>;

    /// Appends the video. Returns Insertion::Duplicate if it is already there.
    fn add_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<Insertion<()>>;

    fn remove_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<bool>;
}

/// Storage for a toggleable relation between a subject user and an object.
///
/// Implementations must enforce at most one record per (subject, object).
pub trait RelationStore<R: Relation>: Send + Sync {
    /// Whether `object` exists and is visible to `subject`.
    fn relation_object_exists(&self, subject: Uuid, object: &R::Object) -> Result<bool>;

    fn find_relation(&self, subject: Uuid, object: &R::Object) -> Result<Option<R::Record>>;

    /// Returns Insertion::Duplicate if the pair already exists.
    fn insert_relation(&self, subject: Uuid, object: &R::Object) -> Result<Insertion<R::Record>>;

    /// Returns false if the pair did not exist.
    fn delete_relation(&self, subject: Uuid, object: &R::Object) -> Result<bool>;
}

/// Read-only aggregation queries.
pub trait ViewStore: Send + Sync {
    fn channel_stats(&self, channel_id: Uuid) -> Result<ChannelStats>;

    fn count_subscribers(&self, channel_id: Uuid) -> Result<u64>;

    fn count_subscriptions(&self, subscriber_id: Uuid) -> Result<u64>;

    fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool>;

    fn list_subscribers(&self, channel_id: Uuid) -> Result<Vec<UserSummary>>;

    fn list_subscriptions(&self, subscriber_id: Uuid) -> Result<Vec<UserSummary>>;

    /// Most recently watched first.
    fn watch_history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>>;

    /// Most recently liked first.
    fn liked_videos(&self, user_id: Uuid) -> Result<Vec<VideoWithOwner>>;

    /// All of the channel's videos, newest first. Unpublished ones are
    /// included only when `include_unpublished` is set.
    fn channel_videos(&self, channel_id: Uuid, include_unpublished: bool)
        -> Result<Vec<VideoWithOwner>>;
}

pub trait FullStore:
    UserStore
    + VideoStore
    + CommentStore
    + TweetStore
    + PlaylistStore
    + RelationStore<LikeRelation>
    + RelationStore<SubscriptionRelation>
    + ViewStore
{
}

impl<T> FullStore for T where
    T: UserStore
        + VideoStore
        + CommentStore
        + TweetStore
        + PlaylistStore
        + RelationStore<LikeRelation>
        + RelationStore<SubscriptionRelation>
        + ViewStore
{
}
