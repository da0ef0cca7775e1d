use crate::sqlite_column;
use crate::sqlite_persistence::{
    ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "user",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const VIDEO_FK: ForeignKey = ForeignKey {
    foreign_table: "video",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TWEET_FK: ForeignKey = ForeignKey {
    foreign_table: "tweet",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "playlist",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const USER_TABLE: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("username", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true),
        sqlite_column!("full_name", &SqlType::Text, non_null = true),
        sqlite_column!("avatar_url", &SqlType::Text),
        sqlite_column!("cover_image_url", &SqlType::Text),
        sqlite_column!("refresh_token", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["username"], &["email"]],
};

const USER_PASSWORD_CREDENTIALS_TABLE: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            is_primary_key = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

const VIDEO_TABLE: Table = Table {
    name: "video",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "owner_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text, non_null = true),
        sqlite_column!("video_url", &SqlType::Text, non_null = true),
        sqlite_column!("thumbnail_url", &SqlType::Text),
        sqlite_column!(
            "views",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "is_published",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_video_owner_id", "owner_id")],
    unique_constraints: &[],
};

const COMMENT_TABLE: Table = Table {
    name: "comment",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "owner_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "video_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&VIDEO_FK)
        ),
        sqlite_column!("content", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_comment_video_id", "video_id")],
    unique_constraints: &[],
};

const TWEET_TABLE: Table = Table {
    name: "tweet",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "owner_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("content", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_tweet_owner_id", "owner_id")],
    unique_constraints: &[],
};

/// Denormalized set of tweet ids owned by each user.
const USER_TWEET_TABLE: Table = Table {
    name: "user_tweet",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "tweet_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&TWEET_FK)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["user_id", "tweet_id"]],
};

/// Likes. `target_kind` discriminates video, comment and tweet targets, so
/// the target id has no foreign key and dependent rows are removed
/// explicitly when a target is deleted.
const CONTENT_LIKE_TABLE: Table = Table {
    name: "content_like",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("target_kind", &SqlType::Integer, non_null = true),
        sqlite_column!("target_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_content_like_target_id", "target_id")],
    unique_constraints: &[&["user_id", "target_kind", "target_id"]],
};

const SUBSCRIPTION_TABLE: Table = Table {
    name: "subscription",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "subscriber_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "channel_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_subscription_channel_id", "channel_id")],
    unique_constraints: &[&["subscriber_id", "channel_id"]],
};

const PLAYLIST_TABLE: Table = Table {
    name: "playlist",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "owner_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_playlist_owner_id", "owner_id")],
    unique_constraints: &[],
};

/// Playlist membership. The integer id gives the insertion order.
const PLAYLIST_VIDEO_TABLE: Table = Table {
    name: "playlist_video",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "playlist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PLAYLIST_FK)
        ),
        sqlite_column!(
            "video_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&VIDEO_FK)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["playlist_id", "video_id"]],
};

/// One row per (user, video); re-watching replaces the row so the integer
/// id always orders entries by recency.
const WATCH_HISTORY_TABLE: Table = Table {
    name: "watch_history",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "video_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&VIDEO_FK)
        ),
        sqlite_column!("watched_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["user_id", "video_id"]],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE,
        USER_PASSWORD_CREDENTIALS_TABLE,
        VIDEO_TABLE,
        COMMENT_TABLE,
        TWEET_TABLE,
        USER_TWEET_TABLE,
        CONTENT_LIKE_TABLE,
        SUBSCRIPTION_TABLE,
        PLAYLIST_TABLE,
        PLAYLIST_VIDEO_TABLE,
        WATCH_HISTORY_TABLE,
    ],
    migration: None,
}];
