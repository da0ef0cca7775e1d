use super::models::*;
use super::schema::VERSIONED_SCHEMAS;
use super::trait_def::*;
use crate::identity::CredentialHasher;
use crate::social::{LikeRelation, SubscriptionRelation};
use crate::sqlite_persistence::open_versioned_db;
use anyhow::{anyhow, Context, Result};
use rusqlite::{
    params, params_from_iter, types::Type, Connection, OptionalExtension, Row, ToSql,
};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.full_name, u.avatar_url, u.cover_image_url, u.created";
const VIDEO_COLUMNS: &str = "v.id, v.owner_id, v.title, v.description, v.video_url, v.thumbnail_url, v.views, v.is_published, v.created, v.updated";
/// Column count of VIDEO_COLUMNS, the offset of anything selected after it.
const VIDEO_COLUMNS_LEN: usize = 10;
const OWNER_COLUMNS: &str = "u.full_name, u.username, u.avatar_url";
const COMMENT_COLUMNS: &str = "c.id, c.owner_id, c.video_id, c.content, c.created, c.updated";
const TWEET_COLUMNS: &str = "t.id, t.owner_id, t.content, t.created, t.updated";

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), VERSIONED_SCHEMAS)?;
        info!("Store ready at {:?}", db_path.as_ref());
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Store connection mutex is poisoned"))
    }

    /// Makes every later `INSERT` or `UPDATE` on `table` abort, for exercising
    /// failure paths. The trigger is temporary and lives with this connection.
    #[cfg(test)]
    pub(crate) fn fail_writes_to(&self, table: &str) -> Result<()> {
        let conn = self.lock()?;
        for op in ["INSERT", "UPDATE"] {
            conn.execute_batch(&format!(
                "CREATE TEMP TRIGGER fail_{op}_{table} BEFORE {op} ON main.{table} BEGIN SELECT RAISE(ABORT, 'write rejected'); END;"
            ))?;
        }
        Ok(())
    }
}

fn uuid_at(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

/// Escapes LIKE wildcards so user input is matched literally.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        full_name: row.get(3)?,
        avatar_url: row.get(4)?,
        cover_image_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn user_summary_from_row(row: &Row) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        id: uuid_at(row, 0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        avatar_url: row.get(3)?,
    })
}

fn video_from_row(row: &Row) -> rusqlite::Result<Video> {
    Ok(Video {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        video_url: row.get(4)?,
        thumbnail_url: row.get(5)?,
        views: row.get::<_, i64>(6)? as u64,
        is_published: row.get::<_, i32>(7)? != 0,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn owner_from_row(row: &Row, offset: usize) -> rusqlite::Result<OwnerProjection> {
    Ok(OwnerProjection {
        full_name: row.get(offset)?,
        username: row.get(offset + 1)?,
        avatar_url: row.get(offset + 2)?,
    })
}

fn video_with_owner_from_row(row: &Row) -> rusqlite::Result<VideoWithOwner> {
    Ok(VideoWithOwner {
        video: video_from_row(row)?,
        owner: owner_from_row(row, VIDEO_COLUMNS_LEN)?,
    })
}

fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        video_id: uuid_at(row, 2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn tweet_from_row(row: &Row) -> rusqlite::Result<Tweet> {
    Ok(Tweet {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn select_user(conn: &Connection, user_id: Uuid) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM user u WHERE u.id = ?1"),
            params![user_id.to_string()],
            user_from_row,
        )
        .optional()?)
}

fn select_video(conn: &Connection, video_id: Uuid) -> Result<Option<Video>> {
    Ok(conn
        .query_row(
            &format!("SELECT {VIDEO_COLUMNS} FROM video v WHERE v.id = ?1"),
            params![video_id.to_string()],
            video_from_row,
        )
        .optional()?)
}

fn select_comment(conn: &Connection, comment_id: Uuid) -> Result<Option<Comment>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comment c WHERE c.id = ?1"),
            params![comment_id.to_string()],
            comment_from_row,
        )
        .optional()?)
}

fn select_tweet(conn: &Connection, tweet_id: Uuid) -> Result<Option<Tweet>> {
    Ok(conn
        .query_row(
            &format!("SELECT {TWEET_COLUMNS} FROM tweet t WHERE t.id = ?1"),
            params![tweet_id.to_string()],
            tweet_from_row,
        )
        .optional()?)
}

fn select_playlist(conn: &Connection, playlist_id: Uuid) -> Result<Option<Playlist>> {
    let playlist = conn
        .query_row(
            "SELECT id, owner_id, name, description, created, updated FROM playlist WHERE id = ?1",
            params![playlist_id.to_string()],
            |row| {
                Ok(Playlist {
                    id: uuid_at(row, 0)?,
                    owner_id: uuid_at(row, 1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    videos: vec![],
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()?;

    let Some(mut playlist) = playlist else {
        return Ok(None);
    };
    let mut stmt =
        conn.prepare("SELECT video_id FROM playlist_video WHERE playlist_id = ?1 ORDER BY id")?;
    playlist.videos = stmt
        .query_map(params![playlist_id.to_string()], |row| uuid_at(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Some(playlist))
}

fn exists(conn: &Connection, sql: &str, id: Uuid) -> Result<bool> {
    Ok(conn
        .query_row(sql, params![id.to_string()], |_| Ok(()))
        .optional()?
        .is_some())
}

/// Like `exists`, with the viewer bound as `?2` for visibility filters.
fn exists_visible(conn: &Connection, sql: &str, id: Uuid, viewer: Uuid) -> Result<bool> {
    Ok(conn
        .query_row(sql, params![id.to_string(), viewer.to_string()], |_| Ok(()))
        .optional()?
        .is_some())
}

fn count(conn: &Connection, sql: &str, id: Uuid) -> Result<u64> {
    let value: i64 = conn.query_row(sql, params![id.to_string()], |row| row.get(0))?;
    Ok(value as u64)
}

impl UserStore for SqliteStore {
    fn create_user(
        &self,
        new_user: NewUser,
        hasher: CredentialHasher,
        salt: String,
        hash: String,
    ) -> Result<Insertion<User>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            full_name: new_user.full_name,
            avatar_url: None,
            cover_image_url: None,
            created_at: now(),
        };

        let inserted = tx.execute(
            "INSERT INTO user (id, username, email, full_name, created) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                &user.username,
                &user.email,
                &user.full_name,
                user.created_at
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => return Ok(Insertion::Duplicate),
            Err(err) => return Err(err.into()),
        }

        tx.execute(
            "INSERT INTO user_password_credentials (user_id, salt, hash, hasher, created) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.id.to_string(), salt, hash, hasher.to_string(), user.created_at],
        )?;
        tx.commit()?;
        debug!("Created user {} ({})", user.username, user.id);
        Ok(Insertion::Inserted(user))
    }

    fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let conn = self.lock()?;
        select_user(&conn, user_id)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM user u WHERE u.username = ?1"),
                params![username.to_lowercase()],
                user_from_row,
            )
            .optional()?)
    }

    fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM user u WHERE u.username = ?1 OR u.email = ?1"),
                params![login.to_lowercase()],
                user_from_row,
            )
            .optional()?)
    }

    fn is_username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT 1 FROM user WHERE username = ?1 OR email = ?2",
                params![username, email],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    fn update_user_details(
        &self,
        user_id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Insertion<Option<User>>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if let Some(full_name) = full_name {
            tx.execute(
                "UPDATE user SET full_name = ?1 WHERE id = ?2",
                params![full_name, user_id.to_string()],
            )?;
        }
        if let Some(email) = email {
            match tx.execute(
                "UPDATE user SET email = ?1 WHERE id = ?2",
                params![email, user_id.to_string()],
            ) {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => return Ok(Insertion::Duplicate),
                Err(err) => return Err(err.into()),
            }
        }
        let user = select_user(&tx, user_id)?;
        tx.commit()?;
        Ok(Insertion::Inserted(user))
    }

    fn set_user_image(
        &self,
        user_id: Uuid,
        slot: ProfileImage,
        url: &str,
    ) -> Result<Option<String>> {
        let column = match slot {
            ProfileImage::Avatar => "avatar_url",
            ProfileImage::Cover => "cover_image_url",
        };
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let previous: Option<String> = tx
            .query_row(
                &format!("SELECT {column} FROM user WHERE id = ?1"),
                params![user_id.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        tx.execute(
            &format!("UPDATE user SET {column} = ?1 WHERE id = ?2"),
            params![url, user_id.to_string()],
        )?;
        tx.commit()?;
        Ok(previous)
    }

    fn get_password_credentials(&self, user_id: Uuid) -> Result<Option<PasswordCredentials>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT salt, hash, hasher, created, last_used FROM user_password_credentials WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(salt, hash, hasher, created_at, last_used)| {
            Ok(PasswordCredentials {
                user_id,
                salt,
                hash,
                hasher: CredentialHasher::from_str(&hasher)?,
                created_at,
                last_used,
            })
        })
        .transpose()
    }

    fn update_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO user_password_credentials (user_id, salt, hash, hasher, created, last_used) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                credentials.user_id.to_string(),
                &credentials.salt,
                &credentials.hash,
                credentials.hasher.to_string(),
                credentials.created_at,
                credentials.last_used
            ],
        )?;
        Ok(())
    }

    fn touch_password_credentials(&self, user_id: Uuid) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE user_password_credentials SET last_used = ?1 WHERE user_id = ?2",
            params![now(), user_id.to_string()],
        )?;
        Ok(())
    }

    fn get_refresh_token(&self, user_id: Uuid) -> Result<Option<String>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT refresh_token FROM user WHERE id = ?1",
                params![user_id.to_string()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten())
    }

    fn set_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE user SET refresh_token = ?1 WHERE id = ?2",
            params![token, user_id.to_string()],
        )?;
        Ok(())
    }

    fn swap_refresh_token(&self, user_id: Uuid, expected: &str, replacement: &str) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE user SET refresh_token = ?1 WHERE id = ?2 AND refresh_token = ?3",
            params![replacement, user_id.to_string(), expected],
        )?;
        Ok(changed == 1)
    }

    fn get_user_tweet_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT tweet_id FROM user_tweet WHERE user_id = ?1 ORDER BY rowid")?;
        let ids = stmt
            .query_map(params![user_id.to_string()], |row| uuid_at(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }
}

impl VideoStore for SqliteStore {
    fn insert_video(&self, video: NewVideo) -> Result<Video> {
        let conn = self.lock()?;
        let created_at = now();
        let video = Video {
            id: Uuid::new_v4(),
            owner_id: video.owner_id,
            title: video.title,
            description: video.description,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            views: 0,
            is_published: true,
            created_at,
            updated_at: created_at,
        };
        conn.execute(
            "INSERT INTO video (id, owner_id, title, description, video_url, thumbnail_url, views, is_published, created, updated) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 1, ?7, ?7)",
            params![
                video.id.to_string(),
                video.owner_id.to_string(),
                &video.title,
                &video.description,
                &video.video_url,
                &video.thumbnail_url,
                created_at
            ],
        )
        .context("Failed to insert video")?;
        Ok(video)
    }

    fn get_video(&self, video_id: Uuid) -> Result<Option<Video>> {
        let conn = self.lock()?;
        select_video(&conn, video_id)
    }

    fn list_videos(&self, query: &VideoQuery) -> Result<Vec<VideoWithOwner>> {
        let mut sql = format!(
            "SELECT {VIDEO_COLUMNS}, {OWNER_COLUMNS} FROM video v JOIN user u ON u.id = v.owner_id WHERE v.is_published = 1"
        );
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(title) = &query.title_contains {
            values.push(Box::new(format!("%{}%", escape_like(title))));
            sql.push_str(&format!(" AND v.title LIKE ?{} ESCAPE '\\'", values.len()));
        }
        if let Some(owner_id) = query.owner_id {
            values.push(Box::new(owner_id.to_string()));
            sql.push_str(&format!(" AND v.owner_id = ?{}", values.len()));
        }
        let order_column = match query.sort_by {
            VideoSortField::CreatedAt => "v.created",
            VideoSortField::Views => "v.views",
            VideoSortField::Title => "v.title COLLATE NOCASE",
        };
        let direction = match query.sort_direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        sql.push_str(&format!(
            " ORDER BY {order_column} {direction}, v.rowid {direction} LIMIT {} OFFSET {}",
            query.page.limit,
            query.page.offset()
        ));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let videos = stmt
            .query_map(params_from_iter(values.iter()), video_with_owner_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(videos)
    }

    fn update_video(&self, video_id: Uuid, changes: &VideoChanges) -> Result<Option<Video>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = video_id.to_string();
        if let Some(title) = &changes.title {
            tx.execute("UPDATE video SET title = ?1 WHERE id = ?2", params![title, &id])?;
        }
        if let Some(description) = &changes.description {
            tx.execute(
                "UPDATE video SET description = ?1 WHERE id = ?2",
                params![description, &id],
            )?;
        }
        if let Some(thumbnail_url) = &changes.thumbnail_url {
            tx.execute(
                "UPDATE video SET thumbnail_url = ?1 WHERE id = ?2",
                params![thumbnail_url, &id],
            )?;
        }
        tx.execute(
            "UPDATE video SET updated = ?1 WHERE id = ?2",
            params![now(), &id],
        )?;
        let video = select_video(&tx, video_id)?;
        tx.commit()?;
        Ok(video)
    }

    fn set_video_published(&self, video_id: Uuid, published: bool) -> Result<Option<Video>> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE video SET is_published = ?1, updated = ?2 WHERE id = ?3",
            params![published as i32, now(), video_id.to_string()],
        )?;
        select_video(&conn, video_id)
    }

    fn delete_video(&self, video_id: Uuid) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = video_id.to_string();
        tx.execute(
            "DELETE FROM content_like WHERE (target_kind = ?1 AND target_id = ?3) OR (target_kind = ?2 AND target_id IN (SELECT id FROM comment WHERE video_id = ?3))",
            params![VIDEO_LIKE_KIND, COMMENT_LIKE_KIND, &id],
        )?;
        // Comments, playlist entries and history rows go through ON DELETE CASCADE.
        let deleted = tx.execute("DELETE FROM video WHERE id = ?1", params![&id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn record_view(&self, video_id: Uuid, viewer: Option<Uuid>) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE video SET views = views + 1 WHERE id = ?1",
            params![video_id.to_string()],
        )?;
        if let Some(viewer) = viewer {
            tx.execute(
                "DELETE FROM watch_history WHERE user_id = ?1 AND video_id = ?2",
                params![viewer.to_string(), video_id.to_string()],
            )?;
            tx.execute(
                "INSERT INTO watch_history (user_id, video_id, watched_at) VALUES (?1, ?2, ?3)",
                params![viewer.to_string(), video_id.to_string(), now()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl CommentStore for SqliteStore {
    fn insert_comment(&self, owner_id: Uuid, video_id: Uuid, content: &str) -> Result<Comment> {
        let conn = self.lock()?;
        let created_at = now();
        let comment = Comment {
            id: Uuid::new_v4(),
            owner_id,
            video_id,
            content: content.to_string(),
            created_at,
            updated_at: created_at,
        };
        conn.execute(
            "INSERT INTO comment (id, owner_id, video_id, content, created, updated) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                comment.id.to_string(),
                owner_id.to_string(),
                video_id.to_string(),
                content,
                created_at
            ],
        )?;
        Ok(comment)
    }

    fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let conn = self.lock()?;
        select_comment(&conn, comment_id)
    }

    fn list_video_comments(&self, video_id: Uuid, page: Page) -> Result<Vec<CommentWithOwner>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS}, {OWNER_COLUMNS} FROM comment c JOIN user u ON u.id = c.owner_id WHERE c.video_id = ?1 ORDER BY c.created DESC, c.rowid DESC LIMIT ?2 OFFSET ?3"
        ))?;
        let comments = stmt
            .query_map(
                params![video_id.to_string(), page.limit, page.offset() as i64],
                |row| {
                    Ok(CommentWithOwner {
                        comment: comment_from_row(row)?,
                        owner: owner_from_row(row, 6)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    fn update_comment(&self, comment_id: Uuid, content: &str) -> Result<Option<Comment>> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE comment SET content = ?1, updated = ?2 WHERE id = ?3",
            params![content, now(), comment_id.to_string()],
        )?;
        select_comment(&conn, comment_id)
    }

    fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM content_like WHERE target_kind = ?1 AND target_id = ?2",
            params![COMMENT_LIKE_KIND, comment_id.to_string()],
        )?;
        let deleted = tx.execute(
            "DELETE FROM comment WHERE id = ?1",
            params![comment_id.to_string()],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }
}

impl TweetStore for SqliteStore {
    fn insert_tweet(&self, owner_id: Uuid, content: &str) -> Result<Tweet> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let created_at = now();
        let tweet = Tweet {
            id: Uuid::new_v4(),
            owner_id,
            content: content.to_string(),
            created_at,
            updated_at: created_at,
        };
        tx.execute(
            "INSERT INTO tweet (id, owner_id, content, created, updated) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![tweet.id.to_string(), owner_id.to_string(), content, created_at],
        )?;
        tx.execute(
            "INSERT INTO user_tweet (user_id, tweet_id) VALUES (?1, ?2)",
            params![owner_id.to_string(), tweet.id.to_string()],
        )?;
        tx.commit()?;
        Ok(tweet)
    }

    fn get_tweet(&self, tweet_id: Uuid) -> Result<Option<Tweet>> {
        let conn = self.lock()?;
        select_tweet(&conn, tweet_id)
    }

    fn list_user_tweets(&self, owner_id: Uuid) -> Result<Vec<Tweet>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TWEET_COLUMNS} FROM tweet t WHERE t.owner_id = ?1 ORDER BY t.created DESC, t.rowid DESC"
        ))?;
        let tweets = stmt
            .query_map(params![owner_id.to_string()], tweet_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tweets)
    }

    fn update_tweet(&self, tweet_id: Uuid, content: &str) -> Result<Option<Tweet>> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE tweet SET content = ?1, updated = ?2 WHERE id = ?3",
            params![content, now(), tweet_id.to_string()],
        )?;
        select_tweet(&conn, tweet_id)
    }

    fn delete_tweet(&self, tweet_id: Uuid) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = tweet_id.to_string();
        tx.execute(
            "DELETE FROM content_like WHERE target_kind = ?1 AND target_id = ?2",
            params![TWEET_LIKE_KIND, &id],
        )?;
        tx.execute("DELETE FROM user_tweet WHERE tweet_id = ?1", params![&id])?;
        let deleted = tx.execute("DELETE FROM tweet WHERE id = ?1", params![&id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }
}

impl PlaylistStore for SqliteStore {
    fn insert_playlist(&self, owner_id: Uuid, name: &str, description: &str) -> Result<Playlist> {
        let conn = self.lock()?;
        let created_at = now();
        let playlist = Playlist {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            description: description.to_string(),
            videos: vec![],
            created_at,
            updated_at: created_at,
        };
        conn.execute(
            "INSERT INTO playlist (id, owner_id, name, description, created, updated) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                playlist.id.to_string(),
                owner_id.to_string(),
                name,
                description,
                created_at
            ],
        )?;
        Ok(playlist)
    }

    fn get_playlist(&self, playlist_id: Uuid) -> Result<Option<Playlist>> {
        let conn = self.lock()?;
        select_playlist(&conn, playlist_id)
    }

    fn list_user_playlists(&self, owner_id: Uuid) -> Result<Vec<Playlist>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM playlist WHERE owner_id = ?1 ORDER BY created DESC, rowid DESC",
        )?;
        let ids = stmt
            .query_map(params![owner_id.to_string()], |row| uuid_at(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut playlists = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(playlist) = select_playlist(&conn, id)? {
                playlists.push(playlist);
            }
        }
        Ok(playlists)
    }

    fn update_playlist(
        &self,
        playlist_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Playlist>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = playlist_id.to_string();
        if let Some(name) = name {
            tx.execute("UPDATE playlist SET name = ?1 WHERE id = ?2", params![name, &id])?;
        }
        if let Some(description) = description {
            tx.execute(
                "UPDATE playlist SET description = ?1 WHERE id = ?2",
                params![description, &id],
            )?;
        }
        tx.execute(
            "UPDATE playlist SET updated = ?1 WHERE id = ?2",
            params![now(), &id],
        )?;
        let playlist = select_playlist(&tx, playlist_id)?;
        tx.commit()?;
        Ok(playlist)
    }

    fn delete_playlist(&self, playlist_id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM playlist WHERE id = ?1",
            params![playlist_id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    fn add_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<Insertion<()>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT INTO playlist_video (playlist_id, video_id) VALUES (?1, ?2)",
            params![playlist_id.to_string(), video_id.to_string()],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => return Ok(Insertion::Duplicate),
            Err(err) => return Err(err.into()),
        }
        tx.execute(
            "UPDATE playlist SET updated = ?1 WHERE id = ?2",
            params![now(), playlist_id.to_string()],
        )?;
        tx.commit()?;
        Ok(Insertion::Inserted(()))
    }

    fn remove_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM playlist_video WHERE playlist_id = ?1 AND video_id = ?2",
            params![playlist_id.to_string(), video_id.to_string()],
        )?;
        if removed > 0 {
            tx.execute(
                "UPDATE playlist SET updated = ?1 WHERE id = ?2",
                params![now(), playlist_id.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }
}

impl RelationStore<LikeRelation> for SqliteStore {
    fn relation_object_exists(&self, subject: Uuid, object: &LikeTarget) -> Result<bool> {
        let conn = self.lock()?;
        match object {
            LikeTarget::Video(id) => exists_visible(
                &conn,
                "SELECT 1 FROM video WHERE id = ?1 AND (is_published = 1 OR owner_id = ?2)",
                *id,
                subject,
            ),
            LikeTarget::Comment(id) => exists_visible(
                &conn,
                "SELECT 1 FROM comment c JOIN video v ON v.id = c.video_id WHERE c.id = ?1 AND (v.is_published = 1 OR v.owner_id = ?2)",
                *id,
                subject,
            ),
            LikeTarget::Tweet(id) => exists(&conn, "SELECT 1 FROM tweet WHERE id = ?1", *id),
        }
    }

    fn find_relation(&self, subject: Uuid, object: &LikeTarget) -> Result<Option<Like>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT id, created FROM content_like WHERE user_id = ?1 AND target_kind = ?2 AND target_id = ?3",
                params![subject.to_string(), object.kind_to_int(), object.id().to_string()],
                |row| {
                    Ok(Like {
                        id: uuid_at(row, 0)?,
                        user_id: subject,
                        target: *object,
                        created_at: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn insert_relation(&self, subject: Uuid, object: &LikeTarget) -> Result<Insertion<Like>> {
        let conn = self.lock()?;
        let like = Like {
            id: Uuid::new_v4(),
            user_id: subject,
            target: *object,
            created_at: now(),
        };
        let inserted = conn.execute(
            "INSERT INTO content_like (id, user_id, target_kind, target_id, created) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                like.id.to_string(),
                subject.to_string(),
                object.kind_to_int(),
                object.id().to_string(),
                like.created_at
            ],
        );
        match inserted {
            Ok(_) => Ok(Insertion::Inserted(like)),
            Err(err) if is_unique_violation(&err) => Ok(Insertion::Duplicate),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_relation(&self, subject: Uuid, object: &LikeTarget) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM content_like WHERE user_id = ?1 AND target_kind = ?2 AND target_id = ?3",
            params![subject.to_string(), object.kind_to_int(), object.id().to_string()],
        )?;
        Ok(deleted > 0)
    }
}

impl RelationStore<SubscriptionRelation> for SqliteStore {
    fn relation_object_exists(&self, _subscriber_id: Uuid, channel_id: &Uuid) -> Result<bool> {
        let conn = self.lock()?;
        exists(&conn, "SELECT 1 FROM user WHERE id = ?1", *channel_id)
    }

    fn find_relation(&self, subscriber_id: Uuid, channel_id: &Uuid) -> Result<Option<Subscription>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT id, created FROM subscription WHERE subscriber_id = ?1 AND channel_id = ?2",
                params![subscriber_id.to_string(), channel_id.to_string()],
                |row| {
                    Ok(Subscription {
                        id: uuid_at(row, 0)?,
                        subscriber_id,
                        channel_id: *channel_id,
                        created_at: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn insert_relation(
        &self,
        subscriber_id: Uuid,
        channel_id: &Uuid,
    ) -> Result<Insertion<Subscription>> {
        let conn = self.lock()?;
        let subscription = Subscription {
            id: Uuid::new_v4(),
            subscriber_id,
            channel_id: *channel_id,
            created_at: now(),
        };
        let inserted = conn.execute(
            "INSERT INTO subscription (id, subscriber_id, channel_id, created) VALUES (?1, ?2, ?3, ?4)",
            params![
                subscription.id.to_string(),
                subscriber_id.to_string(),
                channel_id.to_string(),
                subscription.created_at
            ],
        );
        match inserted {
            Ok(_) => Ok(Insertion::Inserted(subscription)),
            Err(err) if is_unique_violation(&err) => Ok(Insertion::Duplicate),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_relation(&self, subscriber_id: Uuid, channel_id: &Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM subscription WHERE subscriber_id = ?1 AND channel_id = ?2",
            params![subscriber_id.to_string(), channel_id.to_string()],
        )?;
        Ok(deleted > 0)
    }
}

impl ViewStore for SqliteStore {
    fn channel_stats(&self, channel_id: Uuid) -> Result<ChannelStats> {
        let conn = self.lock()?;
        let (total_videos, total_views): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(views), 0) FROM video WHERE owner_id = ?1",
            params![channel_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let total_subscribers = count(
            &conn,
            "SELECT COUNT(*) FROM subscription WHERE channel_id = ?1",
            channel_id,
        )?;
        let total_likes: i64 = conn.query_row(
            "SELECT COUNT(*) FROM content_like l JOIN video v ON l.target_id = v.id WHERE l.target_kind = ?1 AND v.owner_id = ?2",
            params![VIDEO_LIKE_KIND, channel_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(ChannelStats {
            channel_id,
            total_views: total_views as u64,
            total_subscribers,
            total_videos: total_videos as u64,
            total_likes: total_likes as u64,
        })
    }

    fn count_subscribers(&self, channel_id: Uuid) -> Result<u64> {
        let conn = self.lock()?;
        count(
            &conn,
            "SELECT COUNT(*) FROM subscription WHERE channel_id = ?1",
            channel_id,
        )
    }

    fn count_subscriptions(&self, subscriber_id: Uuid) -> Result<u64> {
        let conn = self.lock()?;
        count(
            &conn,
            "SELECT COUNT(*) FROM subscription WHERE subscriber_id = ?1",
            subscriber_id,
        )
    }

    fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT 1 FROM subscription WHERE subscriber_id = ?1 AND channel_id = ?2",
                params![subscriber_id.to_string(), channel_id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    fn list_subscribers(&self, channel_id: Uuid) -> Result<Vec<UserSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.full_name, u.avatar_url FROM subscription s JOIN user u ON u.id = s.subscriber_id WHERE s.channel_id = ?1 ORDER BY s.created DESC, s.rowid DESC",
        )?;
        let users = stmt
            .query_map(params![channel_id.to_string()], user_summary_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    fn list_subscriptions(&self, subscriber_id: Uuid) -> Result<Vec<UserSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.full_name, u.avatar_url FROM subscription s JOIN user u ON u.id = s.channel_id WHERE s.subscriber_id = ?1 ORDER BY s.created DESC, s.rowid DESC",
        )?;
        let users = stmt
            .query_map(params![subscriber_id.to_string()], user_summary_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    fn watch_history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {VIDEO_COLUMNS}, {OWNER_COLUMNS}, h.watched_at FROM watch_history h JOIN video v ON v.id = h.video_id JOIN user u ON u.id = v.owner_id WHERE h.user_id = ?1 AND (v.is_published = 1 OR v.owner_id = ?1) ORDER BY h.id DESC"
        ))?;
        let entries = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(HistoryEntry {
                    video: video_from_row(row)?,
                    owner: owner_from_row(row, VIDEO_COLUMNS_LEN)?,
                    watched_at: row.get(VIDEO_COLUMNS_LEN + 3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn liked_videos(&self, user_id: Uuid) -> Result<Vec<VideoWithOwner>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {VIDEO_COLUMNS}, {OWNER_COLUMNS} FROM content_like l JOIN video v ON v.id = l.target_id JOIN user u ON u.id = v.owner_id WHERE l.user_id = ?1 AND l.target_kind = ?2 AND (v.is_published = 1 OR v.owner_id = ?1) ORDER BY l.created DESC, l.rowid DESC"
        ))?;
        let videos = stmt
            .query_map(
                params![user_id.to_string(), VIDEO_LIKE_KIND],
                video_with_owner_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(videos)
    }

    fn channel_videos(
        &self,
        channel_id: Uuid,
        include_unpublished: bool,
    ) -> Result<Vec<VideoWithOwner>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {VIDEO_COLUMNS}, {OWNER_COLUMNS} FROM video v JOIN user u ON u.id = v.owner_id WHERE v.owner_id = ?1 AND (v.is_published = 1 OR ?2) ORDER BY v.created DESC, v.rowid DESC"
        ))?;
        let videos = stmt
            .query_map(
                params![channel_id.to_string(), include_unpublished],
                video_with_owner_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(videos)
    }
}
