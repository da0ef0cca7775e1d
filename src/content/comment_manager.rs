use std::sync::Arc;

use uuid::Uuid;

use crate::error::{required, ApiError, ApiResult};
use crate::social::{authorize, toggle, visible_video, LikeRelation, Toggled};
use crate::store::{Comment, CommentWithOwner, FullStore, Like, LikeTarget, Page};

pub struct CommentManager {
    store: Arc<dyn FullStore>,
}

impl CommentManager {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        CommentManager { store }
    }

    /// Newest first. A video without comments yields an empty page.
    pub fn list(
        &self,
        video_id: Uuid,
        viewer: Option<Uuid>,
        page: Page,
    ) -> ApiResult<Vec<CommentWithOwner>> {
        visible_video(self.store.get_video(video_id), viewer)?;
        Ok(self.store.list_video_comments(video_id, page)?)
    }

    pub fn add(&self, principal: Uuid, video_id: Uuid, content: &str) -> ApiResult<Comment> {
        let content = required("content", content)?;
        visible_video(self.store.get_video(video_id), Some(principal))?;
        Ok(self.store.insert_comment(principal, video_id, &content)?)
    }

    pub fn update(&self, principal: Uuid, comment_id: Uuid, content: &str) -> ApiResult<Comment> {
        let content = required("content", content)?;
        authorize(self.store.get_comment(comment_id), principal)?;
        self.store
            .update_comment(comment_id, &content)?
            .ok_or_else(|| ApiError::not_found("Comment"))
    }

    pub fn delete(&self, principal: Uuid, comment_id: Uuid) -> ApiResult<Comment> {
        let comment = authorize(self.store.get_comment(comment_id), principal)?;
        if !self.store.delete_comment(comment_id)? {
            return Err(ApiError::not_found("Comment"));
        }
        Ok(comment)
    }

    pub fn toggle_like(&self, principal: Uuid, comment_id: Uuid) -> ApiResult<Toggled<Like>> {
        toggle::<LikeRelation, _>(
            self.store.as_ref(),
            principal,
            LikeTarget::Comment(comment_id),
        )
    }
}
