use std::sync::Arc;

use uuid::Uuid;

use crate::error::{required, ApiError, ApiResult};
use crate::social::{authorize, toggle, LikeRelation, Toggled};
use crate::store::{FullStore, Like, LikeTarget, Tweet};

pub struct TweetManager {
    store: Arc<dyn FullStore>,
}

impl TweetManager {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        TweetManager { store }
    }

    pub fn create(&self, principal: Uuid, content: &str) -> ApiResult<Tweet> {
        let content = required("content", content)?;
        Ok(self.store.insert_tweet(principal, &content)?)
    }

    pub fn list_for_user(&self, user_id: Uuid) -> ApiResult<Vec<Tweet>> {
        if self.store.get_user(user_id)?.is_none() {
            return Err(ApiError::not_found("User"));
        }
        Ok(self.store.list_user_tweets(user_id)?)
    }

    pub fn update(&self, principal: Uuid, tweet_id: Uuid, content: &str) -> ApiResult<Tweet> {
        let content = required("content", content)?;
        authorize(self.store.get_tweet(tweet_id), principal)?;
        self.store
            .update_tweet(tweet_id, &content)?
            .ok_or_else(|| ApiError::not_found("Tweet"))
    }

    pub fn delete(&self, principal: Uuid, tweet_id: Uuid) -> ApiResult<Tweet> {
        let tweet = authorize(self.store.get_tweet(tweet_id), principal)?;
        if !self.store.delete_tweet(tweet_id)? {
            return Err(ApiError::not_found("Tweet"));
        }
        Ok(tweet)
    }

    pub fn toggle_like(&self, principal: Uuid, tweet_id: Uuid) -> ApiResult<Toggled<Like>> {
        toggle::<LikeRelation, _>(self.store.as_ref(), principal, LikeTarget::Tweet(tweet_id))
    }
}
