use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::store::{Comment, Playlist, Tweet, Video};

/// A resource that only its owner may mutate.
pub trait Owned {
    const KIND: &'static str;

    fn owner_id(&self) -> Uuid;
}

impl Owned for Video {
    const KIND: &'static str = "Video";

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Comment {
    const KIND: &'static str = "Comment";

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Tweet {
    const KIND: &'static str = "Tweet";

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Playlist {
    const KIND: &'static str = "Playlist";

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

pub fn assert_owner<T: Owned>(resource: &T, principal: Uuid) -> ApiResult<()> {
    if resource.owner_id() != principal {
        return Err(ApiError::forbidden(format!(
            "You are not the owner of this {}",
            T::KIND.to_lowercase()
        )));
    }
    Ok(())
}

/// Resolves a store lookup and checks ownership. A missing resource is
/// reported as NotFound before ownership is ever compared.
pub fn authorize<T: Owned>(lookup: anyhow::Result<Option<T>>, principal: Uuid) -> ApiResult<T> {
    let resource = lookup?.ok_or_else(|| ApiError::not_found(T::KIND))?;
    assert_owner(&resource, principal)?;
    Ok(resource)
}

impl Video {
    /// Published videos are public; unpublished ones only exist for their owner.
    pub fn is_visible_to(&self, viewer: Option<Uuid>) -> bool {
        self.is_published || viewer == Some(self.owner_id)
    }
}

/// Resolves a video lookup for `viewer`. A video hidden from the viewer is
/// reported exactly like a missing one.
pub fn visible_video(lookup: anyhow::Result<Option<Video>>, viewer: Option<Uuid>) -> ApiResult<Video> {
    lookup?
        .filter(|video| video.is_visible_to(viewer))
        .ok_or_else(|| ApiError::not_found(Video::KIND))
}
