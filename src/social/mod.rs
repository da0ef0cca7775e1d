mod ownership;
mod toggle;

pub use ownership::{assert_owner, authorize, visible_video, Owned};
pub use toggle::{
    toggle, LikeRelation, Relation, SubscriptionRelation, ToggleState, Toggled,
    MAX_TOGGLE_ATTEMPTS,
};
