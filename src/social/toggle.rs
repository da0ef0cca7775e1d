//! Generic create-or-remove for set-like relations between a user and an
//! object.

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::server::metrics::record_toggle;
use crate::store::{Insertion, Like, LikeTarget, RelationStore, Subscription};

/// Upper bound on find/mutate rounds lost to concurrent toggles of the same pair.
pub const MAX_TOGGLE_ATTEMPTS: usize = 8;

/// A relation kind the toggle engine can flip.
pub trait Relation: 'static {
    type Object: Copy + Debug + Send + Sync;
    type Record: Clone + Debug + Serialize + Send;

    /// Relation name used in logs and metrics.
    const NAME: &'static str;

    /// Resource name reported when the object does not exist.
    fn object_name(object: &Self::Object) -> &'static str;

    fn check_pair(_subject: Uuid, _object: &Self::Object) -> ApiResult<()> {
        Ok(())
    }
}

pub struct LikeRelation;

impl Relation for LikeRelation {
    type Object = LikeTarget;
    type Record = Like;

    const NAME: &'static str = "like";

    fn object_name(object: &LikeTarget) -> &'static str {
        object.kind_name()
    }
}

pub struct SubscriptionRelation;

impl Relation for SubscriptionRelation {
    type Object = Uuid;
    type Record = Subscription;

    const NAME: &'static str = "subscription";

    fn object_name(_object: &Uuid) -> &'static str {
        "Channel"
    }

    fn check_pair(subject: Uuid, channel: &Uuid) -> ApiResult<()> {
        if subject == *channel {
            return Err(ApiError::invalid("Cannot subscribe to your own channel"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleState {
    Created,
    Removed,
}

impl ToggleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleState::Created => "created",
            ToggleState::Removed => "removed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Toggled<T> {
    pub state: ToggleState,
    /// The new record when created, absent when removed.
    pub record: Option<T>,
}

/// Flips the (subject, object) pair of relation `R`.
///
/// A concurrent toggle of the same pair shows up as a duplicate insert or
/// a delete that matched nothing; either way the round is retried against
/// the new state, so every successful call performs exactly one flip.
pub fn toggle<R, S>(store: &S, subject: Uuid, object: R::Object) -> ApiResult<Toggled<R::Record>>
where
    R: Relation,
    S: RelationStore<R> + ?Sized,
{
    R::check_pair(subject, &object)?;
    if !store.relation_object_exists(subject, &object)? {
        return Err(ApiError::not_found(R::object_name(&object)));
    }

    for attempt in 1..=MAX_TOGGLE_ATTEMPTS {
        let toggled = match store.find_relation(subject, &object)? {
            Some(_) => store.delete_relation(subject, &object)?.then_some(Toggled {
                state: ToggleState::Removed,
                record: None,
            }),
            None => match store.insert_relation(subject, &object)? {
                Insertion::Inserted(record) => Some(Toggled {
                    state: ToggleState::Created,
                    record: Some(record),
                }),
                Insertion::Duplicate => None,
            },
        };

        if let Some(toggled) = toggled {
            debug!(
                "Toggled {} {:?} for {}: {}",
                R::NAME,
                object,
                subject,
                toggled.state.as_str()
            );
            record_toggle(R::NAME, toggled.state.as_str());
            return Ok(toggled);
        }
        debug!(
            "Lost {} toggle race on {:?} (attempt {})",
            R::NAME,
            object,
            attempt
        );
    }

    warn!(
        "Gave up toggling {} {:?} for {} after {} attempts",
        R::NAME,
        object,
        subject,
        MAX_TOGGLE_ATTEMPTS
    );
    Err(ApiError::Internal(anyhow::anyhow!(
        "{} toggle did not converge",
        R::NAME
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CredentialHasher;
    use crate::store::{NewUser, NewVideo, SqliteStore, UserStore, VideoStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::new(temp_dir.path().join("test.db")).unwrap();
        (store, temp_dir)
    }

    fn user(store: &SqliteStore, name: &str) -> Uuid {
        let new_user = NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            full_name: name.to_string(),
        };
        match store
            .create_user(new_user, CredentialHasher::Argon2, "s".into(), "h".into())
            .unwrap()
        {
            Insertion::Inserted(user) => user.id,
            Insertion::Duplicate => panic!("duplicate user"),
        }
    }

    fn video(store: &SqliteStore, owner_id: Uuid) -> Uuid {
        store
            .insert_video(NewVideo {
                owner_id,
                title: "clip".to_string(),
                description: "d".to_string(),
                video_url: "/media/video/x.mp4".to_string(),
                thumbnail_url: None,
            })
            .unwrap()
            .id
    }

    #[test]
    fn toggling_twice_restores_original_state() {
        let (store, _dir) = create_tmp_store();
        let alice = user(&store, "alice");
        let target = LikeTarget::Video(video(&store, alice));

        let first = toggle::<LikeRelation, _>(&store, alice, target).unwrap();
        assert_eq!(first.state, ToggleState::Created);
        let record = first.record.unwrap();
        assert_eq!(record.target, target);
        assert_eq!(record.user_id, alice);

        let second = toggle::<LikeRelation, _>(&store, alice, target).unwrap();
        assert_eq!(second.state, ToggleState::Removed);
        assert!(second.record.is_none());
        assert!(RelationStore::<LikeRelation>::find_relation(&store, alice, &target)
            .unwrap()
            .is_none());
    }

    #[test]
    fn missing_object_is_not_found_and_writes_nothing() {
        let (store, _dir) = create_tmp_store();
        let alice = user(&store, "alice");
        let target = LikeTarget::Tweet(Uuid::new_v4());

        let err = toggle::<LikeRelation, _>(&store, alice, target).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Tweet not found"));
        assert!(RelationStore::<LikeRelation>::find_relation(&store, alice, &target)
            .unwrap()
            .is_none());

        let err = toggle::<SubscriptionRelation, _>(&store, alice, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn self_subscription_is_rejected() {
        let (store, _dir) = create_tmp_store();
        let alice = user(&store, "alice");
        let err = toggle::<SubscriptionRelation, _>(&store, alice, alice).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn subscription_toggle_round_trip() {
        let (store, _dir) = create_tmp_store();
        let alice = user(&store, "alice");
        let bob = user(&store, "bob");

        let created = toggle::<SubscriptionRelation, _>(&store, alice, bob).unwrap();
        assert_eq!(created.state, ToggleState::Created);
        assert_eq!(created.record.unwrap().channel_id, bob);

        let removed = toggle::<SubscriptionRelation, _>(&store, alice, bob).unwrap();
        assert_eq!(removed.state, ToggleState::Removed);
    }

    #[test]
    fn concurrent_toggles_never_duplicate() {
        let (store, _dir) = create_tmp_store();
        let store = Arc::new(store);
        let alice = user(&store, "alice");
        let target = LikeTarget::Video(video(&store, alice));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let mut created = 0i32;
                    for _ in 0..2 {
                        match toggle::<LikeRelation, _>(store.as_ref(), alice, target)
                            .unwrap()
                            .state
                        {
                            ToggleState::Created => created += 1,
                            ToggleState::Removed => created -= 1,
                        }
                    }
                    created
                })
            })
            .collect();
        let net: i32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        // Eight flips in total, so the pair ends where it started.
        assert_eq!(net, 0);
        assert!(RelationStore::<LikeRelation>::find_relation(store.as_ref(), alice, &target)
            .unwrap()
            .is_none());
    }
}
