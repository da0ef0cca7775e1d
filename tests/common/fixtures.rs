//! Test database seeding

use clipnest_server::identity::CredentialHasher;
use clipnest_server::store::{Insertion, NewUser, UserStore};
use clipnest_server::SqliteStore;
use uuid::Uuid;

use super::constants::*;

fn seed_user(
    store: &SqliteStore,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let hasher = CredentialHasher::Argon2;
    let salt = hasher.generate_b64_salt()?;
    let hash = hasher.hash(password.as_bytes(), &salt)?;
    let new_user = NewUser {
        username: username.to_string(),
        email: email.to_string(),
        full_name: format!("{} Tester", username),
    };
    match store.create_user(new_user, hasher, salt, hash)? {
        Insertion::Inserted(user) => Ok(user.id),
        Insertion::Duplicate => anyhow::bail!("User {} already seeded", username),
    }
}

/// Seeds alice and bob, returning their ids.
pub fn seed_users(store: &SqliteStore) -> anyhow::Result<(Uuid, Uuid)> {
    let alice = seed_user(store, ALICE_USER, ALICE_EMAIL, ALICE_PASS)?;
    let bob = seed_user(store, BOB_USER, BOB_EMAIL, BOB_PASS)?;
    Ok((alice, bob))
}
