use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{CredentialHasher, TokenIssuer, TokenPair};
use crate::error::{required, ApiError, ApiResult};
use crate::media::{MediaKind, MediaStore, MediaUpload};
use crate::server::metrics::record_login_attempt;
use crate::store::{now, FullStore, Insertion, NewUser, PasswordCredentials, ProfileImage, User};

const INVALID_LOGIN: &str = "Invalid username or password";

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

fn normalize_username(raw: &str) -> ApiResult<String> {
    let username = required("username", raw)?.to_lowercase();
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ApiError::invalid(
            "username may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(username)
}

fn normalize_email(raw: &str) -> ApiResult<String> {
    let email = required("email", raw)?.to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::invalid("email is not valid"));
    }
    Ok(email)
}

/// Registration, login and the token lifecycle, plus account maintenance.
pub struct IdentityManager {
    store: Arc<dyn FullStore>,
    media: Arc<dyn MediaStore>,
    tokens: TokenIssuer,
}

impl IdentityManager {
    pub fn new(store: Arc<dyn FullStore>, media: Arc<dyn MediaStore>, tokens: TokenIssuer) -> Self {
        IdentityManager {
            store,
            media,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    fn hash_password(password: &str) -> ApiResult<(CredentialHasher, String, String)> {
        let hasher = CredentialHasher::Argon2;
        let salt = hasher.generate_b64_salt()?;
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        Ok((hasher, salt, hash))
    }

    pub fn register(&self, registration: Registration) -> ApiResult<User> {
        let username = normalize_username(&registration.username)?;
        let email = normalize_email(&registration.email)?;
        let full_name = required("full_name", &registration.full_name)?;
        if registration.password.trim().is_empty() {
            return Err(ApiError::invalid("password is required"));
        }

        if self.store.is_username_or_email_taken(&username, &email)? {
            return Err(ApiError::conflict("Username or email already taken"));
        }

        let (hasher, salt, hash) = Self::hash_password(&registration.password)?;
        let new_user = NewUser {
            username,
            email,
            full_name,
        };
        match self.store.create_user(new_user, hasher, salt, hash)? {
            Insertion::Inserted(user) => {
                info!("Registered user {} ({})", user.username, user.id);
                Ok(user)
            }
            Insertion::Duplicate => Err(ApiError::conflict("Username or email already taken")),
        }
    }

    /// Verifies the password and stores a fresh refresh token in the user's slot.
    pub fn login(&self, login: &str, password: &str) -> ApiResult<(User, TokenPair)> {
        let login = required("username", login)?;
        let Some(user) = self.store.find_user_by_login(&login)? else {
            record_login_attempt("unknown_user");
            return Err(ApiError::unauthorized(INVALID_LOGIN));
        };
        let Some(credentials) = self.store.get_password_credentials(user.id)? else {
            warn!("User {} has no password credentials", user.id);
            record_login_attempt("no_credentials");
            return Err(ApiError::unauthorized(INVALID_LOGIN));
        };
        if !credentials.hasher.verify(password, &credentials.hash)? {
            record_login_attempt("wrong_password");
            return Err(ApiError::unauthorized(INVALID_LOGIN));
        }

        let pair = self.tokens.issue_pair(user.id)?;
        self.store
            .set_refresh_token(user.id, Some(&pair.refresh_token))?;
        self.store.touch_password_credentials(user.id)?;
        record_login_attempt("success");
        debug!("User {} logged in", user.id);
        Ok((user, pair))
    }

    pub fn logout(&self, user_id: Uuid) -> ApiResult<()> {
        self.store.set_refresh_token(user_id, None)?;
        debug!("User {} logged out", user_id);
        Ok(())
    }

    /// Rotates the token pair. The presented refresh token must be the one
    /// currently in the slot and is unusable afterwards.
    pub fn refresh(&self, refresh_token: &str) -> ApiResult<TokenPair> {
        let user_id = self.tokens.verify_refresh(refresh_token).map_err(|err| {
            debug!("Rejected refresh token: {}", err);
            ApiError::unauthorized("Invalid refresh token")
        })?;
        let pair = self.tokens.issue_pair(user_id)?;
        if !self
            .store
            .swap_refresh_token(user_id, refresh_token, &pair.refresh_token)?
        {
            debug!("Refresh token for {} is not the current one", user_id);
            return Err(ApiError::unauthorized("Refresh token is expired or used"));
        }
        Ok(pair)
    }

    /// Resolves the principal of an access token.
    pub fn authenticate(&self, access_token: &str) -> ApiResult<Uuid> {
        let user_id = self.tokens.verify_access(access_token).map_err(|err| {
            debug!("Rejected access token: {}", err);
            ApiError::unauthorized("Invalid access token")
        })?;
        if self.store.get_user(user_id)?.is_none() {
            return Err(ApiError::unauthorized("Invalid access token"));
        }
        Ok(user_id)
    }

    pub fn current_user(&self, user_id: Uuid) -> ApiResult<User> {
        self.store
            .get_user(user_id)?
            .ok_or_else(|| ApiError::not_found("User"))
    }

    pub fn update_details(
        &self,
        user_id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> ApiResult<User> {
        if full_name.is_none() && email.is_none() {
            return Err(ApiError::invalid("full_name or email is required"));
        }
        let full_name = full_name.map(|n| required("full_name", n)).transpose()?;
        let email = email.map(normalize_email).transpose()?;

        match self
            .store
            .update_user_details(user_id, full_name.as_deref(), email.as_deref())?
        {
            Insertion::Inserted(Some(user)) => Ok(user),
            Insertion::Inserted(None) => Err(ApiError::not_found("User")),
            Insertion::Duplicate => Err(ApiError::conflict("Email already taken")),
        }
    }

    /// Replaces the password and signs the user out of every refresh session.
    pub fn change_password(&self, user_id: Uuid, old: &str, new: &str) -> ApiResult<()> {
        if new.trim().is_empty() {
            return Err(ApiError::invalid("new password is required"));
        }
        let credentials = self
            .store
            .get_password_credentials(user_id)?
            .ok_or_else(|| ApiError::unauthorized("Old password is incorrect"))?;
        if !credentials.hasher.verify(old, &credentials.hash)? {
            return Err(ApiError::unauthorized("Old password is incorrect"));
        }

        let (hasher, salt, hash) = Self::hash_password(new)?;
        self.store.update_password_credentials(&PasswordCredentials {
            user_id,
            salt,
            hash,
            hasher,
            created_at: now(),
            last_used: None,
        })?;
        self.store.set_refresh_token(user_id, None)?;
        info!("Password changed for user {}", user_id);
        Ok(())
    }

    pub async fn update_image(
        &self,
        user_id: Uuid,
        slot: ProfileImage,
        upload: MediaUpload,
    ) -> ApiResult<User> {
        if self.store.get_user(user_id)?.is_none() {
            return Err(ApiError::not_found("User"));
        }
        let kind = match slot {
            ProfileImage::Avatar => MediaKind::Avatar,
            ProfileImage::Cover => MediaKind::Cover,
        };
        let url = self.media.store(kind, upload).await?;
        let previous = match self.store.set_user_image(user_id, slot, &url) {
            Ok(previous) => previous,
            Err(err) => {
                self.discard_media(&url).await;
                return Err(err.into());
            }
        };
        if let Some(previous) = previous {
            self.discard_media(&previous).await;
        }
        self.current_user(user_id)
    }

    async fn discard_media(&self, url: &str) {
        if let Err(err) = self.media.delete(url).await {
            warn!("Could not delete image {}: {}", url, err);
        }
    }
}
