//! Registration, login, logout and token refresh.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::identity::{IdentityManager, Registration, TokenPair};
use crate::store::User;

use super::envelope::{ApiJson, ApiResponse};
use super::session::{Session, COOKIE_ACCESS_TOKEN_KEY, COOKIE_REFRESH_TOKEN_KEY};
use super::state::{GuardedIdentityManager, ServerState};
use super::ServerConfig;

#[derive(Deserialize, Debug)]
struct RegisterBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub password: String,
}

/// Either `username` or `email` identifies the account.
#[derive(Deserialize)]
struct LoginBody {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
struct RefreshBody {
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
struct LoginSuccess {
    user: User,
    #[serde(flatten)]
    tokens: TokenPair,
}

fn auth_cookie(
    name: &'static str,
    value: String,
    ttl: Duration,
    config: &ServerConfig,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .max_age(time::Duration::seconds(ttl.as_secs() as i64))
        .build()
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .build()
}

fn with_token_cookies(
    jar: CookieJar,
    tokens: &TokenPair,
    identity: &IdentityManager,
    config: &ServerConfig,
) -> CookieJar {
    let issuer = identity.tokens();
    jar.add(auth_cookie(
        COOKIE_ACCESS_TOKEN_KEY,
        tokens.access_token.clone(),
        issuer.access_ttl(),
        config,
    ))
    .add(auth_cookie(
        COOKIE_REFRESH_TOKEN_KEY,
        tokens.refresh_token.clone(),
        issuer.refresh_ttl(),
        config,
    ))
}

async fn register(
    State(identity): State<GuardedIdentityManager>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> ApiResult<ApiResponse<User>> {
    debug!("register() called for {:?}", body.username);
    let user = identity.register(Registration {
        username: body.username,
        email: body.email,
        full_name: body.full_name,
        password: body.password,
    })?;
    Ok(ApiResponse::created(user, "User registered"))
}

async fn login(
    State(identity): State<GuardedIdentityManager>,
    State(config): State<ServerConfig>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginBody>,
) -> ApiResult<Response> {
    let handle = body
        .username
        .or(body.email)
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| ApiError::invalid("username or email is required"))?;
    if body.password.is_empty() {
        return Err(ApiError::invalid("password is required"));
    }

    let (user, tokens) = identity.login(handle.trim(), &body.password)?;
    let jar = with_token_cookies(jar, &tokens, &identity, &config);
    Ok((
        jar,
        ApiResponse::ok(LoginSuccess { user, tokens }, "Logged in"),
    )
        .into_response())
}

async fn logout(
    State(identity): State<GuardedIdentityManager>,
    session: Session,
    jar: CookieJar,
) -> ApiResult<Response> {
    identity.logout(session.user_id)?;
    let jar = jar
        .add(expired_cookie(COOKIE_ACCESS_TOKEN_KEY))
        .add(expired_cookie(COOKIE_REFRESH_TOKEN_KEY));
    Ok((jar, ApiResponse::ok((), "Logged out")).into_response())
}

/// The refresh token comes from the body, else from its cookie.
async fn refresh(
    State(identity): State<GuardedIdentityManager>,
    State(config): State<ServerConfig>,
    jar: CookieJar,
    body: Result<ApiJson<RefreshBody>, ApiError>,
) -> ApiResult<Response> {
    let presented = body
        .ok()
        .and_then(|ApiJson(b)| b.refresh_token)
        .or_else(|| {
            jar.get(COOKIE_REFRESH_TOKEN_KEY)
                .map(|c| c.value().to_string())
        })
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Refresh token required"))?;

    let tokens = identity.refresh(&presented)?;
    let jar = with_token_cookies(jar, &tokens, &identity, &config);
    Ok((jar, ApiResponse::ok(tokens, "Tokens refreshed")).into_response())
}

pub fn auth_routes() -> Router<ServerState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
}
