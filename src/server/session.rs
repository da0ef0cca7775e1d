use super::state::ServerState;
use crate::error::ApiError;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use tracing::debug;
use uuid::Uuid;

/// The authenticated principal of a request.
#[derive(Debug)]
pub struct Session {
    pub user_id: Uuid,
}

pub const COOKIE_ACCESS_TOKEN_KEY: &str = "access_token";
pub const COOKIE_REFRESH_TOKEN_KEY: &str = "refresh_token";

fn extract_token_from_headers(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn extract_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_ACCESS_TOKEN_KEY)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

fn extract_session(parts: &Parts, ctx: &ServerState) -> Result<Session, ApiError> {
    let token = extract_token_from_headers(parts)
        .or_else(|| extract_token_from_cookies(parts))
        .ok_or_else(|| {
            debug!("No token in headers nor cookies.");
            ApiError::unauthorized("Authentication required")
        })?;
    let user_id = ctx.identity.authenticate(&token)?;
    Ok(Session { user_id })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session(parts, ctx)
    }
}

/// Anonymous when no valid credential is presented.
impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session(parts, ctx).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header_name: &str, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(header_name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn bearer_header_is_read() {
        let p = parts("authorization", "Bearer abc.def.ghi");
        assert_eq!(extract_token_from_headers(&p).as_deref(), Some("abc.def.ghi"));

        let p = parts("authorization", "Basic Zm9vOmJhcg==");
        assert!(extract_token_from_headers(&p).is_none());
    }

    #[test]
    fn access_cookie_is_read() {
        let p = parts("cookie", "theme=dark; access_token=tok123");
        assert_eq!(extract_token_from_cookies(&p).as_deref(), Some("tok123"));

        let p = parts("cookie", "refresh_token=tok456");
        assert!(extract_token_from_cookies(&p).is_none());
    }
}
