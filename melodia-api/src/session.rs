//! Session extraction
//!
//! Protected handlers take a [`CurrentUser`] argument. The extractor reads
//! the session token from `Authorization: Bearer <token>` or, failing that,
//! from the `__session` cookie, and verifies it against the service secret.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use chrono::Utc;
use melodia_common::session::verify_token;
use tracing::warn;

use crate::{ApiError, AppState};

/// Cookie carrying the session token for browser clients
pub const SESSION_COOKIE: &str = "__session";

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;

        match verify_token(&token, &state.session_secret, Utc::now().timestamp_millis()) {
            Ok(user_id) => Ok(CurrentUser { user_id }),
            Err(e) => {
                warn!("Rejected session for {} {}: {}", parts.method, parts.uri.path(), e);
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// Token from the Authorization header, else from the session cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some((scheme, token)) = value.trim().split_once(' ') {
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
                return Some(token.trim().to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
