//! Session tokens
//!
//! A session token names a user and an expiry and is signed with a secret
//! that only this service knows:
//!
//! ```text
//! <user_id>.<expires_at_ms>.<signature>
//! ```
//!
//! The signature is the lowercase hex SHA-256 of
//! `"<user_id>.<expires_at_ms>.<secret>"`.
//!
//! The secret lives in the settings table under `session_secret` and is
//! generated on first start.

use crate::db::settings::{get_setting, set_setting};
use crate::{Error, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::info;

/// Settings key of the signing secret
pub const SESSION_SECRET_KEY: &str = "session_secret";

const MAX_USER_ID_LEN: usize = 128;

// ========================================
// Error Types
// ========================================

/// Reasons a token is rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Token does not have three dot-separated parts
    Malformed,

    /// User id is empty, too long or has characters outside `[A-Za-z0-9_-]`
    InvalidUserId,

    /// Expiry is in the past
    Expired { expires_at_ms: i64, now_ms: i64 },

    /// Signature does not match
    BadSignature,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Malformed => write!(f, "Malformed session token"),
            SessionError::InvalidUserId => write!(f, "Invalid user id in session token"),
            SessionError::Expired { expires_at_ms, now_ms } => write!(
                f,
                "Session expired {}ms ago",
                now_ms.saturating_sub(*expires_at_ms)
            ),
            SessionError::BadSignature => write!(f, "Invalid session signature"),
        }
    }
}

impl std::error::Error for SessionError {}

// ========================================
// Secret Management
// ========================================

/// Load the signing secret, generating and storing one if absent
pub async fn load_session_secret(db: &SqlitePool) -> Result<String> {
    match get_setting(db, SESSION_SECRET_KEY).await? {
        Some(secret) if !secret.is_empty() => Ok(secret),
        _ => {
            let secret = generate_secret();
            set_setting(db, SESSION_SECRET_KEY, &secret).await?;
            info!("Generated new session signing secret");
            Ok(secret)
        }
    }
}

/// 32 random bytes as 64 hex characters
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ========================================
// Issue / Verify
// ========================================

pub fn is_valid_user_id(user_id: &str) -> bool {
    !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn sign(user_id: &str, expires_at_ms: i64, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}.{}.{}", user_id, expires_at_ms, secret).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issue a token for `user_id` valid for `ttl` from `now_ms`
///
/// # Examples
///
/// ```
/// use melodia_common::session::{issue_token, verify_token};
/// use std::time::Duration;
///
/// let token = issue_token("user_2abc", Duration::from_secs(60), "secret", 1_000).unwrap();
/// assert_eq!(verify_token(&token, "secret", 2_000).unwrap(), "user_2abc");
/// assert!(verify_token(&token, "other", 2_000).is_err());
/// ```
pub fn issue_token(user_id: &str, ttl: Duration, secret: &str, now_ms: i64) -> Result<String> {
    if !is_valid_user_id(user_id) {
        return Err(Error::InvalidInput(format!("invalid user id '{}'", user_id)));
    }
    let ttl_ms = i64::try_from(ttl.as_millis())
        .map_err(|_| Error::InvalidInput("session lifetime too large".to_string()))?;
    let expires_at_ms = now_ms.saturating_add(ttl_ms);

    Ok(format!(
        "{}.{}.{}",
        user_id,
        expires_at_ms,
        sign(user_id, expires_at_ms, secret)
    ))
}

/// Verify a token and return the user id it names
pub fn verify_token(token: &str, secret: &str, now_ms: i64) -> std::result::Result<String, SessionError> {
    let mut parts = token.trim().split('.');
    let (Some(user_id), Some(expires), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(SessionError::Malformed);
    };

    if !is_valid_user_id(user_id) {
        return Err(SessionError::InvalidUserId);
    }

    let expires_at_ms: i64 = expires.parse().map_err(|_| SessionError::Malformed)?;

    let expected = sign(user_id, expires_at_ms, secret);
    if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
        return Err(SessionError::BadSignature);
    }

    if expires_at_ms <= now_ms {
        return Err(SessionError::Expired { expires_at_ms, now_ms });
    }

    Ok(user_id.to_string())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ========================================
// Tests
// ========================================
