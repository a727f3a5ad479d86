//! Bearer-token guard for protected routes.
//!
//! Public routes never call this; every other route passes the request's
//! `Authorization` header through [`require_bearer`].

use chrono::{DateTime, Utc};

use super::{TokenClaims, TokenConfig, TokenError, validate_token_at};

const BEARER_PREFIX: &str = "Bearer ";

/// Errors from the bearer guard.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("Authentication required. No valid token provided.")]
    MissingToken,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken(#[source] TokenError),
}

impl From<TokenError> for GuardError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => GuardError::Expired,
            other => GuardError::InvalidToken(other),
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Validate the bearer token in `header` against the current time.
pub fn require_bearer(config: &TokenConfig, header: Option<&str>) -> Result<TokenClaims, GuardError> {
    require_bearer_at(config, header, Utc::now())
}

/// Validate the bearer token in `header` as of `now`.
pub fn require_bearer_at(
    config: &TokenConfig,
    header: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TokenClaims, GuardError> {
    let token = bearer_token(header).ok_or(GuardError::MissingToken)?;
    Ok(validate_token_at(config, token, now)?)
}
