//! Signed session tokens.
//!
//! Tokens are compact JWTs signed with HMAC-SHA256 (`alg: HS256`).
//! Format: `<base64url(header)>.<base64url(claims)>.<base64url(mac)>`,
//! all segments unpadded. Lifetime is 24 hours from issue.

pub mod guard;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// How long an issued token stays valid.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// The only signing algorithm accepted.
const ALGORITHM: &str = "HS256";

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token signature verification failed")]
    SignatureMismatch,

    #[error("token has expired")]
    Expired,

    #[error("missing token secret")]
    MissingSecret,
}

/// Configuration for token signing and validation.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// The HMAC secret key bytes.
    pub secret: Vec<u8>,
}

impl TokenConfig {
    /// Create a new TokenConfig with the given secret.
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Create a TokenConfig from a hex-encoded secret.
    pub fn from_hex(secret_hex: &str) -> Result<Self, TokenError> {
        if secret_hex.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }
        let secret = hex::decode(secret_hex.trim())
            .map_err(|e| TokenError::InvalidFormat(format!("token secret is not valid hex: {e}")))?;
        Ok(Self::new(secret))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub email: String,
    pub name: String,
    pub role: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

impl TokenClaims {
    /// Claims for a token issued at `issued_at` with the standard lifetime.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let expires_at = issued_at + Duration::hours(TOKEN_LIFETIME_HOURS);
        Self {
            email: email.into(),
            name: name.into(),
            role: role.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }
}

/// Sign `claims` into a compact token.
pub fn issue_token(config: &TokenConfig, claims: &TokenClaims) -> Result<String, TokenError> {
    let header = Header {
        alg: ALGORITHM.to_string(),
        typ: "JWT".to_string(),
    };
    let header_json = serde_json::to_vec(&header)
        .map_err(|e| TokenError::InvalidFormat(format!("cannot encode header: {e}")))?;
    let claims_json = serde_json::to_vec(claims)
        .map_err(|e| TokenError::InvalidFormat(format!("cannot encode claims: {e}")))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let mac = compute_hmac(&config.secret, signing_input.as_bytes())?;
    Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(mac)))
}

/// Validate a token against the current time and return its claims.
pub fn validate_token(config: &TokenConfig, token: &str) -> Result<TokenClaims, TokenError> {
    validate_token_at(config, token, Utc::now())
}

/// Validate a token as of `now`.
///
/// This function:
/// 1. Splits the three segments
/// 2. Checks the header declares HS256
/// 3. Verifies the signature in constant time
/// 4. Decodes the claims and rejects them if `exp` is not after `now`
pub fn validate_token_at(
    config: &TokenConfig,
    token: &str,
    now: DateTime<Utc>,
) -> Result<TokenClaims, TokenError> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(mac_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::InvalidFormat(
            "token must have exactly three segments".to_string(),
        ));
    };

    let header: Header = decode_segment(header_b64, "header")?;
    if header.alg != ALGORITHM {
        return Err(TokenError::UnsupportedAlgorithm(header.alg));
    }

    let provided_mac = URL_SAFE_NO_PAD
        .decode(mac_b64)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid base64 in signature: {e}")))?;
    let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
    verify_hmac_constant_time(&config.secret, signing_input.as_bytes(), &provided_mac)?;

    let claims: TokenClaims = decode_segment(claims_b64, "claims")?;
    if claims.exp <= now.timestamp() {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

fn decode_segment<T: serde::de::DeserializeOwned>(
    segment: &str,
    what: &str,
) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid base64 in {what}: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid JSON in {what}: {e}")))
}

/// Compute HMAC-SHA256 over the given message with the given key.
fn compute_hmac(key: &[u8], message: &[u8]) -> Result<Vec<u8>, TokenError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| TokenError::MissingSecret)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify HMAC using the `hmac` crate's constant-time `verify_slice`.
fn verify_hmac_constant_time(
    key: &[u8],
    message: &[u8],
    expected_mac: &[u8],
) -> Result<(), TokenError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| TokenError::MissingSecret)?;
    mac.update(message);
    mac.verify_slice(expected_mac)
        .map_err(|_| TokenError::SignatureMismatch)
}
