//! One-way password hashing: salted PBKDF2-HMAC-SHA256.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`.

use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Work factor for newly created hashes.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Errors from hashing or verifying passwords.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    Empty,

    #[error("malformed password hash: {0}")]
    Malformed(String),

    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with(password, DEFAULT_ITERATIONS)
}

/// Hash `password` with a fresh random salt and an explicit work factor.
pub fn hash_password_with(password: &str, iterations: u32) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    if iterations == 0 {
        return Err(PasswordError::Hashing("iteration count must be positive".to_string()));
    }
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);
    let hash = derive(password.as_bytes(), &salt, iterations);
    Ok(format!(
        "{SCHEME}${iterations}${}${}",
        hex::encode(salt),
        hex::encode(hash)
    ))
}

/// Check `password` against an encoded hash from [`hash_password`].
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, PasswordError> {
    let parts: Vec<&str> = encoded.split('$').collect();
    let [scheme, iterations, salt_hex, hash_hex] = parts.as_slice() else {
        return Err(PasswordError::Malformed("expected four '$'-separated parts".to_string()));
    };
    if *scheme != SCHEME {
        return Err(PasswordError::Malformed(format!("unknown scheme {scheme:?}")));
    }
    let iterations: u32 = iterations
        .parse()
        .map_err(|e| PasswordError::Malformed(format!("bad iteration count: {e}")))?;
    if iterations == 0 {
        return Err(PasswordError::Malformed("iteration count must be positive".to_string()));
    }
    let salt = hex::decode(salt_hex)
        .map_err(|e| PasswordError::Malformed(format!("bad salt hex: {e}")))?;
    let expected = hex::decode(hash_hex)
        .map_err(|e| PasswordError::Malformed(format!("bad hash hex: {e}")))?;

    let actual = derive(password.as_bytes(), &salt, iterations);
    Ok(actual.as_slice().ct_eq(expected.as_slice()).into())
}

fn derive(password: &[u8], salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pbkdf2_matches_rfc7914_vector() {
        // RFC 7914 section 11: PBKDF2-HMAC-SHA256("passwd", "salt", 1)
        let out = derive(b"passwd", b"salt", 1);
        assert_eq!(
            hex::encode(out),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn hash_has_expected_encoding() {
        let encoded = hash_password_with("antech123", 10).unwrap();
        let parts: Vec<&str> = encoded.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "pbkdf2-sha256");
        assert_eq!(parts[1], "10");
        assert_eq!(parts[2].len(), SALT_LEN * 2);
        assert_eq!(parts[3].len(), HASH_LEN * 2);
    }

    #[test]
    fn hash_verifies_only_original_password() {
        let encoded = hash_password_with("correct horse", 50).unwrap();
        assert!(verify_password("correct horse", &encoded).unwrap());
        assert!(!verify_password("correct horse!", &encoded).unwrap());
    }

    #[test]
    fn same_password_hashes_differ() {
        let a = hash_password_with("pw", 10).unwrap();
        let b = hash_password_with("pw", 10).unwrap();
        assert_ne!(a, b, "salts should differ");
    }

    #[test]
    fn default_work_factor_roundtrip() {
        let encoded = hash_password("pw").unwrap();
        assert!(encoded.starts_with("pbkdf2-sha256$100000$"));
        assert!(verify_password("pw", &encoded).unwrap());
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(matches!(hash_password("").unwrap_err(), PasswordError::Empty));
    }

    #[test]
    fn malformed_hashes_are_errors() {
        for bad in [
            "",
            "pbkdf2-sha256$10$abcd",
            "bcrypt$10$00$00",
            "pbkdf2-sha256$ten$00$00",
            "pbkdf2-sha256$0$00$00",
            "pbkdf2-sha256$10$zz$00",
        ] {
            assert!(
                matches!(verify_password("pw", bad), Err(PasswordError::Malformed(_))),
                "expected malformed error for {bad:?}"
            );
        }
    }

    #[test]
    fn truncated_hash_does_not_verify() {
        let encoded = hash_password_with("pw", 10).unwrap();
        let truncated = &encoded[..encoded.len() - 2];
        assert!(!verify_password("pw", truncated).unwrap());
    }
}
