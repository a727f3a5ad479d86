//! Credential verification and password hashing.
//!
//! Login checks go through the [`CredentialVerifier`] trait so the single
//! fixed demo account can be swapped for a real identity store without
//! touching token issuing or validation.

pub mod password;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::goal::DEFAULT_MANAGERS_GOAL;

pub use password::{PasswordError, hash_password, verify_password};

/// Email of the built-in demo account.
pub const DEMO_EMAIL: &str = "antech@gmail.com";

/// Password of the built-in demo account.
pub const DEMO_PASSWORD: &str = "antech123";

/// Role given to every authenticated user.
pub const DEFAULT_ROLE: &str = "user";

/// Profile returned to the client after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub department: String,
    pub designation: String,
    pub managers_goal: String,
}

/// Checks an email/password pair.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Return the user's profile when the credentials are valid, `None`
    /// when they are not. `Err` is reserved for backend failures.
    async fn verify(&self, email: &str, password: &str) -> anyhow::Result<Option<UserProfile>>;
}

/// Accepts exactly one configured email/password pair.
#[derive(Debug, Clone)]
pub struct FixedCredentialVerifier {
    email: String,
    password: String,
}

impl FixedCredentialVerifier {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email.clone(),
            name: "Demo User".to_string(),
            department: "Engineering".to_string(),
            designation: "Software Engineer".to_string(),
            managers_goal: DEFAULT_MANAGERS_GOAL.to_string(),
        }
    }
}

impl Default for FixedCredentialVerifier {
    fn default() -> Self {
        Self::new(DEMO_EMAIL, DEMO_PASSWORD)
    }
}

#[async_trait]
impl CredentialVerifier for FixedCredentialVerifier {
    async fn verify(&self, email: &str, password: &str) -> anyhow::Result<Option<UserProfile>> {
        let email_ok = email.as_bytes().ct_eq(self.email.as_bytes());
        let password_ok = password.as_bytes().ct_eq(self.password.as_bytes());
        if bool::from(email_ok & password_ok) {
            Ok(Some(self.profile()))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_pair_is_accepted() {
        let verifier = FixedCredentialVerifier::default();
        let profile = verifier
            .verify(DEMO_EMAIL, DEMO_PASSWORD)
            .await
            .unwrap()
            .expect("demo credentials should verify");
        assert_eq!(profile.email, DEMO_EMAIL);
        assert_eq!(profile.name, "Demo User");
        assert_eq!(profile.managers_goal, DEFAULT_MANAGERS_GOAL);
    }

    #[tokio::test]
    async fn other_credentials_are_rejected() {
        let verifier = FixedCredentialVerifier::default();
        assert!(verifier.verify(DEMO_EMAIL, "wrong").await.unwrap().is_none());
        assert!(verifier.verify("x@y.z", DEMO_PASSWORD).await.unwrap().is_none());
        assert!(verifier.verify("", "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prefixes_and_extensions_are_rejected() {
        let verifier = FixedCredentialVerifier::default();
        assert!(verifier.verify(DEMO_EMAIL, "antech12").await.unwrap().is_none());
        assert!(verifier.verify(DEMO_EMAIL, "antech1234").await.unwrap().is_none());
        assert!(verifier.verify("antech@gmail.co", DEMO_PASSWORD).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn configured_pair_replaces_demo_pair() {
        let verifier: Box<dyn CredentialVerifier> =
            Box::new(FixedCredentialVerifier::new("ops@corp.test", "s3cret"));
        assert!(verifier.verify("ops@corp.test", "s3cret").await.unwrap().is_some());
        assert!(verifier.verify(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap().is_none());
    }
}
