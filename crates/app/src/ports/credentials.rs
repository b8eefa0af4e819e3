//! Credentials port — password hashing and access tokens.

use careops_domain::error::CareOpsError;
use careops_domain::id::UserId;
use careops_domain::user::User;
use serde::Serialize;

/// A bearer token handed out at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

impl AccessToken {
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            access_token: token.into(),
            token_type: "bearer",
        }
    }
}

/// Hashes passwords and issues/decodes access tokens.
///
/// Both operations are CPU-bound and synchronous.
pub trait Credentials: Send + Sync + 'static {
    /// Hash a plaintext password for storage.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Storage`] when hashing fails.
    fn hash_password(&self, password: &str) -> Result<String, CareOpsError>;

    /// Whether `password` matches the stored `hash`.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Storage`] when `hash` is not a valid hash.
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, CareOpsError>;

    /// Issue a signed, expiring token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Storage`] when signing fails.
    fn issue_token(&self, user: &User) -> Result<AccessToken, CareOpsError>;

    /// Resolve a token to the user id it was issued for.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Unauthorized`] for malformed, tampered or
    /// expired tokens.
    fn decode_token(&self, token: &str) -> Result<UserId, CareOpsError>;
}
