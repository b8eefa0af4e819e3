use careops_domain::error::CareOpsError;

/// Failures of the hashing and signing primitives.
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token signing failed")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl From<argon2::password_hash::Error> for SecurityError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::Hash(err.to_string())
    }
}

impl From<SecurityError> for CareOpsError {
    fn from(err: SecurityError) -> Self {
        Self::Storage(Box::new(err))
    }
}
