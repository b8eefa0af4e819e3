//! Common error types used across the workspace.
//!
//! Each layer converts its own failures into [`CareOpsError`] through the
//! `#[from]` conversions below. Adapter-level failures (database, network)
//! are boxed into [`CareOpsError::Storage`] so the domain never names them.

use crate::permission::Denied;
use crate::workspace::ActivationBlocker;

/// Top-level error returned by domain and application operations.
#[derive(Debug, thiserror::Error)]
pub enum CareOpsError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("forbidden: {0}")]
    Forbidden(#[from] Denied),

    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// A request was well-formed but violates a business rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid {kind} id: {value}")]
    InvalidId { kind: &'static str, value: String },

    #[error("unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    #[error("{field} must not exceed {max}")]
    TooLarge { field: &'static str, max: i64 },

    #[error("no verification code sent")]
    NoVerificationCode,

    #[error("verification code expired")]
    VerificationCodeExpired,

    #[error("invalid verification code")]
    InvalidVerificationCode,

    #[error("no phone number on file")]
    NoPhoneNumber,

    #[error("phone already verified")]
    PhoneAlreadyVerified,

    #[error("cannot activate workspace: {}", describe_blockers(.0))]
    ActivationBlocked(Vec<ActivationBlocker>),

    #[error("user is already a staff member of this workspace")]
    AlreadyStaff,

    #[error("the workspace owner cannot be added as staff")]
    OwnerAsStaff,

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("submission is already completed")]
    SubmissionAlreadyCompleted,
}

fn describe_blockers(blockers: &[ActivationBlocker]) -> String {
    blockers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A referenced record does not exist, or is not visible from the caller's workspace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl NotFoundError {
    #[must_use]
    pub fn new(entity: &'static str, id: impl ToString) -> Self {
        Self {
            entity,
            id: id.to_string(),
        }
    }
}

/// The caller could not be identified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no token provided")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("user no longer exists or is inactive")]
    InactiveUser,
}
