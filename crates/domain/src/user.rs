//! User — an authenticated account, owner of workspaces or member of their staff.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{CareOpsError, ValidationError};
use crate::id::UserId;
use crate::time::{Timestamp, now};

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// How long an SMS verification code stays valid.
pub const VERIFICATION_CODE_TTL_MINUTES: i64 = 10;

/// A registered account.
///
/// The password hash never leaves the process: it is skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_active: bool,
    pub phone_verified: bool,
    #[serde(skip)]
    pub verification: Option<VerificationCode>,
    pub created_at: Timestamp,
}

/// A one-time SMS code and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode {
    pub code: String,
    pub expires_at: Timestamp,
}

impl VerificationCode {
    /// Issue `code` at `issued_at`, expiring after the standard TTL.
    #[must_use]
    pub fn issue(code: impl Into<String>, issued_at: Timestamp) -> Self {
        Self {
            code: code.into(),
            expires_at: issued_at + Duration::minutes(VERIFICATION_CODE_TTL_MINUTES),
        }
    }
}

impl User {
    /// Create a builder for constructing a [`User`].
    #[must_use]
    pub fn builder() -> UserBuilder {
        UserBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] when `email` or `full_name` is empty.
    pub fn validate(&self) -> Result<(), CareOpsError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "email" }.into());
        }
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "full_name" }.into());
        }
        Ok(())
    }

    /// Store a freshly issued verification code, replacing any previous one.
    pub fn issue_verification(&mut self, code: impl Into<String>, at: Timestamp) {
        self.verification = Some(VerificationCode::issue(code, at));
    }

    /// Ensure a verification code may be (re)sent to this user.
    ///
    /// # Errors
    ///
    /// Fails when no phone number is on file or the phone is already verified.
    pub fn ensure_can_receive_code(&self) -> Result<&str, CareOpsError> {
        let Some(phone) = self.phone_number.as_deref() else {
            return Err(ValidationError::NoPhoneNumber.into());
        };
        if self.phone_verified {
            return Err(ValidationError::PhoneAlreadyVerified.into());
        }
        Ok(phone)
    }

    /// Check `code` against the stored one and mark the phone verified.
    ///
    /// The stored code is consumed on success.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoVerificationCode`],
    /// [`ValidationError::VerificationCodeExpired`] or
    /// [`ValidationError::InvalidVerificationCode`].
    pub fn verify_phone(&mut self, code: &str, at: Timestamp) -> Result<(), CareOpsError> {
        let Some(pending) = self.verification.as_ref() else {
            return Err(ValidationError::NoVerificationCode.into());
        };
        if at > pending.expires_at {
            return Err(ValidationError::VerificationCodeExpired.into());
        }
        if pending.code != code.trim() {
            return Err(ValidationError::InvalidVerificationCode.into());
        }
        self.phone_verified = true;
        self.verification = None;
        Ok(())
    }
}

/// Step-by-step builder for [`User`].
#[derive(Debug, Default)]
pub struct UserBuilder {
    id: Option<UserId>,
    email: Option<String>,
    full_name: Option<String>,
    phone_number: Option<String>,
    password_hash: Option<String>,
    created_at: Option<Timestamp>,
}

impl UserBuilder {
    #[must_use]
    pub fn id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    #[must_use]
    pub fn phone_number(mut self, phone_number: Option<String>) -> Self {
        self.phone_number = phone_number.filter(|p| !p.trim().is_empty());
        self
    }

    #[must_use]
    pub fn password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.password_hash = Some(password_hash.into());
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Consume the builder, validate, and return an active, unverified [`User`].
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] if `email` or `full_name` is missing.
    pub fn build(self) -> Result<User, CareOpsError> {
        let user = User {
            id: self.id.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            full_name: self.full_name.unwrap_or_default(),
            phone_number: self.phone_number,
            password_hash: self.password_hash.unwrap_or_default(),
            is_active: true,
            phone_verified: false,
            verification: None,
            created_at: self.created_at.unwrap_or_else(now),
        };
        user.validate()?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_phone() -> User {
        User::builder()
            .email("ada@example.com")
            .full_name("Ada Lovelace")
            .phone_number(Some("+15550100".to_string()))
            .build()
            .unwrap()
    }

    #[test]
    fn should_return_validation_error_when_full_name_is_missing() {
        let result = User::builder().email("a@b.c").build();
        assert!(matches!(
            result,
            Err(CareOpsError::Validation(ValidationError::EmptyField {
                field: "full_name"
            }))
        ));
    }

    #[test]
    fn should_drop_blank_phone_number() {
        let user = User::builder()
            .email("a@b.c")
            .full_name("A")
            .phone_number(Some("  ".to_string()))
            .build()
            .unwrap();
        assert!(user.phone_number.is_none());
    }

    #[test]
    fn should_verify_phone_when_code_matches_before_expiry() {
        let mut user = user_with_phone();
        let issued = now();
        user.issue_verification("123456", issued);

        user.verify_phone("123456", issued + Duration::minutes(9))
            .unwrap();

        assert!(user.phone_verified);
        assert!(user.verification.is_none());
    }

    #[test]
    fn should_reject_code_when_expired() {
        let mut user = user_with_phone();
        let issued = now();
        user.issue_verification("123456", issued);

        let result = user.verify_phone("123456", issued + Duration::minutes(11));

        assert!(matches!(
            result,
            Err(CareOpsError::Validation(
                ValidationError::VerificationCodeExpired
            ))
        ));
        assert!(!user.phone_verified);
    }

    #[test]
    fn should_reject_code_when_it_does_not_match() {
        let mut user = user_with_phone();
        user.issue_verification("123456", now());

        let result = user.verify_phone("654321", now());

        assert!(matches!(
            result,
            Err(CareOpsError::Validation(
                ValidationError::InvalidVerificationCode
            ))
        ));
    }

    #[test]
    fn should_reject_verification_when_no_code_was_sent() {
        let mut user = user_with_phone();
        let result = user.verify_phone("123456", now());
        assert!(matches!(
            result,
            Err(CareOpsError::Validation(ValidationError::NoVerificationCode))
        ));
    }

    #[test]
    fn should_refuse_resend_when_phone_already_verified() {
        let mut user = user_with_phone();
        user.phone_verified = true;
        assert!(matches!(
            user.ensure_can_receive_code(),
            Err(CareOpsError::Validation(
                ValidationError::PhoneAlreadyVerified
            ))
        ));
    }

    #[test]
    fn should_not_serialize_password_hash() {
        let mut user = user_with_phone();
        user.password_hash = "secret-hash".to_string();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }
}
