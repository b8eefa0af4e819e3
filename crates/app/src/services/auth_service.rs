//! Auth service — registration, login, phone verification and token resolution.

use std::sync::Arc;

use careops_domain::error::{AuthError, CareOpsError, NotFoundError, ValidationError};
use careops_domain::permission::Principal;
use careops_domain::time::now;
use careops_domain::user::{MIN_PASSWORD_LEN, User};
use rand::Rng;

use crate::ports::{AccessToken, Credentials, Notifier, Store, UserRepository};

/// Input for [`AuthService::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone_number: Option<String>,
}

/// Six random decimal digits, zero padded.
fn verification_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AuthService<S, N, C> {
    store: Arc<S>,
    notifier: Arc<N>,
    credentials: Arc<C>,
}

impl<S, N, C> AuthService<S, N, C>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, credentials: Arc<C>) -> Self {
        Self {
            store,
            notifier,
            credentials,
        }
    }

    /// Create an account. When a phone number is given a verification code
    /// is issued and sent by SMS; the send is best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] for a blank field, a short
    /// password or an email already in use.
    #[tracing::instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<User, CareOpsError> {
        let email = normalize_email(&registration.email);
        if email.is_empty() {
            return Err(ValidationError::EmptyField { field: "email" }.into());
        }
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }
        if self.store.users().find_by_email(&email).await?.is_some() {
            return Err(ValidationError::EmailTaken.into());
        }

        let mut user = User::builder()
            .email(email)
            .full_name(registration.full_name.trim())
            .phone_number(registration.phone_number)
            .password_hash(self.credentials.hash_password(&registration.password)?)
            .build()?;

        let code = user.phone_number.is_some().then(verification_code);
        if let Some(code) = &code {
            user.issue_verification(code.clone(), now());
        }
        let user = self.store.users().create(user).await?;
        tracing::info!(user_id = %user.id, "user registered");

        if let (Some(phone), Some(code)) = (user.phone_number.as_deref(), code) {
            self.notifier.send_verification_code(phone, &code).await;
        }
        Ok(user)
    }

    /// Exchange email and password for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email, a
    /// wrong password or an inactive account.
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, CareOpsError> {
        let user = self
            .store
            .users()
            .find_by_email(&normalize_email(email))
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::InvalidCredentials)?;
        if !self
            .credentials
            .verify_password(password, &user.password_hash)?
        {
            return Err(AuthError::InvalidCredentials.into());
        }
        self.credentials.issue_token(&user)
    }

    /// Check the SMS code sent to the user registered with `email`.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] for an unknown email, or the
    /// validation error explaining why the code was refused.
    pub async fn verify_sms(&self, email: &str, code: &str) -> Result<User, CareOpsError> {
        let mut user = self.user_by_email(email).await?;
        user.verify_phone(code, now())?;
        let user = self.store.users().update(user).await?;
        tracing::info!(user_id = %user.id, "phone verified");
        Ok(user)
    }

    /// Issue a fresh code for the user registered with `email` and send it.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] for an unknown email, or
    /// [`CareOpsError::Validation`] when there is no phone on file or it is
    /// already verified.
    pub async fn resend_sms(&self, email: &str) -> Result<(), CareOpsError> {
        let mut user = self.user_by_email(email).await?;
        let phone = user.ensure_can_receive_code()?.to_string();
        let code = verification_code();
        user.issue_verification(code.clone(), now());
        self.store.users().update(user).await?;
        self.notifier.send_verification_code(&phone, &code).await;
        Ok(())
    }

    /// Resolve a bearer token into the calling [`Principal`].
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Unauthorized`] when the token is invalid or
    /// its subject no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, CareOpsError> {
        let user_id = self.credentials.decode_token(token)?;
        let user = self
            .store
            .users()
            .get_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::InactiveUser)?;
        Ok(Principal {
            user_id: user.id,
            email: user.email,
        })
    }

    /// The account of the calling principal.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] if the account disappeared.
    pub async fn me(&self, principal: &Principal) -> Result<User, CareOpsError> {
        self.store
            .users()
            .get_by_id(principal.user_id)
            .await?
            .ok_or_else(|| NotFoundError::new("User", principal.user_id).into())
    }

    async fn user_by_email(&self, email: &str) -> Result<User, CareOpsError> {
        let email = normalize_email(email);
        self.store
            .users()
            .find_by_email(&email)
            .await?
            .ok_or_else(|| NotFoundError::new("User", email).into())
    }
}
