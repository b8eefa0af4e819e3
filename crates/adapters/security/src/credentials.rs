//! [`Credentials`] implementation.

use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use careops_app::ports::{AccessToken, Credentials};
use careops_domain::error::{AuthError, CareOpsError};
use careops_domain::id::UserId;
use careops_domain::time::now;
use careops_domain::user::User;

use crate::error::SecurityError;

/// Signing settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

/// Payload of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

/// Argon2id hashes and HS256 tokens signed with one shared secret.
pub struct JwtCredentials {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl JwtCredentials {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let secret = config.jwt_secret.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            token_ttl: config.token_ttl,
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, SecurityError> {
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding,
        )?)
    }
}

impl Credentials for JwtCredentials {
    fn hash_password(&self, password: &str) -> Result<String, CareOpsError> {
        let mut salt = [0_u8; 16];
        rand::rng().fill(&mut salt);
        let salt = SaltString::encode_b64(&salt).map_err(SecurityError::from)?;
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(SecurityError::from)?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, CareOpsError> {
        let parsed = PasswordHash::new(hash).map_err(SecurityError::from)?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(SecurityError::from(err).into()),
        }
    }

    fn issue_token(&self, user: &User) -> Result<AccessToken, CareOpsError> {
        let issued_at = now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            exp: (issued_at + self.token_ttl).timestamp(),
            iat: issued_at.timestamp(),
        };
        Ok(AccessToken::bearer(self.sign(&claims)?))
    }

    fn decode_token(&self, token: &str) -> Result<UserId, CareOpsError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| {
                tracing::debug!(error = %err, "rejected access token");
                AuthError::InvalidToken
            })?;
        data.claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(secret: &str) -> JwtCredentials {
        JwtCredentials::new(&Config {
            jwt_secret: secret.to_string(),
            token_ttl: Duration::minutes(60),
        })
    }

    fn user() -> User {
        User::builder()
            .email("ada@example.com")
            .full_name("Ada Lovelace")
            .password_hash("unused")
            .build()
            .unwrap()
    }

    #[test]
    fn should_verify_only_the_hashed_password() {
        let creds = credentials("secret");
        let hash = creds.hash_password("hunter22").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(creds.verify_password("hunter22", &hash).unwrap());
        assert!(!creds.verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn should_fail_when_stored_hash_is_malformed() {
        let creds = credentials("secret");
        assert!(matches!(
            creds.verify_password("hunter22", "not-a-hash"),
            Err(CareOpsError::Storage(_))
        ));
    }

    #[test]
    fn should_resolve_issued_token_to_user() {
        let creds = credentials("secret");
        let user = user();

        let token = creds.issue_token(&user).unwrap();

        assert_eq!(token.token_type, "bearer");
        assert_eq!(creds.decode_token(&token.access_token).unwrap(), user.id);
    }

    #[test]
    fn should_reject_token_signed_with_other_secret() {
        let token = credentials("one").issue_token(&user()).unwrap();

        let result = credentials("two").decode_token(&token.access_token);

        assert!(matches!(
            result,
            Err(CareOpsError::Unauthorized(AuthError::InvalidToken))
        ));
    }

    #[test]
    fn should_reject_expired_token() {
        let creds = credentials("secret");
        let issued_at = now() - Duration::hours(2);
        let expired = creds
            .sign(&Claims {
                sub: UserId::new().to_string(),
                email: "ada@example.com".to_string(),
                exp: (issued_at + Duration::hours(1)).timestamp(),
                iat: issued_at.timestamp(),
            })
            .unwrap();

        assert!(matches!(
            creds.decode_token(&expired),
            Err(CareOpsError::Unauthorized(AuthError::InvalidToken))
        ));
    }

    #[test]
    fn should_reject_garbage_token() {
        assert!(matches!(
            credentials("secret").decode_token("not.a.token"),
            Err(CareOpsError::Unauthorized(AuthError::InvalidToken))
        ));
    }
}
