//! `SQLite` implementation of [`UserRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use careops_app::ports::UserRepository;
use careops_domain::error::{CareOpsError, ValidationError};
use careops_domain::id::UserId;
use careops_domain::user::{User, VerificationCode};

use crate::codec::{parse, parse_opt_ts, parse_ts, ts};
use crate::error::StorageError;

struct Wrapper(User);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let created_at: String = row.try_get("created_at")?;
        let code: Option<String> = row.try_get("verification_code")?;
        let expires_at = parse_opt_ts(row.try_get("verification_expires_at")?)?;

        let verification = match (code, expires_at) {
            (Some(code), Some(expires_at)) => Some(VerificationCode { code, expires_at }),
            _ => None,
        };

        Ok(Self(User {
            id: parse(&id)?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            phone_number: row.try_get("phone_number")?,
            password_hash: row.try_get("password_hash")?,
            is_active: row.try_get("is_active")?,
            phone_verified: row.try_get("phone_verified")?,
            verification,
            created_at: parse_ts(&created_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO users (id, email, full_name, phone_number, password_hash, is_active,
                       phone_verified, verification_code, verification_expires_at, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM users WHERE id = ?";
const SELECT_BY_EMAIL: &str = "SELECT * FROM users WHERE email = ?";

const UPDATE: &str = r"
    UPDATE users
    SET email = ?, full_name = ?, phone_number = ?, password_hash = ?, is_active = ?,
        phone_verified = ?, verification_code = ?, verification_expires_at = ?
    WHERE id = ?
";

/// Map a violated `users.email` constraint to the domain error.
fn email_conflict(err: sqlx::Error) -> CareOpsError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        return ValidationError::EmailTaken.into();
    }
    StorageError::from(err).into()
}

/// `SQLite`-backed user repository.
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: User) -> Result<User, CareOpsError> {
        let verification = user.verification.as_ref();
        sqlx::query(INSERT)
            .bind(user.id.to_string())
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.phone_number)
            .bind(&user.password_hash)
            .bind(user.is_active)
            .bind(user.phone_verified)
            .bind(verification.map(|v| v.code.clone()))
            .bind(verification.map(|v| ts(v.expires_at)))
            .bind(ts(user.created_at))
            .execute(&self.pool)
            .await
            .map_err(email_conflict)?;

        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, CareOpsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CareOpsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_EMAIL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn update(&self, user: User) -> Result<User, CareOpsError> {
        let verification = user.verification.as_ref();
        sqlx::query(UPDATE)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.phone_number)
            .bind(&user.password_hash)
            .bind(user.is_active)
            .bind(user.phone_verified)
            .bind(verification.map(|v| v.code.clone()))
            .bind(verification.map(|v| ts(v.expires_at)))
            .bind(user.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(email_conflict)?;

        Ok(user)
    }
}
