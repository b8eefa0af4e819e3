//! `SQLite` implementation of [`BookingRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use careops_app::ports::{BookingCommit, BookingRepository};
use careops_domain::booking::Booking;
use careops_domain::error::CareOpsError;
use careops_domain::form::FormSubmission;
use careops_domain::id::{BookingId, WorkspaceId};
use careops_domain::time::Timestamp;

use crate::codec::{count, parse, parse_ts, ts};
use crate::error::StorageError;
use crate::form_repo::insert_submission;
use crate::inventory_repo::{self, ItemRow};

struct Wrapper(Booking);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let workspace_id: String = row.try_get("workspace_id")?;
        let contact_id: String = row.try_get("contact_id")?;
        let scheduled_at: String = row.try_get("scheduled_at")?;
        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(Booking {
            id: parse(&id)?,
            workspace_id: parse(&workspace_id)?,
            contact_id: parse(&contact_id)?,
            booking_type: row.try_get("booking_type")?,
            scheduled_at: parse_ts(&scheduled_at)?,
            duration_minutes: row.try_get("duration_minutes")?,
            location: row.try_get("location")?,
            status: parse(&status)?,
            notes: row.try_get("notes")?,
            forms_sent: row.try_get("forms_sent")?,
            created_at: parse_ts(&created_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO bookings (id, workspace_id, contact_id, booking_type, scheduled_at,
                          duration_minutes, location, status, notes, forms_sent, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

// Saturates at the bound instead of letting SQLite promote the column to REAL.
const CONSUME_INVENTORY: &str = r"
    UPDATE inventory_items
    SET quantity = CASE
        WHEN quantity >= ? + quantity_per_booking THEN quantity - quantity_per_booking
        ELSE ?
    END
    WHERE workspace_id = ?
";

const SELECT_BY_ID: &str = "SELECT * FROM bookings WHERE id = ?";
const SELECT_BY_WORKSPACE: &str =
    "SELECT * FROM bookings WHERE workspace_id = ? ORDER BY scheduled_at, rowid";
const SELECT_RECENT: &str = r"
    SELECT * FROM bookings WHERE workspace_id = ?
    ORDER BY created_at DESC, rowid DESC
    LIMIT ?
";
const COUNT_FROM: &str =
    "SELECT COUNT(*) FROM bookings WHERE workspace_id = ? AND scheduled_at >= ?";
const COUNT_BETWEEN: &str = r"
    SELECT COUNT(*) FROM bookings
    WHERE workspace_id = ? AND scheduled_at >= ? AND scheduled_at < ?
";

const UPDATE: &str = r"
    UPDATE bookings
    SET booking_type = ?, scheduled_at = ?, duration_minutes = ?, location = ?, status = ?,
        notes = ?, forms_sent = ?
    WHERE id = ?
";

/// `SQLite`-backed booking repository.
pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl BookingRepository for SqliteBookingRepository {
    async fn create_with_effects(
        &self,
        booking: Booking,
        submissions: Vec<FormSubmission>,
    ) -> Result<BookingCommit, CareOpsError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(booking.id.to_string())
            .bind(booking.workspace_id.to_string())
            .bind(booking.contact_id.to_string())
            .bind(&booking.booking_type)
            .bind(ts(booking.scheduled_at))
            .bind(booking.duration_minutes)
            .bind(&booking.location)
            .bind(booking.status.as_str())
            .bind(&booking.notes)
            .bind(booking.forms_sent)
            .bind(ts(booking.created_at))
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        sqlx::query(CONSUME_INVENTORY)
            .bind(i64::MIN)
            .bind(i64::MIN)
            .bind(booking.workspace_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        for submission in &submissions {
            insert_submission(&mut tx, submission).await?;
        }

        let inventory: Vec<ItemRow> = sqlx::query_as(inventory_repo::SELECT_BY_WORKSPACE)
            .bind(booking.workspace_id.to_string())
            .fetch_all(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;
        tracing::debug!(
            booking_id = %booking.id,
            submissions = submissions.len(),
            items = inventory.len(),
            "booking committed"
        );

        Ok(BookingCommit {
            booking,
            submissions,
            inventory: inventory.into_iter().map(|i| i.0).collect(),
        })
    }

    async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>, CareOpsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn list_by_workspace(&self, workspace: WorkspaceId) -> Result<Vec<Booking>, CareOpsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_WORKSPACE)
            .bind(workspace.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn recent_by_workspace(
        &self,
        workspace: WorkspaceId,
        limit: usize,
    ) -> Result<Vec<Booking>, CareOpsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(workspace.to_string())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn count_scheduled(
        &self,
        workspace: WorkspaceId,
        from: Timestamp,
        until: Option<Timestamp>,
    ) -> Result<u64, CareOpsError> {
        let query = match until {
            Some(until) => sqlx::query_as(COUNT_BETWEEN)
                .bind(workspace.to_string())
                .bind(ts(from))
                .bind(ts(until)),
            None => sqlx::query_as(COUNT_FROM)
                .bind(workspace.to_string())
                .bind(ts(from)),
        };
        let (n,): (i64,) = query
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(count(n))
    }

    async fn update(&self, booking: Booking) -> Result<Booking, CareOpsError> {
        sqlx::query(UPDATE)
            .bind(&booking.booking_type)
            .bind(ts(booking.scheduled_at))
            .bind(booking.duration_minutes)
            .bind(&booking.location)
            .bind(booking.status.as_str())
            .bind(&booking.notes)
            .bind(booking.forms_sent)
            .bind(booking.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(booking)
    }
}
