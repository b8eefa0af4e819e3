//! `SQLite` implementation of [`FormRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite, SqlitePool, Transaction};

use careops_app::ports::{FormRepository, SubmissionCounts};
use careops_domain::error::CareOpsError;
use careops_domain::form::{Form, FormSubmission};
use careops_domain::id::{BookingId, FormId, SubmissionId, WorkspaceId};
use careops_domain::time::Timestamp;

use crate::codec::{count, opt_ts, parse, parse_json, parse_opt_ts, parse_ts, ts};
use crate::error::StorageError;

struct Wrapper(Form);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let workspace_id: String = row.try_get("workspace_id")?;
        let required_fields: String = row.try_get("required_fields")?;
        let booking_types: String = row.try_get("booking_types")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(Form {
            id: parse(&id)?,
            workspace_id: parse(&workspace_id)?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            required_fields: parse_json(&required_fields)?,
            booking_types: parse_json(&booking_types)?,
            is_active: row.try_get("is_active")?,
            created_at: parse_ts(&created_at)?,
        }))
    }
}

struct SubmissionRow(FormSubmission);

impl<'r> FromRow<'r, SqliteRow> for SubmissionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let form_id: String = row.try_get("form_id")?;
        let workspace_id: String = row.try_get("workspace_id")?;
        let booking_id: Option<String> = row.try_get("booking_id")?;
        let data: String = row.try_get("data")?;
        let status: String = row.try_get("status")?;

        Ok(Self(FormSubmission {
            id: parse(&id)?,
            form_id: parse(&form_id)?,
            workspace_id: parse(&workspace_id)?,
            booking_id: booking_id.as_deref().map(parse).transpose()?,
            contact_email: row.try_get("contact_email")?,
            data: parse_json(&data)?,
            status: parse(&status)?,
            submitted_at: parse_opt_ts(row.try_get("submitted_at")?)?,
            due_at: parse_opt_ts(row.try_get("due_at")?)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO forms (id, workspace_id, name, description, required_fields, booking_types,
                       is_active, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const INSERT_SUBMISSION: &str = r"
    INSERT INTO form_submissions (id, form_id, workspace_id, booking_id, contact_email, data,
                                  status, submitted_at, due_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM forms WHERE id = ?";
const SELECT_BY_WORKSPACE: &str =
    "SELECT * FROM forms WHERE workspace_id = ? ORDER BY created_at, rowid";

const SELECT_SUBMISSION: &str = "SELECT * FROM form_submissions WHERE id = ?";
const SELECT_SUBMISSIONS: &str =
    "SELECT * FROM form_submissions WHERE workspace_id = ? ORDER BY due_at, rowid";
const SELECT_PENDING_FOR_BOOKING: &str =
    "SELECT * FROM form_submissions WHERE booking_id = ? AND status = 'pending' ORDER BY rowid";
const SELECT_PENDING_DUE: &str = r"
    SELECT * FROM form_submissions
    WHERE status = 'pending' AND due_at > ? AND due_at <= ?
    ORDER BY due_at, rowid
";

const COUNT_SUBMISSIONS: &str = r"
    SELECT
        COALESCE(SUM(status = 'pending'), 0),
        COALESCE(SUM(status = 'pending' AND due_at < ?2), 0),
        COALESCE(SUM(status = 'completed'), 0)
    FROM form_submissions
    WHERE workspace_id = ?1
";

const UPDATE_SUBMISSION: &str = r"
    UPDATE form_submissions
    SET contact_email = ?, data = ?, status = ?, submitted_at = ?, due_at = ?
    WHERE id = ?
";

pub(crate) async fn insert_submission(
    tx: &mut Transaction<'_, Sqlite>,
    submission: &FormSubmission,
) -> Result<(), StorageError> {
    sqlx::query(INSERT_SUBMISSION)
        .bind(submission.id.to_string())
        .bind(submission.form_id.to_string())
        .bind(submission.workspace_id.to_string())
        .bind(submission.booking_id.map(|id| id.to_string()))
        .bind(&submission.contact_email)
        .bind(serde_json::to_string(&submission.data)?)
        .bind(submission.status.as_str())
        .bind(opt_ts(submission.submitted_at))
        .bind(opt_ts(submission.due_at))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// `SQLite`-backed form and submission repository.
pub struct SqliteFormRepository {
    pool: SqlitePool,
}

impl SqliteFormRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_submissions(
        &self,
        query: &'static str,
        binds: Vec<String>,
    ) -> Result<Vec<FormSubmission>, CareOpsError> {
        let mut query = sqlx::query_as::<_, SubmissionRow>(query);
        for value in binds {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|s| s.0).collect())
    }
}

impl FormRepository for SqliteFormRepository {
    async fn create(&self, form: Form) -> Result<Form, CareOpsError> {
        let required_fields =
            serde_json::to_string(&form.required_fields).map_err(StorageError::from)?;
        let booking_types =
            serde_json::to_string(&form.booking_types).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(form.id.to_string())
            .bind(form.workspace_id.to_string())
            .bind(&form.name)
            .bind(&form.description)
            .bind(&required_fields)
            .bind(&booking_types)
            .bind(form.is_active)
            .bind(ts(form.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(form)
    }

    async fn get_by_id(&self, id: FormId) -> Result<Option<Form>, CareOpsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn list_by_workspace(&self, workspace: WorkspaceId) -> Result<Vec<Form>, CareOpsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_WORKSPACE)
            .bind(workspace.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_submission(
        &self,
        id: SubmissionId,
    ) -> Result<Option<FormSubmission>, CareOpsError> {
        let row: Option<SubmissionRow> = sqlx::query_as(SELECT_SUBMISSION)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|s| s.0))
    }

    async fn list_submissions(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<FormSubmission>, CareOpsError> {
        self.fetch_submissions(SELECT_SUBMISSIONS, vec![workspace.to_string()])
            .await
    }

    async fn pending_for_booking(
        &self,
        booking: BookingId,
    ) -> Result<Vec<FormSubmission>, CareOpsError> {
        self.fetch_submissions(SELECT_PENDING_FOR_BOOKING, vec![booking.to_string()])
            .await
    }

    async fn pending_due_between(
        &self,
        after: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<FormSubmission>, CareOpsError> {
        self.fetch_submissions(SELECT_PENDING_DUE, vec![ts(after), ts(until)])
            .await
    }

    async fn update_submission(
        &self,
        submission: FormSubmission,
    ) -> Result<FormSubmission, CareOpsError> {
        let data = serde_json::to_string(&submission.data).map_err(StorageError::from)?;

        sqlx::query(UPDATE_SUBMISSION)
            .bind(&submission.contact_email)
            .bind(&data)
            .bind(submission.status.as_str())
            .bind(opt_ts(submission.submitted_at))
            .bind(opt_ts(submission.due_at))
            .bind(submission.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(submission)
    }

    async fn submission_counts(
        &self,
        workspace: WorkspaceId,
        now: Timestamp,
    ) -> Result<SubmissionCounts, CareOpsError> {
        let (pending, overdue, completed): (i64, i64, i64) = sqlx::query_as(COUNT_SUBMISSIONS)
            .bind(workspace.to_string())
            .bind(ts(now))
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(SubmissionCounts {
            pending: count(pending),
            overdue: count(overdue),
            completed: count(completed),
        })
    }
}
