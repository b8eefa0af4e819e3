//! `SQLite` implementation of [`WorkspaceRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use careops_app::ports::WorkspaceRepository;
use careops_domain::error::CareOpsError;
use careops_domain::id::{UserId, WorkspaceId};
use careops_domain::workspace::{ActivationChecklist, Workspace};

use crate::codec::{count, parse, parse_ts, ts};
use crate::error::StorageError;

struct Wrapper(Workspace);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let owner_id: String = row.try_get("owner_id")?;
        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(Workspace {
            id: parse(&id)?,
            owner_id: parse(&owner_id)?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            timezone: row.try_get("timezone")?,
            contact_email: row.try_get("contact_email")?,
            status: parse(&status)?,
            created_at: parse_ts(&created_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO workspaces (id, owner_id, name, address, timezone, contact_email, status, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM workspaces WHERE id = ?";
const SELECT_BY_OWNER: &str =
    "SELECT * FROM workspaces WHERE owner_id = ? ORDER BY created_at, rowid";

const UPDATE: &str = r"
    UPDATE workspaces
    SET name = ?, address = ?, timezone = ?, contact_email = ?, status = ?
    WHERE id = ?
";

const CHECKLIST: &str = r"
    SELECT
        (SELECT COUNT(*) FROM bookings WHERE workspace_id = ?1) AS booking_count,
        (SELECT COUNT(*) FROM forms WHERE workspace_id = ?1) AS form_count
";

/// `SQLite`-backed workspace repository.
pub struct SqliteWorkspaceRepository {
    pool: SqlitePool,
}

impl SqliteWorkspaceRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl WorkspaceRepository for SqliteWorkspaceRepository {
    async fn create(&self, workspace: Workspace) -> Result<Workspace, CareOpsError> {
        sqlx::query(INSERT)
            .bind(workspace.id.to_string())
            .bind(workspace.owner_id.to_string())
            .bind(&workspace.name)
            .bind(&workspace.address)
            .bind(&workspace.timezone)
            .bind(&workspace.contact_email)
            .bind(workspace.status.as_str())
            .bind(ts(workspace.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(workspace)
    }

    async fn get_by_id(&self, id: WorkspaceId) -> Result<Option<Workspace>, CareOpsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Workspace>, CareOpsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_OWNER)
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, workspace: Workspace) -> Result<Workspace, CareOpsError> {
        sqlx::query(UPDATE)
            .bind(&workspace.name)
            .bind(&workspace.address)
            .bind(&workspace.timezone)
            .bind(&workspace.contact_email)
            .bind(workspace.status.as_str())
            .bind(workspace.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(workspace)
    }

    async fn activation_checklist(
        &self,
        id: WorkspaceId,
    ) -> Result<ActivationChecklist, CareOpsError> {
        let (bookings, forms): (i64, i64) = sqlx::query_as(CHECKLIST)
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(ActivationChecklist {
            booking_count: count(bookings),
            form_count: count(forms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use careops_app::ports::{FormRepository, Store};
    use careops_domain::form::Form;
    use careops_domain::workspace::WorkspaceStatus;

    #[tokio::test]
    async fn should_list_owned_workspaces_oldest_first() {
        let store = test_support::store().await;
        let first = test_support::workspace(&store).await;
        let second = Workspace::builder()
            .owner_id(first.owner_id)
            .name("Second site")
            .created_at(first.created_at + chrono::Duration::seconds(1))
            .build()
            .unwrap();
        store.workspaces().create(second.clone()).await.unwrap();

        let owned = store.workspaces().list_by_owner(first.owner_id).await.unwrap();

        let names: Vec<&str> = owned.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["Clinic", "Second site"]);
        assert!(
            store
                .workspaces()
                .list_by_owner(UserId::new())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn should_persist_status_and_settings_on_update() {
        let store = test_support::store().await;
        let mut workspace = test_support::workspace(&store).await;
        workspace.status = WorkspaceStatus::Active;
        workspace.contact_email = Some("desk@clinic.test".to_string());
        workspace.timezone = "Europe/Paris".to_string();

        store.workspaces().update(workspace.clone()).await.unwrap();
        let fetched = store
            .workspaces()
            .get_by_id(workspace.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched.status, WorkspaceStatus::Active);
        assert_eq!(fetched.contact_email.as_deref(), Some("desk@clinic.test"));
        assert_eq!(fetched.timezone, "Europe/Paris");
    }

    #[tokio::test]
    async fn should_count_forms_in_activation_checklist() {
        let store = test_support::store().await;
        let workspace = test_support::workspace(&store).await;
        let other = test_support::workspace(&store).await;
        let form = Form::new(workspace.id, "Intake", None, Vec::new(), Vec::new()).unwrap();
        store.forms().create(form).await.unwrap();

        let checklist = store
            .workspaces()
            .activation_checklist(workspace.id)
            .await
            .unwrap();
        let empty = store
            .workspaces()
            .activation_checklist(other.id)
            .await
            .unwrap();

        assert_eq!(checklist.form_count, 1);
        assert_eq!(checklist.booking_count, 0);
        assert_eq!(empty, ActivationChecklist::default());
    }
}
