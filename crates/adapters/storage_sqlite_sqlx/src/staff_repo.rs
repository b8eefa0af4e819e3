//! `SQLite` implementation of [`StaffRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use careops_app::ports::StaffRepository;
use careops_domain::error::{CareOpsError, ValidationError};
use careops_domain::id::{StaffId, UserId, WorkspaceId};
use careops_domain::staff::{StaffMember, StaffPermissions};

use crate::codec::{parse, parse_ts, ts};
use crate::error::StorageError;

struct Wrapper(StaffMember);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let workspace_id: String = row.try_get("workspace_id")?;
        let user_id: String = row.try_get("user_id")?;
        let role: String = row.try_get("role")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(StaffMember {
            id: parse(&id)?,
            workspace_id: parse(&workspace_id)?,
            user_id: parse(&user_id)?,
            role: parse(&role)?,
            permissions: StaffPermissions {
                can_manage_inbox: row.try_get("can_manage_inbox")?,
                can_manage_bookings: row.try_get("can_manage_bookings")?,
                can_view_inventory: row.try_get("can_view_inventory")?,
            },
            created_at: parse_ts(&created_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO staff_members (id, workspace_id, user_id, role, can_manage_inbox,
                               can_manage_bookings, can_view_inventory, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM staff_members WHERE id = ?";
const SELECT_MEMBERSHIP: &str =
    "SELECT * FROM staff_members WHERE workspace_id = ? AND user_id = ?";
const SELECT_BY_WORKSPACE: &str =
    "SELECT * FROM staff_members WHERE workspace_id = ? ORDER BY created_at, rowid";

const UPDATE: &str = r"
    UPDATE staff_members
    SET role = ?, can_manage_inbox = ?, can_manage_bookings = ?, can_view_inventory = ?
    WHERE id = ?
";

/// `SQLite`-backed staff repository.
pub struct SqliteStaffRepository {
    pool: SqlitePool,
}

impl SqliteStaffRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl StaffRepository for SqliteStaffRepository {
    async fn create(&self, staff: StaffMember) -> Result<StaffMember, CareOpsError> {
        let result = sqlx::query(INSERT)
            .bind(staff.id.to_string())
            .bind(staff.workspace_id.to_string())
            .bind(staff.user_id.to_string())
            .bind(staff.role.as_str())
            .bind(staff.permissions.can_manage_inbox)
            .bind(staff.permissions.can_manage_bookings)
            .bind(staff.permissions.can_view_inventory)
            .bind(ts(staff.created_at))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(staff),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(ValidationError::AlreadyStaff.into())
            }
            Err(err) => Err(StorageError::from(err).into()),
        }
    }

    async fn get_by_id(&self, id: StaffId) -> Result<Option<StaffMember>, CareOpsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn find(
        &self,
        workspace: WorkspaceId,
        user: UserId,
    ) -> Result<Option<StaffMember>, CareOpsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_MEMBERSHIP)
            .bind(workspace.to_string())
            .bind(user.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<StaffMember>, CareOpsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_WORKSPACE)
            .bind(workspace.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, staff: StaffMember) -> Result<StaffMember, CareOpsError> {
        sqlx::query(UPDATE)
            .bind(staff.role.as_str())
            .bind(staff.permissions.can_manage_inbox)
            .bind(staff.permissions.can_manage_bookings)
            .bind(staff.permissions.can_view_inventory)
            .bind(staff.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(staff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use careops_app::ports::{Store, UserRepository};
    use careops_domain::staff::StaffRole;
    use careops_domain::user::User;

    async fn member(store: &crate::SqliteStore) -> (WorkspaceId, User) {
        let workspace = test_support::workspace(store).await;
        let user = User::builder()
            .email("sam@clinic.test")
            .full_name("Sam Staff")
            .password_hash("hash")
            .build()
            .unwrap();
        store.users().create(user.clone()).await.unwrap();
        (workspace.id, user)
    }

    #[tokio::test]
    async fn should_find_membership_by_workspace_and_user() {
        let store = test_support::store().await;
        let (workspace_id, user) = member(&store).await;
        let staff = StaffMember::new(
            workspace_id,
            user.id,
            StaffRole::Manager,
            StaffPermissions {
                can_view_inventory: false,
                ..StaffPermissions::default()
            },
        );
        store.staff().create(staff.clone()).await.unwrap();

        let found = store
            .staff()
            .find(workspace_id, user.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, staff.id);
        assert_eq!(found.role, StaffRole::Manager);
        assert!(found.permissions.can_manage_inbox);
        assert!(!found.permissions.can_view_inventory);
        assert!(
            store
                .staff()
                .find(workspace_id, UserId::new())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn should_reject_second_membership_for_same_user() {
        let store = test_support::store().await;
        let (workspace_id, user) = member(&store).await;
        let role = StaffRole::Staff;
        store
            .staff()
            .create(StaffMember::new(workspace_id, user.id, role, StaffPermissions::default()))
            .await
            .unwrap();

        let again = store
            .staff()
            .create(StaffMember::new(workspace_id, user.id, role, StaffPermissions::default()))
            .await;

        assert!(matches!(
            again,
            Err(CareOpsError::Validation(ValidationError::AlreadyStaff))
        ));
    }

    #[tokio::test]
    async fn should_update_permissions() {
        let store = test_support::store().await;
        let (workspace_id, user) = member(&store).await;
        let mut staff = StaffMember::new(
            workspace_id,
            user.id,
            StaffRole::Staff,
            StaffPermissions::default(),
        );
        store.staff().create(staff.clone()).await.unwrap();

        staff.permissions.can_manage_bookings = false;
        store.staff().update(staff.clone()).await.unwrap();

        let listed = store.staff().list_by_workspace(workspace_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].permissions.can_manage_bookings);
    }
}
