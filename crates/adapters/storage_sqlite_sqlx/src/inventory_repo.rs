//! `SQLite` implementation of [`InventoryRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use careops_app::ports::InventoryRepository;
use careops_domain::error::CareOpsError;
use careops_domain::id::{InventoryItemId, WorkspaceId};
use careops_domain::inventory::InventoryItem;

use crate::codec::{count, opt_ts, parse, parse_opt_ts};
use crate::error::StorageError;

pub(crate) struct ItemRow(pub(crate) InventoryItem);

impl<'r> FromRow<'r, SqliteRow> for ItemRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let workspace_id: String = row.try_get("workspace_id")?;

        Ok(Self(InventoryItem {
            id: parse(&id)?,
            workspace_id: parse(&workspace_id)?,
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
            quantity_per_booking: row.try_get("quantity_per_booking")?,
            low_threshold: row.try_get("low_threshold")?,
            last_restocked: parse_opt_ts(row.try_get("last_restocked")?)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO inventory_items (id, workspace_id, name, quantity, quantity_per_booking,
                                 low_threshold, last_restocked)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM inventory_items WHERE id = ?";
pub(crate) const SELECT_BY_WORKSPACE: &str =
    "SELECT * FROM inventory_items WHERE workspace_id = ? ORDER BY name, rowid";
const COUNT_LOW: &str =
    "SELECT COUNT(*) FROM inventory_items WHERE workspace_id = ? AND quantity <= low_threshold";

const UPDATE: &str = r"
    UPDATE inventory_items
    SET name = ?, quantity = ?, quantity_per_booking = ?, low_threshold = ?, last_restocked = ?
    WHERE id = ?
";

/// `SQLite`-backed inventory repository.
pub struct SqliteInventoryRepository {
    pool: SqlitePool,
}

impl SqliteInventoryRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl InventoryRepository for SqliteInventoryRepository {
    async fn create(&self, item: InventoryItem) -> Result<InventoryItem, CareOpsError> {
        sqlx::query(INSERT)
            .bind(item.id.to_string())
            .bind(item.workspace_id.to_string())
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.quantity_per_booking)
            .bind(item.low_threshold)
            .bind(opt_ts(item.last_restocked))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(item)
    }

    async fn get_by_id(&self, id: InventoryItemId) -> Result<Option<InventoryItem>, CareOpsError> {
        let row: Option<ItemRow> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<InventoryItem>, CareOpsError> {
        let rows: Vec<ItemRow> = sqlx::query_as(SELECT_BY_WORKSPACE)
            .bind(workspace.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, item: InventoryItem) -> Result<InventoryItem, CareOpsError> {
        sqlx::query(UPDATE)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.quantity_per_booking)
            .bind(item.low_threshold)
            .bind(opt_ts(item.last_restocked))
            .bind(item.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(item)
    }

    async fn count_low(&self, workspace: WorkspaceId) -> Result<u64, CareOpsError> {
        let (n,): (i64,) = sqlx::query_as(COUNT_LOW)
            .bind(workspace.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(count(n))
    }
}
