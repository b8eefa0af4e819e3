//! Inventory service — stock levels and restocking.

use std::sync::Arc;

use serde::Serialize;

use careops_domain::error::{CareOpsError, NotFoundError};
use careops_domain::id::{InventoryItemId, WorkspaceId};
use careops_domain::inventory::InventoryItem;
use careops_domain::permission::{Access, Capability, Principal};
use careops_domain::time::now;

use crate::automation_engine::{AutomationEngine, AutomationEvent};
use crate::ports::{InventoryRepository, Notifier, Store};
use crate::services::AccessControl;

/// Input for [`InventoryService::create`]; `None` picks the defaults.
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub name: String,
    pub quantity: i64,
    pub quantity_per_booking: Option<i64>,
    pub low_threshold: Option<i64>,
}

/// An item with its derived low-stock flag.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub is_low: bool,
}

impl From<InventoryItem> for ItemView {
    fn from(item: InventoryItem) -> Self {
        Self {
            is_low: item.is_low(),
            item,
        }
    }
}

pub struct InventoryService<S, N> {
    store: Arc<S>,
    access: AccessControl<S>,
    engine: Arc<AutomationEngine<S, N>>,
}

impl<S: Store, N: Notifier> InventoryService<S, N> {
    pub fn new(store: Arc<S>, engine: Arc<AutomationEngine<S, N>>) -> Self {
        Self {
            access: AccessControl::new(Arc::clone(&store)),
            store,
            engine,
        }
    }

    /// Add an item. An item created already low alerts the owner.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] on a blank name or a negative
    /// amount, or an access or storage error.
    #[tracing::instrument(skip(self, principal, input), fields(workspace_id = %workspace_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        input: NewItem,
    ) -> Result<ItemView, CareOpsError> {
        let workspace = self
            .access
            .authorize(principal, workspace_id, Access::Owner)
            .await?;
        let item = InventoryItem::new(
            workspace_id,
            input.name.trim(),
            input.quantity,
            input.quantity_per_booking,
            input.low_threshold,
        )?;
        let item = self.store.inventory().create(item).await?;
        tracing::info!(item_id = %item.id, "inventory item created");

        if item.is_low() {
            self.engine
                .dispatch(AutomationEvent::InventoryLow {
                    item: item.clone(),
                    workspace,
                })
                .await;
        }
        Ok(item.into())
    }

    /// # Errors
    ///
    /// Returns an access or storage error.
    pub async fn list(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<ItemView>, CareOpsError> {
        self.access
            .authorize(
                principal,
                workspace_id,
                Access::Capability(Capability::Inventory),
            )
            .await?;
        let items = self.store.inventory().list_by_workspace(workspace_id).await?;
        Ok(items.into_iter().map(ItemView::from).collect())
    }

    /// Add `amount` units and stamp the restock time.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] when `amount` is not positive,
    /// [`CareOpsError::NotFound`] for an item outside the workspace, or an
    /// access or storage error.
    #[tracing::instrument(skip(self, principal), fields(workspace_id = %workspace_id, item_id = %id))]
    pub async fn restock(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        id: InventoryItemId,
        amount: i64,
    ) -> Result<ItemView, CareOpsError> {
        self.access
            .authorize(principal, workspace_id, Access::Owner)
            .await?;
        let mut item = self
            .store
            .inventory()
            .get_by_id(id)
            .await?
            .filter(|i| i.workspace_id == workspace_id)
            .ok_or_else(|| NotFoundError::new("InventoryItem", id))?;
        item.restock(amount, now())?;
        let item = self.store.inventory().update(item).await?;
        tracing::info!(quantity = item.quantity, "inventory restocked");
        Ok(item.into())
    }
}
