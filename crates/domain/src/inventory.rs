//! Inventory items consumed by bookings.

use serde::{Deserialize, Serialize};

use crate::error::{CareOpsError, ValidationError};
use crate::id::{InventoryItemId, WorkspaceId};
use crate::time::Timestamp;

pub const DEFAULT_QUANTITY_PER_BOOKING: i64 = 1;
pub const DEFAULT_LOW_THRESHOLD: i64 = 5;
/// Upper bound on stock, consumption and threshold values.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// A stocked item. `quantity` may go negative: bookings never fail on stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub quantity: i64,
    pub quantity_per_booking: i64,
    pub low_threshold: i64,
    pub last_restocked: Option<Timestamp>,
}

impl InventoryItem {
    /// Create an item with explicit or default consumption and threshold.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] when `name` is blank or any
    /// quantity is negative.
    pub fn new(
        workspace_id: WorkspaceId,
        name: impl Into<String>,
        quantity: i64,
        quantity_per_booking: Option<i64>,
        low_threshold: Option<i64>,
    ) -> Result<Self, CareOpsError> {
        let item = Self {
            id: InventoryItemId::new(),
            workspace_id,
            name: name.into(),
            quantity,
            quantity_per_booking: quantity_per_booking.unwrap_or(DEFAULT_QUANTITY_PER_BOOKING),
            low_threshold: low_threshold.unwrap_or(DEFAULT_LOW_THRESHOLD),
            last_restocked: None,
        };
        item.validate()?;
        Ok(item)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] on a blank name, or an initial
    /// quantity, consumption or threshold outside `0..=MAX_QUANTITY`.
    pub fn validate(&self) -> Result<(), CareOpsError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }
        for (field, value) in [
            ("quantity", self.quantity),
            ("quantity_per_booking", self.quantity_per_booking),
            ("low_threshold", self.low_threshold),
        ] {
            if value < 0 {
                return Err(ValidationError::Negative { field }.into());
            }
            if value > MAX_QUANTITY {
                return Err(ValidationError::TooLarge {
                    field,
                    max: MAX_QUANTITY,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Stock at or below the alert threshold.
    #[must_use]
    pub fn is_low(&self) -> bool {
        self.quantity <= self.low_threshold
    }

    /// Take one booking's worth of stock. Saturates at `i64::MIN`.
    pub fn consume_for_booking(&mut self) {
        self.quantity = self.quantity.saturating_sub(self.quantity_per_booking);
    }

    /// Whether the last [`consume_for_booking`](Self::consume_for_booking)
    /// moved the item from above its threshold to at-or-below it.
    #[must_use]
    pub fn crossed_low_after_consumption(&self) -> bool {
        let before = self.quantity.saturating_add(self.quantity_per_booking);
        before > self.low_threshold && self.is_low()
    }

    /// Add stock and stamp the restock time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotPositive`] when `amount` is not positive
    /// and [`ValidationError::TooLarge`] when the resulting stock would exceed
    /// [`MAX_QUANTITY`]. The item is left untouched on error.
    pub fn restock(&mut self, amount: i64, at: Timestamp) -> Result<(), CareOpsError> {
        if amount <= 0 {
            return Err(ValidationError::NotPositive { field: "quantity" }.into());
        }
        let quantity = self
            .quantity
            .checked_add(amount)
            .filter(|total| *total <= MAX_QUANTITY)
            .ok_or(ValidationError::TooLarge {
                field: "quantity",
                max: MAX_QUANTITY,
            })?;
        self.quantity = quantity;
        self.last_restocked = Some(at);
        Ok(())
    }
}
