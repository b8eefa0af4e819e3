//! Dashboard aggregate counts and the alerts derived from them.

use serde::{Deserialize, Serialize};

/// Workspace-scoped counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub today_bookings: u64,
    pub upcoming_bookings: u64,
    pub open_conversations: u64,
    pub pending_forms: u64,
    pub overdue_forms: u64,
    pub completed_forms: u64,
    pub low_inventory_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl DashboardStats {
    /// Alerts to surface for these counts, most informational first.
    #[must_use]
    pub fn alerts(&self) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if self.today_bookings == 0 {
            alerts.push(Alert::new(
                AlertLevel::Info,
                "No bookings scheduled for today",
            ));
        }
        if self.pending_forms > 0 {
            alerts.push(Alert::new(
                AlertLevel::Warning,
                format!("{} forms pending completion", self.pending_forms),
            ));
        }
        if self.overdue_forms > 0 {
            alerts.push(Alert::new(
                AlertLevel::Alert,
                format!("{} forms overdue", self.overdue_forms),
            ));
        }
        if self.low_inventory_count > 0 {
            alerts.push(Alert::new(
                AlertLevel::Alert,
                format!("{} inventory items low", self.low_inventory_count),
            ));
        }
        alerts
    }
}
