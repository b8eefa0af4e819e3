//! Staff membership of a user in a workspace.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{StaffId, UserId, WorkspaceId};
use crate::permission::Capability;
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    #[default]
    Staff,
    Manager,
}

impl StaffRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Manager => "manager",
        }
    }
}

impl std::str::FromStr for StaffRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(Self::Staff),
            "manager" => Ok(Self::Manager),
            other => Err(ValidationError::UnknownValue {
                kind: "staff role",
                value: other.to_string(),
            }),
        }
    }
}

/// Capability flags granted to a staff member. All default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffPermissions {
    pub can_manage_inbox: bool,
    pub can_manage_bookings: bool,
    pub can_view_inventory: bool,
}

impl Default for StaffPermissions {
    fn default() -> Self {
        Self {
            can_manage_inbox: true,
            can_manage_bookings: true,
            can_view_inventory: true,
        }
    }
}

/// Association of a user to a workspace. At most one per (workspace, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: StaffRole,
    #[serde(flatten)]
    pub permissions: StaffPermissions,
    pub created_at: Timestamp,
}

impl StaffMember {
    #[must_use]
    pub fn new(
        workspace_id: WorkspaceId,
        user_id: UserId,
        role: StaffRole,
        permissions: StaffPermissions,
    ) -> Self {
        Self {
            id: StaffId::new(),
            workspace_id,
            user_id,
            role,
            permissions,
            created_at: now(),
        }
    }

    /// Whether this membership grants `capability`.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Inbox => self.permissions.can_manage_inbox,
            Capability::Bookings => self.permissions.can_manage_bookings,
            Capability::Inventory => self.permissions.can_view_inventory,
        }
    }
}
