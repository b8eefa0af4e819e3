//! Workspace-scoped authorization.
//!
//! Every workspace-scoped operation names the [`Access`] it requires. The
//! owner passes every check; a staff member passes a [`Access::Capability`]
//! check only when the matching flag is set on their membership. Everyone
//! else is denied.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::UserId;
use crate::staff::StaffMember;
use crate::workspace::Workspace;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
}

/// A staff-grantable capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Inbox,
    Bookings,
    Inventory,
}

impl Capability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Bookings => "bookings",
            Self::Inventory => "inventory",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = Denied;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbox" => Ok(Self::Inbox),
            "bookings" => Ok(Self::Bookings),
            "inventory" => Ok(Self::Inventory),
            other => Err(Denied::UnknownCapability(other.to_string())),
        }
    }
}

/// What an operation requires from its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only the workspace owner.
    Owner,
    /// The owner, or a staff member holding the capability.
    Capability(Capability),
}

/// Why a caller was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denied {
    #[error("only the workspace owner may perform this action")]
    NotOwner,

    #[error("not a staff member of this workspace")]
    NotStaff,

    #[error("missing {0} permission")]
    MissingPermission(Capability),

    #[error("unknown permission: {0}")]
    UnknownCapability(String),
}

/// Decide whether `user_id` may perform an operation requiring `access` in `workspace`.
///
/// `staff` is the caller's membership in `workspace`, if any.
///
/// # Errors
///
/// Returns the [`Denied`] reason when the caller is refused.
pub fn evaluate(
    workspace: &Workspace,
    user_id: UserId,
    staff: Option<&StaffMember>,
    access: Access,
) -> Result<(), Denied> {
    if workspace.is_owned_by(user_id) {
        return Ok(());
    }
    let capability = match access {
        Access::Owner => return Err(Denied::NotOwner),
        Access::Capability(capability) => capability,
    };
    let Some(staff) = staff.filter(|s| s.workspace_id == workspace.id && s.user_id == user_id)
    else {
        return Err(Denied::NotStaff);
    };
    if staff.allows(capability) {
        Ok(())
    } else {
        Err(Denied::MissingPermission(capability))
    }
}
