//! Workspace — a tenant that owns contacts, bookings, forms, inventory and staff.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CareOpsError, ValidationError};
use crate::id::{UserId, WorkspaceId};
use crate::time::{Timestamp, now};

/// Lifecycle state of a [`Workspace`]. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    Draft,
    Active,
}

impl WorkspaceStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
        }
    }
}

impl std::str::FromStr for WorkspaceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            other => Err(ValidationError::UnknownValue {
                kind: "workspace status",
                value: other.to_string(),
            }),
        }
    }
}

/// A tenant owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub owner_id: UserId,
    pub name: String,
    pub address: Option<String>,
    pub timezone: String,
    pub contact_email: Option<String>,
    pub status: WorkspaceStatus,
    pub created_at: Timestamp,
}

/// Facts about a workspace that gate its activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationChecklist {
    pub booking_count: u64,
    pub form_count: u64,
}

/// One unmet activation precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationBlocker {
    NoBookingTypes,
    NoContactEmail,
    NoForms,
}

impl fmt::Display for ActivationBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoBookingTypes => "At least one booking type must be created",
            Self::NoContactEmail => "Communication channel (email) must be configured",
            Self::NoForms => "At least one form template should be created for customers",
        };
        f.write_str(text)
    }
}

impl Workspace {
    /// Create a builder for constructing a [`Workspace`].
    #[must_use]
    pub fn builder() -> WorkspaceBuilder {
        WorkspaceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), CareOpsError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Every precondition that currently prevents activation, in a stable order.
    #[must_use]
    pub fn activation_blockers(&self, checklist: ActivationChecklist) -> Vec<ActivationBlocker> {
        let mut blockers = Vec::new();
        if checklist.booking_count == 0 {
            blockers.push(ActivationBlocker::NoBookingTypes);
        }
        if self
            .contact_email
            .as_deref()
            .is_none_or(|email| email.trim().is_empty())
        {
            blockers.push(ActivationBlocker::NoContactEmail);
        }
        if checklist.form_count == 0 {
            blockers.push(ActivationBlocker::NoForms);
        }
        blockers
    }

    /// Move the workspace to [`WorkspaceStatus::Active`].
    ///
    /// Activating an already active workspace is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ActivationBlocked`] listing every unmet
    /// precondition; the status is left unchanged.
    pub fn activate(&mut self, checklist: ActivationChecklist) -> Result<(), CareOpsError> {
        if self.status == WorkspaceStatus::Active {
            return Ok(());
        }
        let blockers = self.activation_blockers(checklist);
        if !blockers.is_empty() {
            return Err(ValidationError::ActivationBlocked(blockers).into());
        }
        self.status = WorkspaceStatus::Active;
        Ok(())
    }
}

/// Step-by-step builder for [`Workspace`].
#[derive(Debug, Default)]
pub struct WorkspaceBuilder {
    id: Option<WorkspaceId>,
    owner_id: Option<UserId>,
    name: Option<String>,
    address: Option<String>,
    timezone: Option<String>,
    contact_email: Option<String>,
    created_at: Option<Timestamp>,
}

impl WorkspaceBuilder {
    #[must_use]
    pub fn id(mut self, id: WorkspaceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn owner_id(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: Option<String>) -> Self {
        self.address = address;
        self
    }

    #[must_use]
    pub fn timezone(mut self, timezone: Option<String>) -> Self {
        self.timezone = timezone.filter(|tz| !tz.trim().is_empty());
        self
    }

    #[must_use]
    pub fn contact_email(mut self, contact_email: Option<String>) -> Self {
        self.contact_email = contact_email;
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Consume the builder, validate, and return a draft [`Workspace`].
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Workspace, CareOpsError> {
        let workspace = Workspace {
            id: self.id.unwrap_or_default(),
            owner_id: self.owner_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            address: self.address,
            timezone: self.timezone.unwrap_or_else(|| "UTC".to_string()),
            contact_email: self.contact_email,
            status: WorkspaceStatus::Draft,
            created_at: self.created_at.unwrap_or_else(now),
        };
        workspace.validate()?;
        Ok(workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(contact_email: Option<&str>) -> Workspace {
        Workspace::builder()
            .owner_id(UserId::new())
            .name("Sunrise Clinic")
            .contact_email(contact_email.map(str::to_string))
            .build()
            .unwrap()
    }

    #[test]
    fn should_start_as_draft_with_utc_timezone() {
        let ws = workspace(None);
        assert_eq!(ws.status, WorkspaceStatus::Draft);
        assert_eq!(ws.timezone, "UTC");
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Workspace::builder().owner_id(UserId::new()).build();
        assert!(matches!(
            result,
            Err(CareOpsError::Validation(ValidationError::EmptyField {
                field: "name"
            }))
        ));
    }

    #[test]
    fn should_activate_when_all_preconditions_hold() {
        let mut ws = workspace(Some("desk@clinic.test"));
        ws.activate(ActivationChecklist {
            booking_count: 1,
            form_count: 1,
        })
        .unwrap();
        assert_eq!(ws.status, WorkspaceStatus::Active);
    }

    #[test]
    fn should_report_every_blocker_and_stay_draft_when_nothing_is_set_up() {
        let mut ws = workspace(None);
        let result = ws.activate(ActivationChecklist::default());

        let Err(CareOpsError::Validation(ValidationError::ActivationBlocked(blockers))) = result
        else {
            panic!("expected activation to be blocked");
        };
        assert_eq!(
            blockers,
            vec![
                ActivationBlocker::NoBookingTypes,
                ActivationBlocker::NoContactEmail,
                ActivationBlocker::NoForms,
            ]
        );
        assert_eq!(ws.status, WorkspaceStatus::Draft);
    }

    #[test]
    fn should_treat_blank_contact_email_as_missing() {
        let ws = workspace(Some("   "));
        let blockers = ws.activation_blockers(ActivationChecklist {
            booking_count: 3,
            form_count: 2,
        });
        assert_eq!(blockers, vec![ActivationBlocker::NoContactEmail]);
    }

    #[test]
    fn should_succeed_without_checks_when_already_active() {
        let mut ws = workspace(None);
        ws.status = WorkspaceStatus::Active;
        assert!(ws.activate(ActivationChecklist::default()).is_ok());
        assert_eq!(ws.status, WorkspaceStatus::Active);
    }
}
