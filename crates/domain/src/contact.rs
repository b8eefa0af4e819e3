//! Contact — a customer or prospect known to a workspace.

use serde::{Deserialize, Serialize};

use crate::error::{CareOpsError, ValidationError};
use crate::id::{ContactId, WorkspaceId};
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: Timestamp,
    pub last_contacted: Option<Timestamp>,
}

impl Contact {
    /// Create a builder for constructing a [`Contact`].
    #[must_use]
    pub fn builder() -> ContactBuilder {
        ContactBuilder::default()
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
}

/// Step-by-step builder for [`Contact`].
#[derive(Debug, Default)]
pub struct ContactBuilder {
    id: Option<ContactId>,
    workspace_id: Option<WorkspaceId>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    created_at: Option<Timestamp>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ContactBuilder {
    #[must_use]
    pub fn id(mut self, id: ContactId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn workspace_id(mut self, workspace_id: WorkspaceId) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: Option<String>) -> Self {
        self.email = non_blank(email);
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: Option<String>) -> Self {
        self.phone = non_blank(phone);
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Consume the builder, validate, and return a [`Contact`].
    ///
    /// `last_contacted` is set to the creation time.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Contact, CareOpsError> {
        let created_at = self.created_at.unwrap_or_else(now);
        let contact = Contact {
            id: self.id.unwrap_or_default(),
            workspace_id: self.workspace_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            email: self.email,
            phone: self.phone,
            created_at,
            last_contacted: Some(created_at),
        };
        contact.validate()?;
        Ok(contact)
    }
}
