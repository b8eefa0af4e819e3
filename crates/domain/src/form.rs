//! Forms and the submissions created for bookings.

use serde::{Deserialize, Serialize};

use crate::booking::Booking;
use crate::error::{CareOpsError, ValidationError};
use crate::id::{BookingId, FormId, SubmissionId, WorkspaceId};
use crate::time::{Timestamp, now};

/// A form template owned by a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: Option<String>,
    pub required_fields: Vec<String>,
    /// Booking types that trigger a submission. Empty means none.
    pub booking_types: Vec<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl Form {
    /// Create an active form template.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] when `name` is blank.
    pub fn new(
        workspace_id: WorkspaceId,
        name: impl Into<String>,
        description: Option<String>,
        required_fields: Vec<String>,
        booking_types: Vec<String>,
    ) -> Result<Self, CareOpsError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }
        Ok(Self {
            id: FormId::new(),
            workspace_id,
            name,
            description,
            required_fields,
            booking_types,
            is_active: true,
            created_at: now(),
        })
    }

    /// Whether a booking of `booking_type` should receive this form.
    #[must_use]
    pub fn applies_to(&self, booking_type: &str) -> bool {
        self.is_active && self.booking_types.iter().any(|t| t == booking_type)
    }

    /// Required fields absent or blank in `data`.
    #[must_use]
    pub fn missing_fields(&self, data: &serde_json::Value) -> Vec<String> {
        self.required_fields
            .iter()
            .filter(|field| match data.get(field.as_str()) {
                None | Some(serde_json::Value::Null) => true,
                Some(serde_json::Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Completed,
}

impl SubmissionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(ValidationError::UnknownValue {
                kind: "submission status",
                value: other.to_string(),
            }),
        }
    }
}

/// An instance of a form to be filled for a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: SubmissionId,
    pub form_id: FormId,
    pub workspace_id: WorkspaceId,
    pub booking_id: Option<BookingId>,
    pub contact_email: Option<String>,
    pub data: serde_json::Value,
    pub status: SubmissionStatus,
    pub submitted_at: Option<Timestamp>,
    pub due_at: Option<Timestamp>,
}

impl FormSubmission {
    /// A pending submission of `form` for `booking`, due at the booking's start.
    #[must_use]
    pub fn pending_for(form: &Form, booking: &Booking, contact_email: Option<String>) -> Self {
        Self {
            id: SubmissionId::new(),
            form_id: form.id,
            workspace_id: booking.workspace_id,
            booking_id: Some(booking.id),
            contact_email,
            data: serde_json::Value::Object(serde_json::Map::new()),
            status: SubmissionStatus::Pending,
            submitted_at: None,
            due_at: Some(booking.scheduled_at),
        }
    }

    /// Pending with a due date already passed.
    #[must_use]
    pub fn is_overdue(&self, at: Timestamp) -> bool {
        self.status == SubmissionStatus::Pending && self.due_at.is_some_and(|due| due < at)
    }

    /// Record the submitted `data` and mark the submission completed.
    ///
    /// # Errors
    ///
    /// Fails when the submission is already completed or `data` lacks a
    /// required field of `form`.
    pub fn complete(
        &mut self,
        form: &Form,
        data: serde_json::Value,
        contact_email: Option<String>,
        at: Timestamp,
    ) -> Result<(), CareOpsError> {
        if self.status == SubmissionStatus::Completed {
            return Err(ValidationError::SubmissionAlreadyCompleted.into());
        }
        let missing = form.missing_fields(&data);
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing).into());
        }
        self.data = data;
        if contact_email.is_some() {
            self.contact_email = contact_email;
        }
        self.status = SubmissionStatus::Completed;
        self.submitted_at = Some(at);
        Ok(())
    }
}
