//! Booking — a scheduled appointment for a contact.

use serde::{Deserialize, Serialize};

use crate::error::{CareOpsError, ValidationError};
use crate::id::{BookingId, ContactId, WorkspaceId};
use crate::time::{Timestamp, now};

/// Location shown to customers when a booking has none.
pub const DEFAULT_LOCATION: &str = "Online";

/// Lifecycle of a [`Booking`]. New bookings start as `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Completed,
    NoShow,
    Cancelled,
}

impl BookingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::NoShow => "no_show",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "no_show" => Ok(Self::NoShow),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError::UnknownValue {
                kind: "booking status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub workspace_id: WorkspaceId,
    pub contact_id: ContactId,
    pub booking_type: String,
    pub scheduled_at: Timestamp,
    pub duration_minutes: i64,
    pub location: Option<String>,
    pub status: BookingStatus,
    pub notes: Option<String>,
    /// Set when at least one form submission was created for this booking.
    pub forms_sent: bool,
    pub created_at: Timestamp,
}

impl Booking {
    /// Create a builder for constructing a [`Booking`].
    #[must_use]
    pub fn builder() -> BookingBuilder {
        BookingBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] when `booking_type` is empty or
    /// `duration_minutes` is not positive.
    pub fn validate(&self) -> Result<(), CareOpsError> {
        if self.booking_type.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "booking_type",
            }
            .into());
        }
        if self.duration_minutes <= 0 {
            return Err(ValidationError::NotPositive {
                field: "duration_minutes",
            }
            .into());
        }
        Ok(())
    }

    /// Location for customer-facing messages.
    #[must_use]
    pub fn display_location(&self) -> &str {
        self.location
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(DEFAULT_LOCATION)
    }

    /// Scheduled time in the human format used by notifications,
    /// e.g. `March 14, 2026 at 05:45 PM`.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.scheduled_at.format("%B %d, %Y at %I:%M %p").to_string()
    }

    /// Apply a status change, replacing notes only when new ones are given.
    pub fn update(&mut self, status: BookingStatus, notes: Option<String>) {
        self.status = status;
        if let Some(notes) = notes.filter(|n| !n.is_empty()) {
            self.notes = Some(notes);
        }
    }
}

/// Step-by-step builder for [`Booking`].
#[derive(Debug, Default)]
pub struct BookingBuilder {
    workspace_id: Option<WorkspaceId>,
    contact_id: Option<ContactId>,
    booking_type: Option<String>,
    scheduled_at: Option<Timestamp>,
    duration_minutes: Option<i64>,
    location: Option<String>,
    notes: Option<String>,
}

impl BookingBuilder {
    #[must_use]
    pub fn workspace_id(mut self, workspace_id: WorkspaceId) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    #[must_use]
    pub fn contact_id(mut self, contact_id: ContactId) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    #[must_use]
    pub fn booking_type(mut self, booking_type: impl Into<String>) -> Self {
        self.booking_type = Some(booking_type.into());
        self
    }

    #[must_use]
    pub fn scheduled_at(mut self, scheduled_at: Timestamp) -> Self {
        self.scheduled_at = Some(scheduled_at);
        self
    }

    #[must_use]
    pub fn duration_minutes(mut self, duration_minutes: i64) -> Self {
        self.duration_minutes = Some(duration_minutes);
        self
    }

    #[must_use]
    pub fn location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Consume the builder, validate, and return a confirmed [`Booking`].
    ///
    /// `duration_minutes` defaults to 60 and `scheduled_at` to now.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] if the booking is invalid.
    pub fn build(self) -> Result<Booking, CareOpsError> {
        let booking = Booking {
            id: BookingId::new(),
            workspace_id: self.workspace_id.unwrap_or_default(),
            contact_id: self.contact_id.unwrap_or_default(),
            booking_type: self.booking_type.unwrap_or_default(),
            scheduled_at: self.scheduled_at.unwrap_or_else(now),
            duration_minutes: self.duration_minutes.unwrap_or(60),
            location: self.location,
            status: BookingStatus::Confirmed,
            notes: self.notes,
            forms_sent: false,
            created_at: now(),
        };
        booking.validate()?;
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn booking() -> Booking {
        Booking::builder()
            .booking_type("Consultation")
            .scheduled_at(Utc.with_ymd_and_hms(2026, 3, 14, 17, 45, 0).unwrap())
            .duration_minutes(30)
            .build()
            .unwrap()
    }

    #[test]
    fn should_start_confirmed_without_forms_sent() {
        let b = booking();
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert!(!b.forms_sent);
    }

    #[test]
    fn should_reject_non_positive_duration() {
        let result = Booking::builder()
            .booking_type("Consultation")
            .duration_minutes(0)
            .build();
        assert!(matches!(
            result,
            Err(CareOpsError::Validation(ValidationError::NotPositive {
                field: "duration_minutes"
            }))
        ));
    }

    #[test]
    fn should_format_schedule_for_humans() {
        assert_eq!(booking().display_time(), "March 14, 2026 at 05:45 PM");
    }

    #[test]
    fn should_fall_back_to_online_location() {
        assert_eq!(booking().display_location(), "Online");
    }

    #[test]
    fn should_parse_known_statuses_and_reject_others() {
        assert_eq!(
            "no_show".parse::<BookingStatus>().unwrap(),
            BookingStatus::NoShow
        );
        assert!(matches!(
            "rescheduled".parse::<BookingStatus>(),
            Err(ValidationError::UnknownValue { .. })
        ));
    }

    #[test]
    fn should_keep_existing_notes_when_update_has_none() {
        let mut b = booking();
        b.notes = Some("bring x-rays".to_string());
        b.update(BookingStatus::Completed, None);
        assert_eq!(b.status, BookingStatus::Completed);
        assert_eq!(b.notes.as_deref(), Some("bring x-rays"));
    }
}
