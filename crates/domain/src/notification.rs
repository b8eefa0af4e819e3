//! Outbound notifications: the messages we send and what happened to them.
//!
//! Constructors here are the customer-facing templates. They only format
//! text; delivery belongs to the notifier adapters.

use serde::Serialize;

use crate::booking::Booking;
use crate::inventory::InventoryItem;

/// Outcome of one email or SMS send. Never an error for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
    /// Accepted by the provider, with its message reference.
    Sent { reference: String },
    /// Not attempted, e.g. the channel has no credentials configured.
    Skipped { reason: String },
    Failed { error: String },
}

impl Delivery {
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn failed(error: impl ToString) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

impl EmailMessage {
    #[must_use]
    pub fn html(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            is_html: true,
        }
    }

    #[must_use]
    pub fn welcome(to: &str, contact_name: &str) -> Self {
        Self::html(
            to,
            "Welcome to Our Service",
            format!(
                "<h2>Welcome {contact_name}!</h2>\
                 <p>Thank you for reaching out. We'll be in touch shortly.</p>\
                 <p>Our team will respond to your inquiry within 24 hours.</p>"
            ),
        )
    }

    #[must_use]
    pub fn booking_confirmation(to: &str, booking: &Booking) -> Self {
        Self::html(
            to,
            "Booking Confirmation",
            format!(
                "<h2>Booking Confirmation</h2>\
                 <p>Thank you for booking with us!</p>\
                 <p><strong>Type:</strong> {}</p>\
                 <p><strong>Date & Time:</strong> {}</p>\
                 <p><strong>Duration:</strong> {} minutes</p>\
                 <p><strong>Location:</strong> {}</p>\
                 <p>We look forward to seeing you!</p>",
                booking.booking_type,
                booking.display_time(),
                booking.duration_minutes,
                booking.display_location(),
            ),
        )
    }

    #[must_use]
    pub fn form_reminder(to: &str, form_name: &str) -> Self {
        Self::html(
            to,
            format!("Reminder: {form_name} Pending"),
            format!(
                "<h2>Form Reminder</h2>\
                 <p>We noticed that <strong>{form_name}</strong> is still pending.</p>\
                 <p>Please complete it at your earliest convenience.</p>"
            ),
        )
    }

    #[must_use]
    pub fn inventory_alert(to: &str, item: &InventoryItem) -> Self {
        Self::html(
            to,
            format!("Low Inventory Alert: {}", item.name),
            format!(
                "<h2>Low Inventory Alert</h2><p>{} is at {} units (threshold: {})</p>",
                item.name, item.quantity, item.low_threshold
            ),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

impl SmsMessage {
    #[must_use]
    pub fn new(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn verification_code(to: &str, code: &str) -> Self {
        Self::new(
            to,
            format!("CareOps Verification Code: {code}\n\nThis code expires in 10 minutes."),
        )
    }

    #[must_use]
    pub fn welcome(to: &str, contact_name: &str) -> Self {
        Self::new(
            to,
            format!(
                "Hi {contact_name}! Thank you for reaching out. Our team will contact you within 24 hours."
            ),
        )
    }

    #[must_use]
    pub fn booking_confirmation(to: &str, booking: &Booking) -> Self {
        let reference = booking.id.to_string();
        let short = reference.get(..8).unwrap_or(&reference);
        Self::new(
            to,
            format!(
                "Booking Confirmed!\n\nType: {}\nTime: {}\n\nConfirmation: {}",
                booking.booking_type,
                booking.display_time(),
                short.to_uppercase()
            ),
        )
    }

    #[must_use]
    pub fn booking_reminder(to: &str, booking: &Booking) -> Self {
        Self::new(
            to,
            format!(
                "Reminder: {} scheduled at {}\n\nReply CONFIRM to confirm or CANCEL to cancel.",
                booking.booking_type,
                booking.display_time()
            ),
        )
    }

    #[must_use]
    pub fn form_reminder(to: &str, form_name: &str) -> Self {
        Self::new(
            to,
            format!(
                "Reminder: {form_name} is pending.\n\nPlease complete it at your earliest convenience."
            ),
        )
    }

    #[must_use]
    pub fn inventory_alert(to: &str, item: &InventoryItem) -> Self {
        Self::new(
            to,
            format!(
                "Low Stock Alert\n\n{}: {} units remaining",
                item.name, item.quantity
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::WorkspaceId;
    use chrono::{TimeZone, Utc};

    fn booking() -> Booking {
        Booking::builder()
            .booking_type("Consultation")
            .scheduled_at(Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap())
            .duration_minutes(45)
            .build()
            .unwrap()
    }

    #[test]
    fn should_mention_code_and_expiry_in_verification_sms() {
        let sms = SmsMessage::verification_code("+15550100", "042137");
        assert_eq!(
            sms.body,
            "CareOps Verification Code: 042137\n\nThis code expires in 10 minutes."
        );
    }

    #[test]
    fn should_render_booking_details_in_confirmation_email() {
        let email = EmailMessage::booking_confirmation("grace@example.com", &booking());
        assert_eq!(email.subject, "Booking Confirmation");
        assert!(email.is_html);
        assert!(email.body.contains("Consultation"));
        assert!(email.body.contains("March 14, 2026 at 09:30 AM"));
        assert!(email.body.contains("45 minutes"));
        assert!(email.body.contains("Online"));
    }

    #[test]
    fn should_include_short_reference_in_confirmation_sms() {
        let b = booking();
        let sms = SmsMessage::booking_confirmation("+15550100", &b);
        let expected = b.id.to_string()[..8].to_uppercase();
        assert!(sms.body.ends_with(&format!("Confirmation: {expected}")));
    }

    #[test]
    fn should_report_quantity_and_threshold_in_inventory_alert() {
        let mut item =
            InventoryItem::new(WorkspaceId::new(), "Gloves", 3, None, Some(5)).unwrap();
        item.quantity = 3;
        let email = EmailMessage::inventory_alert("owner@clinic.test", &item);
        assert_eq!(email.subject, "Low Inventory Alert: Gloves");
        assert!(email.body.contains("Gloves is at 3 units (threshold: 5)"));

        let sms = SmsMessage::inventory_alert("+15550100", &item);
        assert_eq!(sms.body, "Low Stock Alert\n\nGloves: 3 units remaining");
    }

    #[test]
    fn should_serialize_delivery_with_status_tag() {
        let json = serde_json::to_value(Delivery::skipped("not configured")).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "not configured");
    }
}
