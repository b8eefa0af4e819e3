//! Notifier ports — outbound email and SMS channels.
//!
//! Senders report a [`Delivery`] instead of an error: a failed notification
//! never fails the operation that triggered it.

use std::future::Future;

use careops_domain::booking::Booking;
use careops_domain::inventory::InventoryItem;
use careops_domain::notification::{Delivery, EmailMessage, SmsMessage};

/// Sends a single email.
pub trait EmailSender {
    fn send_email(&self, email: EmailMessage) -> impl Future<Output = Delivery> + Send;
}

/// Sends a single SMS.
pub trait SmsSender {
    fn send_sms(&self, sms: SmsMessage) -> impl Future<Output = Delivery> + Send;
}

/// Both channels, as seen by services and the automation engine.
///
/// The templated SMS helpers only format text and delegate to
/// [`Notifier::send_sms`].
pub trait Notifier: Send + Sync + 'static {
    fn send_email(&self, email: EmailMessage) -> impl Future<Output = Delivery> + Send;

    fn send_sms(&self, sms: SmsMessage) -> impl Future<Output = Delivery> + Send;

    fn send_verification_code(
        &self,
        phone: &str,
        code: &str,
    ) -> impl Future<Output = Delivery> + Send {
        self.send_sms(SmsMessage::verification_code(phone, code))
    }

    fn send_booking_confirmation_sms(
        &self,
        phone: &str,
        booking: &Booking,
    ) -> impl Future<Output = Delivery> + Send {
        self.send_sms(SmsMessage::booking_confirmation(phone, booking))
    }

    fn send_booking_reminder_sms(
        &self,
        phone: &str,
        booking: &Booking,
    ) -> impl Future<Output = Delivery> + Send {
        self.send_sms(SmsMessage::booking_reminder(phone, booking))
    }

    fn send_form_reminder_sms(
        &self,
        phone: &str,
        form_name: &str,
    ) -> impl Future<Output = Delivery> + Send {
        self.send_sms(SmsMessage::form_reminder(phone, form_name))
    }

    fn send_inventory_alert_sms(
        &self,
        phone: &str,
        item: &InventoryItem,
    ) -> impl Future<Output = Delivery> + Send {
        self.send_sms(SmsMessage::inventory_alert(phone, item))
    }
}

impl<T: Notifier> Notifier for std::sync::Arc<T> {
    fn send_email(&self, email: EmailMessage) -> impl Future<Output = Delivery> + Send {
        (**self).send_email(email)
    }

    fn send_sms(&self, sms: SmsMessage) -> impl Future<Output = Delivery> + Send {
        (**self).send_sms(sms)
    }
}
