//! Channel notifier — composes an email and an SMS sender into a [`Notifier`].
//!
//! Every send is bounded by a timeout and its outcome is logged here, so
//! callers can fire and forget.

use std::time::Duration;

use careops_domain::notification::{Delivery, EmailMessage, SmsMessage};

use crate::ports::{EmailSender, Notifier, SmsSender};

/// Default bound on a single outbound call.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// [`Notifier`] backed by one [`EmailSender`] and one [`SmsSender`].
pub struct ChannelNotifier<E, M> {
    email: E,
    sms: M,
    timeout: Duration,
}

impl<E, M> ChannelNotifier<E, M> {
    pub fn new(email: E, sms: M) -> Self {
        Self {
            email,
            sms,
            timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn log_outcome(channel: &'static str, to: &str, delivery: &Delivery) {
    match delivery {
        Delivery::Sent { reference } => {
            tracing::info!(channel, to, reference = %reference, "notification sent");
        }
        Delivery::Skipped { reason } => {
            tracing::debug!(channel, to, reason = %reason, "notification skipped");
        }
        Delivery::Failed { error } => {
            tracing::warn!(channel, to, error = %error, "notification failed");
        }
    }
}

impl<E, M> Notifier for ChannelNotifier<E, M>
where
    E: EmailSender + Send + Sync + 'static,
    M: SmsSender + Send + Sync + 'static,
{
    async fn send_email(&self, email: EmailMessage) -> Delivery {
        let to = email.to.clone();
        let delivery = tokio::time::timeout(self.timeout, self.email.send_email(email))
            .await
            .unwrap_or_else(|_| Delivery::failed(format!("timed out after {:?}", self.timeout)));
        log_outcome("email", &to, &delivery);
        delivery
    }

    async fn send_sms(&self, sms: SmsMessage) -> Delivery {
        let to = sms.to.clone();
        let delivery = tokio::time::timeout(self.timeout, self.sms.send_sms(sms))
            .await
            .unwrap_or_else(|_| Delivery::failed(format!("timed out after {:?}", self.timeout)));
        log_outcome("sms", &to, &delivery);
        delivery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;

    struct SlowEmail;

    impl EmailSender for SlowEmail {
        fn send_email(&self, _email: EmailMessage) -> impl Future<Output = Delivery> + Send {
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Delivery::Sent {
                    reference: "late".to_string(),
                }
            }
        }
    }

    struct EchoSms;

    impl SmsSender for EchoSms {
        fn send_sms(&self, sms: SmsMessage) -> impl Future<Output = Delivery> + Send {
            async move {
                Delivery::Sent {
                    reference: sms.body,
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_failure_when_sender_exceeds_timeout() {
        let notifier =
            ChannelNotifier::new(SlowEmail, EchoSms).with_timeout(Duration::from_millis(50));

        let delivery = notifier
            .send_email(EmailMessage::html("a@b.c", "hi", "<p>hi</p>"))
            .await;

        assert!(matches!(delivery, Delivery::Failed { .. }));
    }

    #[tokio::test]
    async fn should_format_templates_through_send_sms() {
        let notifier = ChannelNotifier::new(SlowEmail, EchoSms);

        let delivery = notifier.send_form_reminder_sms("+15550100", "Intake").await;

        assert_eq!(
            delivery,
            Delivery::Sent {
                reference: "Reminder: Intake is pending.\n\nPlease complete it at your earliest convenience."
                    .to_string()
            }
        );
    }
}
