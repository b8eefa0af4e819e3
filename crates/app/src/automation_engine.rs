//! Automation engine — best-effort notification rules reacting to domain events.
//!
//! Services call [`AutomationEngine::dispatch`] after their write has been
//! committed. Rules never fail the caller: storage errors and notifier
//! failures are logged and folded into the returned [`RuleReport`].
//!
//! Form reminders are suppressed for a contact whose conversation received a
//! staff reply within the configured cool-down.

use std::sync::Arc;

use chrono::Duration;

use careops_domain::booking::Booking;
use careops_domain::contact::Contact;
use careops_domain::conversation::{Conversation, Message};
use careops_domain::error::CareOpsError;
use careops_domain::form::FormSubmission;
use careops_domain::inventory::InventoryItem;
use careops_domain::notification::{Delivery, EmailMessage};
use careops_domain::time::now;
use careops_domain::workspace::Workspace;

use crate::ports::{
    BookingRepository, ContactRepository, ConversationRepository, FormRepository, Notifier, Store,
    UserRepository,
};

/// Tunables of the rule engine.
#[derive(Debug, Clone, Copy)]
pub struct AutomationSettings {
    /// How far ahead the sweep looks for pending submissions.
    pub reminder_window: Duration,
    /// How long a staff reply silences automated reminders.
    pub staff_reply_cooldown: Duration,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            reminder_window: Duration::hours(24),
            staff_reply_cooldown: Duration::hours(24),
        }
    }
}

/// A domain event some rule reacts to.
#[derive(Debug, Clone)]
pub enum AutomationEvent {
    BookingCreated { booking: Booking, contact: Contact },
    /// No rule yet; welcome messages are sent by the contact service.
    ContactCreated { contact: Contact },
    StaffReplied {
        message: Message,
        conversation: Conversation,
    },
    FormOverdue {
        submission: FormSubmission,
        contact: Contact,
    },
    InventoryLow {
        item: InventoryItem,
        workspace: Workspace,
    },
}

impl AutomationEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::BookingCreated { .. } => "booking_created",
            Self::ContactCreated { .. } => "contact_created",
            Self::StaffReplied { .. } => "staff_replied",
            Self::FormOverdue { .. } => "form_overdue",
            Self::InventoryLow { .. } => "inventory_low",
        }
    }
}

/// What a rule (or a sweep) did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleReport {
    pub attempted: u32,
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
    /// Reminders withheld because staff replied recently.
    pub suppressed: u32,
    /// Set when a sweep was refused because another one was running.
    pub already_running: bool,
}

impl RuleReport {
    fn record(&mut self, delivery: &Delivery) {
        self.attempted += 1;
        match delivery {
            Delivery::Sent { .. } => self.sent += 1,
            Delivery::Skipped { .. } => self.skipped += 1,
            Delivery::Failed { .. } => self.failed += 1,
        }
    }

    fn merge(&mut self, other: Self) {
        self.attempted += other.attempted;
        self.sent += other.sent;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.suppressed += other.suppressed;
    }
}

pub struct AutomationEngine<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    settings: AutomationSettings,
    sweep_lock: tokio::sync::Mutex<()>,
}

impl<S: Store, N: Notifier> AutomationEngine<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>, settings: AutomationSettings) -> Self {
        Self {
            store,
            notifier,
            settings,
            sweep_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Run the rule for `event`. Never fails.
    pub async fn dispatch(&self, event: AutomationEvent) -> RuleReport {
        let rule = event.name();
        let result = match event {
            AutomationEvent::BookingCreated { booking, contact } => {
                self.on_booking_created(&booking, &contact).await
            }
            AutomationEvent::ContactCreated { contact } => {
                tracing::debug!(contact_id = %contact.id, "no contact automation configured");
                Ok(RuleReport::default())
            }
            AutomationEvent::StaffReplied {
                message,
                conversation,
            } => self.on_staff_replied(&message, &conversation).await,
            AutomationEvent::FormOverdue {
                submission,
                contact,
            } => self.on_form_overdue(&submission, &contact).await,
            AutomationEvent::InventoryLow { item, workspace } => {
                self.on_inventory_low(&item, &workspace).await
            }
        };

        match result {
            Ok(report) => {
                tracing::debug!(rule, ?report, "automation rule finished");
                report
            }
            Err(err) => {
                tracing::warn!(%err, rule, "automation rule failed");
                RuleReport::default()
            }
        }
    }

    /// Send reminders for every pending submission due within the reminder
    /// window. A call made while another sweep runs returns immediately.
    pub async fn run_reminder_sweep(&self) -> RuleReport {
        let Ok(_guard) = self.sweep_lock.try_lock() else {
            tracing::info!("reminder sweep already running, skipping");
            return RuleReport {
                already_running: true,
                ..RuleReport::default()
            };
        };

        let started = now();
        let due = match self
            .store
            .forms()
            .pending_due_between(started, started + self.settings.reminder_window)
            .await
        {
            Ok(due) => due,
            Err(err) => {
                tracing::warn!(%err, "reminder sweep could not load pending submissions");
                return RuleReport::default();
            }
        };

        let mut report = RuleReport::default();
        for submission in due {
            match self.contact_for(&submission).await {
                Ok(Some(contact)) => {
                    report.merge(
                        self.dispatch(AutomationEvent::FormOverdue {
                            submission,
                            contact,
                        })
                        .await,
                    );
                }
                Ok(None) => {
                    tracing::debug!(submission_id = %submission.id, "submission has no booking contact");
                }
                Err(err) => {
                    tracing::warn!(%err, submission_id = %submission.id, "could not resolve submission contact");
                }
            }
        }
        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            suppressed = report.suppressed,
            "reminder sweep finished"
        );
        report
    }

    async fn on_booking_created(
        &self,
        booking: &Booking,
        contact: &Contact,
    ) -> Result<RuleReport, CareOpsError> {
        let mut report = RuleReport::default();
        let pending = self.store.forms().pending_for_booking(booking.id).await?;
        if pending.is_empty() {
            return Ok(report);
        }
        if self.recently_answered(contact).await? {
            report.suppressed += u32::try_from(pending.len()).unwrap_or(u32::MAX);
            return Ok(report);
        }
        for submission in &pending {
            self.remind(submission, contact, &mut report).await?;
        }
        Ok(report)
    }

    async fn on_staff_replied(
        &self,
        message: &Message,
        conversation: &Conversation,
    ) -> Result<RuleReport, CareOpsError> {
        let mut current = self
            .store
            .conversations()
            .get_by_id(conversation.id)
            .await?
            .unwrap_or_else(|| conversation.clone());
        current.mark_staff_reply(message.created_at);
        self.store.conversations().update(current).await?;
        Ok(RuleReport::default())
    }

    async fn on_form_overdue(
        &self,
        submission: &FormSubmission,
        contact: &Contact,
    ) -> Result<RuleReport, CareOpsError> {
        let mut report = RuleReport::default();
        if self.recently_answered(contact).await? {
            report.suppressed += 1;
            return Ok(report);
        }
        self.remind(submission, contact, &mut report).await?;
        Ok(report)
    }

    async fn on_inventory_low(
        &self,
        item: &InventoryItem,
        workspace: &Workspace,
    ) -> Result<RuleReport, CareOpsError> {
        let mut report = RuleReport::default();
        let Some(owner) = self.store.users().get_by_id(workspace.owner_id).await? else {
            tracing::warn!(workspace_id = %workspace.id, "workspace owner not found for inventory alert");
            return Ok(report);
        };
        let email = EmailMessage::inventory_alert(&owner.email, item);
        report.record(&self.notifier.send_email(email).await);
        if let Some(phone) = owner.phone_number.as_deref() {
            report.record(&self.notifier.send_inventory_alert_sms(phone, item).await);
        }
        Ok(report)
    }

    async fn remind(
        &self,
        submission: &FormSubmission,
        contact: &Contact,
        report: &mut RuleReport,
    ) -> Result<(), CareOpsError> {
        let form_name = self
            .store
            .forms()
            .get_by_id(submission.form_id)
            .await?
            .map_or_else(|| format!("Form {}", submission.form_id), |f| f.name);

        let delivery = match contact.email.as_deref() {
            Some(email) => {
                self.notifier
                    .send_email(EmailMessage::form_reminder(email, &form_name))
                    .await
            }
            None => Delivery::skipped("contact has no email address"),
        };
        report.record(&delivery);
        if let Some(phone) = contact.phone.as_deref() {
            report.record(&self.notifier.send_form_reminder_sms(phone, &form_name).await);
        }
        Ok(())
    }

    async fn recently_answered(&self, contact: &Contact) -> Result<bool, CareOpsError> {
        let conversation = self
            .store
            .conversations()
            .find_by_contact(contact.id)
            .await?;
        Ok(conversation.is_some_and(|c| {
            c.answered_by_staff_within(now(), self.settings.staff_reply_cooldown)
        }))
    }

    async fn contact_for(
        &self,
        submission: &FormSubmission,
    ) -> Result<Option<Contact>, CareOpsError> {
        let Some(booking_id) = submission.booking_id else {
            return Ok(None);
        };
        let Some(booking) = self.store.bookings().get_by_id(booking_id).await? else {
            return Ok(None);
        };
        self.store.contacts().get_by_id(booking.contact_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careops_domain::conversation::{Channel, SenderType};
    use careops_domain::form::Form;
    use careops_domain::user::User;

    use crate::ports::{InventoryRepository, WorkspaceRepository};
    use crate::testing::{InMemoryStore, SpyNotifier};

    struct Fixture {
        engine: Arc<AutomationEngine<InMemoryStore, SpyNotifier>>,
        store: Arc<InMemoryStore>,
        notifier: Arc<SpyNotifier>,
        owner: User,
        workspace: Workspace,
        contact: Contact,
        conversation: Conversation,
        form: Form,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::default());
        let notifier = Arc::new(SpyNotifier::default());
        let owner = User::builder()
            .email("owner@clinic.test")
            .full_name("Olive Owner")
            .phone_number(Some("+15550001".to_string()))
            .build()
            .unwrap();
        store.users().create(owner.clone()).await.unwrap();
        let workspace = Workspace::builder()
            .owner_id(owner.id)
            .name("Clinic")
            .build()
            .unwrap();
        store.workspaces().create(workspace.clone()).await.unwrap();
        let contact = Contact::builder()
            .workspace_id(workspace.id)
            .name("Grace")
            .email(Some("grace@example.com".to_string()))
            .phone(Some("+15550100".to_string()))
            .build()
            .unwrap();
        let conversation = Conversation::open(workspace.id, contact.id);
        store
            .contacts()
            .create_with_conversation(
                contact.clone(),
                conversation.clone(),
                Message::welcome(conversation.id, &contact.name),
            )
            .await
            .unwrap();
        let form = Form::new(
            workspace.id,
            "Intake",
            None,
            Vec::new(),
            vec!["Consultation".to_string()],
        )
        .unwrap();
        store.forms().create(form.clone()).await.unwrap();
        Fixture {
            engine: Arc::new(AutomationEngine::new(
                Arc::clone(&store),
                Arc::clone(&notifier),
                AutomationSettings::default(),
            )),
            store,
            notifier,
            owner,
            workspace,
            contact,
            conversation,
            form,
        }
    }

    async fn book(f: &Fixture, hours_ahead: i64) -> (Booking, FormSubmission) {
        let booking = Booking::builder()
            .workspace_id(f.workspace.id)
            .contact_id(f.contact.id)
            .booking_type("Consultation")
            .scheduled_at(now() + Duration::hours(hours_ahead))
            .build()
            .unwrap();
        let submission =
            FormSubmission::pending_for(&f.form, &booking, f.contact.email.clone());
        f.store
            .bookings()
            .create_with_effects(booking.clone(), vec![submission.clone()])
            .await
            .unwrap();
        (booking, submission)
    }

    #[tokio::test]
    async fn should_remind_by_email_and_sms_when_booking_has_pending_forms() {
        let f = fixture().await;
        let (booking, _) = book(&f, 48).await;

        let report = f
            .engine
            .dispatch(AutomationEvent::BookingCreated {
                booking,
                contact: f.contact.clone(),
            })
            .await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.sent, 2);
        let emails = f.notifier.emails();
        assert_eq!(emails[0].subject, "Reminder: Intake Pending");
        assert_eq!(f.notifier.sms()[0].to, "+15550100");
    }

    #[tokio::test]
    async fn should_count_failures_without_erroring_when_notifier_fails() {
        let f = fixture().await;
        let notifier = Arc::new(SpyNotifier::answering(Delivery::failed("smtp down")));
        let engine = AutomationEngine::new(
            Arc::clone(&f.store),
            Arc::clone(&notifier),
            AutomationSettings::default(),
        );
        let (booking, _) = book(&f, 48).await;

        let report = engine
            .dispatch(AutomationEvent::BookingCreated {
                booking,
                contact: f.contact.clone(),
            })
            .await;

        assert_eq!(report.failed, 2);
        assert_eq!(report.sent, 0);
    }

    #[tokio::test]
    async fn should_suppress_reminders_after_recent_staff_reply() {
        let f = fixture().await;
        let reply = Message::new(
            f.conversation.id,
            SenderType::Staff,
            "Olive Owner",
            "We'll see you soon",
            Channel::Email,
        )
        .unwrap();
        f.engine
            .dispatch(AutomationEvent::StaffReplied {
                message: reply,
                conversation: f.conversation.clone(),
            })
            .await;
        let (booking, _) = book(&f, 48).await;

        let report = f
            .engine
            .dispatch(AutomationEvent::BookingCreated {
                booking,
                contact: f.contact.clone(),
            })
            .await;

        assert_eq!(report.suppressed, 1);
        assert!(f.notifier.emails().is_empty());
        let stored = f
            .store
            .conversations()
            .get_by_id(f.conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.last_staff_reply_at.is_some());
    }

    #[tokio::test]
    async fn should_alert_owner_by_email_and_sms_when_inventory_is_low() {
        let f = fixture().await;
        let item = InventoryItem::new(f.workspace.id, "Gloves", 2, None, None).unwrap();
        f.store.inventory().create(item.clone()).await.unwrap();

        let report = f
            .engine
            .dispatch(AutomationEvent::InventoryLow {
                item,
                workspace: f.workspace.clone(),
            })
            .await;

        assert_eq!(report.sent, 2);
        assert_eq!(f.notifier.emails()[0].to, f.owner.email);
        assert_eq!(f.notifier.sms()[0].to, "+15550001");
    }

    #[tokio::test]
    async fn should_do_nothing_for_contact_created() {
        let f = fixture().await;
        let report = f
            .engine
            .dispatch(AutomationEvent::ContactCreated {
                contact: f.contact.clone(),
            })
            .await;
        assert_eq!(report, RuleReport::default());
    }

    #[tokio::test]
    async fn should_sweep_only_submissions_due_within_window() {
        let f = fixture().await;
        book(&f, 2).await;
        book(&f, 72).await;
        book(&f, -3).await;

        let report = f.engine.run_reminder_sweep().await;

        assert_eq!(report.attempted, 2);
        assert_eq!(f.notifier.emails().len(), 1);
        assert_eq!(f.notifier.sms().len(), 1);
    }

    #[tokio::test]
    async fn should_skip_sweep_when_another_is_running() {
        let f = fixture().await;
        let _held = f.engine.sweep_lock.lock().await;

        let report = f.engine.run_reminder_sweep().await;

        assert!(report.already_running);
        assert_eq!(report.attempted, 0);
    }
}
