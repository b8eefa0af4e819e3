//! Booking service — scheduling, with inventory, form and notification
//! side effects.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use careops_domain::booking::{Booking, BookingStatus};
use careops_domain::contact::Contact;
use careops_domain::conversation::Message;
use careops_domain::error::{CareOpsError, NotFoundError};
use careops_domain::form::FormSubmission;
use careops_domain::id::{BookingId, ContactId, WorkspaceId};
use careops_domain::notification::EmailMessage;
use careops_domain::permission::{Access, Capability, Principal};
use careops_domain::time::Timestamp;
use careops_domain::workspace::Workspace;

use crate::automation_engine::{AutomationEngine, AutomationEvent};
use crate::ports::{
    BookingCommit, BookingRepository, ContactRepository, ConversationRepository, FormRepository,
    Notifier, Store,
};
use crate::services::AccessControl;

/// Input for [`BookingService::create`].
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_type: String,
    pub scheduled_at: Timestamp,
    /// Defaults to 60 minutes.
    pub duration_minutes: Option<i64>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Input for [`BookingService::update`].
#[derive(Debug, Clone)]
pub struct BookingUpdate {
    /// One of `confirmed`, `completed`, `no_show`, `cancelled`.
    pub status: String,
    pub notes: Option<String>,
}

/// A booking with its contact embedded.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub contact: Option<Contact>,
}

const ACCESS: Access = Access::Capability(Capability::Bookings);

pub struct BookingService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    access: AccessControl<S>,
    engine: Arc<AutomationEngine<S, N>>,
}

impl<S: Store, N: Notifier> BookingService<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>, engine: Arc<AutomationEngine<S, N>>) -> Self {
        Self {
            access: AccessControl::new(Arc::clone(&store)),
            store,
            notifier,
            engine,
        }
    }

    /// Book `contact_id` in.
    ///
    /// The booking, the inventory consumption and the pending submissions of
    /// every form matching the booking type are written together. Then the
    /// contact is notified, the confirmation is logged in its conversation
    /// and the automation rules run.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] when the contact is not in the
    /// workspace, [`CareOpsError::Validation`] for an invalid booking, or an
    /// access or storage error.
    #[tracing::instrument(skip(self, principal, input), fields(workspace_id = %workspace_id, contact_id = %contact_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        contact_id: ContactId,
        input: NewBooking,
    ) -> Result<Booking, CareOpsError> {
        let workspace = self.access.authorize(principal, workspace_id, ACCESS).await?;
        let contact = self
            .store
            .contacts()
            .get_by_id(contact_id)
            .await?
            .filter(|c| c.workspace_id == workspace_id)
            .ok_or_else(|| NotFoundError::new("Contact", contact_id))?;

        let mut builder = Booking::builder()
            .workspace_id(workspace_id)
            .contact_id(contact_id)
            .booking_type(input.booking_type.trim())
            .scheduled_at(input.scheduled_at)
            .location(input.location)
            .notes(input.notes);
        if let Some(minutes) = input.duration_minutes {
            builder = builder.duration_minutes(minutes);
        }
        let mut booking = builder.build()?;

        let submissions: Vec<FormSubmission> = self
            .store
            .forms()
            .list_by_workspace(workspace_id)
            .await?
            .iter()
            .filter(|form| form.applies_to(&booking.booking_type))
            .map(|form| FormSubmission::pending_for(form, &booking, contact.email.clone()))
            .collect();
        booking.forms_sent = !submissions.is_empty();

        let commit = self
            .store
            .bookings()
            .create_with_effects(booking, submissions)
            .await?;
        tracing::info!(
            booking_id = %commit.booking.id,
            submissions = commit.submissions.len(),
            "booking created"
        );

        self.after_commit(&workspace, &contact, &commit).await;
        Ok(commit.booking)
    }

    async fn after_commit(&self, workspace: &Workspace, contact: &Contact, commit: &BookingCommit) {
        let booking = &commit.booking;
        if let Some(email) = contact.email.as_deref() {
            let delivery = self
                .notifier
                .send_email(EmailMessage::booking_confirmation(email, booking))
                .await;
            tracing::debug!(?delivery, "booking confirmation email");
        }
        if let Some(phone) = contact.phone.as_deref() {
            let delivery = self
                .notifier
                .send_booking_confirmation_sms(phone, booking)
                .await;
            tracing::debug!(?delivery, "booking confirmation sms");
        }

        if let Err(err) = self.log_confirmation(contact, booking).await {
            tracing::warn!(%err, "could not log booking confirmation in conversation");
        }

        self.engine
            .dispatch(AutomationEvent::BookingCreated {
                booking: booking.clone(),
                contact: contact.clone(),
            })
            .await;
        for item in commit
            .inventory
            .iter()
            .filter(|item| item.crossed_low_after_consumption())
        {
            self.engine
                .dispatch(AutomationEvent::InventoryLow {
                    item: item.clone(),
                    workspace: workspace.clone(),
                })
                .await;
        }
    }

    async fn log_confirmation(&self, contact: &Contact, booking: &Booking) -> Result<(), CareOpsError> {
        let Some(conversation) = self
            .store
            .conversations()
            .find_by_contact(contact.id)
            .await?
        else {
            return Ok(());
        };
        let message = Message::system(
            conversation.id,
            format!(
                "Booking confirmed for {} on {}",
                booking.booking_type,
                booking.display_time()
            ),
        );
        self.store.conversations().append_message(message).await?;
        Ok(())
    }

    /// Bookings of the workspace ordered by schedule, each with its contact.
    ///
    /// # Errors
    ///
    /// Returns an access or storage error.
    pub async fn list(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<BookingDetails>, CareOpsError> {
        self.access.authorize(principal, workspace_id, ACCESS).await?;
        let bookings = self.store.bookings().list_by_workspace(workspace_id).await?;
        let contacts: HashMap<ContactId, Contact> = self
            .store
            .contacts()
            .list_by_workspace(workspace_id)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        Ok(bookings
            .into_iter()
            .map(|booking| BookingDetails {
                contact: contacts.get(&booking.contact_id).cloned(),
                booking,
            })
            .collect())
    }

    /// Change the status of a booking and optionally replace its notes.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] for an unknown status,
    /// [`CareOpsError::NotFound`] when the booking is not in the workspace,
    /// or an access or storage error.
    #[tracing::instrument(skip(self, principal, update), fields(workspace_id = %workspace_id, booking_id = %id))]
    pub async fn update(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        id: BookingId,
        update: BookingUpdate,
    ) -> Result<Booking, CareOpsError> {
        self.access.authorize(principal, workspace_id, ACCESS).await?;
        let status: BookingStatus = update.status.parse()?;
        let mut booking = self
            .store
            .bookings()
            .get_by_id(id)
            .await?
            .filter(|b| b.workspace_id == workspace_id)
            .ok_or_else(|| NotFoundError::new("Booking", id))?;
        booking.update(status, update.notes);
        let booking = self.store.bookings().update(booking).await?;
        tracing::info!(status = status.as_str(), "booking updated");
        Ok(booking)
    }
}
