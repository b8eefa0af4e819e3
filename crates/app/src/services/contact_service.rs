//! Contact service — customer records and their welcome flow.

use std::sync::Arc;

use careops_domain::contact::Contact;
use careops_domain::conversation::{Conversation, Message};
use careops_domain::error::{CareOpsError, NotFoundError};
use careops_domain::id::{ContactId, WorkspaceId};
use careops_domain::notification::{EmailMessage, SmsMessage};
use careops_domain::permission::{Access, Capability, Principal};

use crate::automation_engine::{AutomationEngine, AutomationEvent};
use crate::ports::{ContactRepository, Notifier, Store};
use crate::services::AccessControl;

/// Input for [`ContactService::create`].
#[derive(Debug, Clone, Default)]
pub struct NewContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

const ACCESS: Access = Access::Capability(Capability::Inbox);

pub struct ContactService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    access: AccessControl<S>,
    engine: Arc<AutomationEngine<S, N>>,
}

impl<S: Store, N: Notifier> ContactService<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>, engine: Arc<AutomationEngine<S, N>>) -> Self {
        Self {
            access: AccessControl::new(Arc::clone(&store)),
            store,
            notifier,
            engine,
        }
    }

    /// Create a contact together with its conversation and welcome message,
    /// then greet it on every channel it has.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] on a blank name, or an access or
    /// storage error. Notification failures are not errors.
    #[tracing::instrument(skip(self, principal, input), fields(workspace_id = %workspace_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        input: NewContact,
    ) -> Result<Contact, CareOpsError> {
        self.access.authorize(principal, workspace_id, ACCESS).await?;

        let contact = Contact::builder()
            .workspace_id(workspace_id)
            .name(input.name.trim())
            .email(input.email)
            .phone(input.phone)
            .build()?;
        let conversation = Conversation::open(workspace_id, contact.id);
        let welcome = Message::welcome(conversation.id, &contact.name);
        let contact = self
            .store
            .contacts()
            .create_with_conversation(contact, conversation, welcome)
            .await?;
        tracing::info!(contact_id = %contact.id, "contact created");

        if let Some(email) = contact.email.as_deref() {
            let delivery = self
                .notifier
                .send_email(EmailMessage::welcome(email, &contact.name))
                .await;
            tracing::debug!(?delivery, "welcome email");
        }
        if let Some(phone) = contact.phone.as_deref() {
            let delivery = self
                .notifier
                .send_sms(SmsMessage::welcome(phone, &contact.name))
                .await;
            tracing::debug!(?delivery, "welcome sms");
        }

        self.engine
            .dispatch(AutomationEvent::ContactCreated {
                contact: contact.clone(),
            })
            .await;
        Ok(contact)
    }

    /// # Errors
    ///
    /// Returns an access or storage error.
    pub async fn list(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<Contact>, CareOpsError> {
        self.access.authorize(principal, workspace_id, ACCESS).await?;
        self.store.contacts().list_by_workspace(workspace_id).await
    }

    /// A contact of `workspace_id`. Contacts of other workspaces are reported
    /// as not found.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`], or an access or storage error.
    pub async fn get(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        id: ContactId,
    ) -> Result<Contact, CareOpsError> {
        self.access.authorize(principal, workspace_id, ACCESS).await?;
        self.store
            .contacts()
            .get_by_id(id)
            .await?
            .filter(|c| c.workspace_id == workspace_id)
            .ok_or_else(|| NotFoundError::new("Contact", id).into())
    }
}
