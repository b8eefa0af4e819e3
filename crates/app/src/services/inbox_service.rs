//! Inbox service — conversations and staff replies.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use careops_domain::contact::Contact;
use careops_domain::conversation::{Channel, Conversation, Message, SenderType};
use careops_domain::error::{CareOpsError, NotFoundError};
use careops_domain::id::{ContactId, ConversationId, WorkspaceId};
use careops_domain::permission::{Access, Capability, Principal};

use crate::automation_engine::{AutomationEngine, AutomationEvent};
use crate::ports::{ContactRepository, ConversationRepository, Notifier, Store, UserRepository};
use crate::services::AccessControl;

/// A conversation in a listing, with its contact.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub contact: Option<Contact>,
}

/// A conversation with its contact and every message, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetails {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub contact: Option<Contact>,
    pub messages: Vec<Message>,
}

/// Input for [`InboxService::send_message`].
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub content: String,
    pub sender_type: SenderType,
    pub channel: Channel,
}

impl OutgoingMessage {
    /// A staff reply logged on the system channel.
    #[must_use]
    pub fn staff(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender_type: SenderType::Staff,
            channel: Channel::System,
        }
    }
}

const ACCESS: Access = Access::Capability(Capability::Inbox);

pub struct InboxService<S, N> {
    store: Arc<S>,
    access: AccessControl<S>,
    engine: Arc<AutomationEngine<S, N>>,
}

impl<S: Store, N: Notifier> InboxService<S, N> {
    pub fn new(store: Arc<S>, engine: Arc<AutomationEngine<S, N>>) -> Self {
        Self {
            access: AccessControl::new(Arc::clone(&store)),
            store,
            engine,
        }
    }

    /// Conversations of the workspace, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns an access or storage error.
    pub async fn list_conversations(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<ConversationSummary>, CareOpsError> {
        self.access.authorize(principal, workspace_id, ACCESS).await?;
        let conversations = self
            .store
            .conversations()
            .list_by_workspace(workspace_id)
            .await?;
        let contacts: HashMap<ContactId, Contact> = self
            .store
            .contacts()
            .list_by_workspace(workspace_id)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        Ok(conversations
            .into_iter()
            .map(|conversation| ConversationSummary {
                contact: contacts.get(&conversation.contact_id).cloned(),
                conversation,
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] when the conversation is not in
    /// the workspace, or an access or storage error.
    pub async fn get_conversation(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        id: ConversationId,
    ) -> Result<ConversationDetails, CareOpsError> {
        self.access.authorize(principal, workspace_id, ACCESS).await?;
        let conversation = self.conversation_in(workspace_id, id).await?;
        let contact = self
            .store
            .contacts()
            .get_by_id(conversation.contact_id)
            .await?;
        let messages = self.store.conversations().messages(id).await?;
        Ok(ConversationDetails {
            conversation,
            contact,
            messages,
        })
    }

    /// Append a message authored by the calling user.
    ///
    /// A staff message fires the staff-replied rule, which pauses automated
    /// reminders for the contact.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] for blank content,
    /// [`CareOpsError::NotFound`] for a conversation outside the workspace,
    /// or an access or storage error.
    #[tracing::instrument(skip(self, principal, outgoing), fields(workspace_id = %workspace_id, conversation_id = %id))]
    pub async fn send_message(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        id: ConversationId,
        outgoing: OutgoingMessage,
    ) -> Result<Message, CareOpsError> {
        self.access.authorize(principal, workspace_id, ACCESS).await?;
        let mut conversation = self.conversation_in(workspace_id, id).await?;
        let sender = self
            .store
            .users()
            .get_by_id(principal.user_id)
            .await?
            .map_or_else(|| principal.email.clone(), |u| u.full_name);

        let message = Message::new(
            id,
            outgoing.sender_type,
            sender,
            outgoing.content,
            outgoing.channel,
        )?;
        let message = self.store.conversations().append_message(message).await?;
        conversation.touch(&message);
        tracing::info!(message_id = %message.id, "message sent");

        if message.sender_type == SenderType::Staff {
            self.engine
                .dispatch(AutomationEvent::StaffReplied {
                    message: message.clone(),
                    conversation,
                })
                .await;
        }
        Ok(message)
    }

    /// Open or close a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] for a conversation outside the
    /// workspace, or an access or storage error.
    pub async fn set_open(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        id: ConversationId,
        is_open: bool,
    ) -> Result<Conversation, CareOpsError> {
        self.access.authorize(principal, workspace_id, ACCESS).await?;
        let mut conversation = self.conversation_in(workspace_id, id).await?;
        conversation.is_open = is_open;
        self.store.conversations().update(conversation).await
    }

    async fn conversation_in(
        &self,
        workspace_id: WorkspaceId,
        id: ConversationId,
    ) -> Result<Conversation, CareOpsError> {
        self.store
            .conversations()
            .get_by_id(id)
            .await?
            .filter(|c| c.workspace_id == workspace_id)
            .ok_or_else(|| NotFoundError::new("Conversation", id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careops_domain::error::ValidationError;
    use careops_domain::id::UserId;
    use careops_domain::permission::Denied;
    use careops_domain::staff::{StaffMember, StaffPermissions, StaffRole};
    use careops_domain::user::User;
    use careops_domain::workspace::Workspace;

    use crate::automation_engine::AutomationSettings;
    use crate::ports::{StaffRepository, WorkspaceRepository};
    use crate::testing::{InMemoryStore, SpyNotifier};

    struct Fixture {
        service: InboxService<InMemoryStore, SpyNotifier>,
        store: Arc<InMemoryStore>,
        owner: Principal,
        workspace: Workspace,
        conversation: Conversation,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::default());
        let user = User::builder()
            .email("owner@clinic.test")
            .full_name("Olive Owner")
            .build()
            .unwrap();
        store.users().create(user.clone()).await.unwrap();
        let owner = Principal {
            user_id: user.id,
            email: user.email,
        };
        let workspace = Workspace::builder()
            .owner_id(owner.user_id)
            .name("Clinic")
            .build()
            .unwrap();
        store.workspaces().create(workspace.clone()).await.unwrap();
        let contact = Contact::builder()
            .workspace_id(workspace.id)
            .name("Grace")
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
        let engine = Arc::new(AutomationEngine::new(
            Arc::clone(&store),
            Arc::new(SpyNotifier::default()),
            AutomationSettings::default(),
        ));
        Fixture {
            service: InboxService::new(Arc::clone(&store), engine),
            store,
            owner,
            workspace,
            conversation,
        }
    }

    #[tokio::test]
    async fn should_append_staff_reply_under_sender_full_name() {
        let f = fixture().await;

        let message = f
            .service
            .send_message(
                &f.owner,
                f.workspace.id,
                f.conversation.id,
                OutgoingMessage::staff("See you Tuesday"),
            )
            .await
            .unwrap();

        assert_eq!(message.sender_name, "Olive Owner");
        let details = f
            .service
            .get_conversation(&f.owner, f.workspace.id, f.conversation.id)
            .await
            .unwrap();
        assert_eq!(details.messages.len(), 2);
        assert_eq!(details.messages[1].content, "See you Tuesday");
        assert_eq!(details.contact.unwrap().name, "Grace");
    }

    #[tokio::test]
    async fn should_record_staff_reply_time_when_staff_sends() {
        let f = fixture().await;
        let message = f
            .service
            .send_message(
                &f.owner,
                f.workspace.id,
                f.conversation.id,
                OutgoingMessage::staff("Hello"),
            )
            .await
            .unwrap();

        let stored = f
            .store
            .conversations()
            .get_by_id(f.conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_staff_reply_at, Some(message.created_at));
        assert!(stored.updated_at >= message.created_at);
    }

    #[tokio::test]
    async fn should_not_record_staff_reply_for_customer_message() {
        let f = fixture().await;
        f.service
            .send_message(
                &f.owner,
                f.workspace.id,
                f.conversation.id,
                OutgoingMessage {
                    content: "Can I move my slot?".to_string(),
                    sender_type: SenderType::Customer,
                    channel: Channel::Email,
                },
            )
            .await
            .unwrap();

        let stored = f
            .store
            .conversations()
            .get_by_id(f.conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.last_staff_reply_at.is_none());
    }

    #[tokio::test]
    async fn should_reject_blank_content() {
        let f = fixture().await;
        let result = f
            .service
            .send_message(
                &f.owner,
                f.workspace.id,
                f.conversation.id,
                OutgoingMessage::staff("  "),
            )
            .await;
        assert!(matches!(
            result,
            Err(CareOpsError::Validation(ValidationError::EmptyField {
                field: "content"
            }))
        ));
    }

    #[tokio::test]
    async fn should_deny_staff_without_inbox_flag() {
        let f = fixture().await;
        let staff = Principal {
            user_id: UserId::new(),
            email: "staff@clinic.test".to_string(),
        };
        f.store
            .staff()
            .create(StaffMember::new(
                f.workspace.id,
                staff.user_id,
                StaffRole::Staff,
                StaffPermissions {
                    can_manage_inbox: false,
                    ..StaffPermissions::default()
                },
            ))
            .await
            .unwrap();

        let result = f.service.list_conversations(&staff, f.workspace.id).await;

        assert!(matches!(
            result,
            Err(CareOpsError::Forbidden(Denied::MissingPermission(
                Capability::Inbox
            )))
        ));
    }

    #[tokio::test]
    async fn should_close_and_reopen_conversation() {
        let f = fixture().await;
        let closed = f
            .service
            .set_open(&f.owner, f.workspace.id, f.conversation.id, false)
            .await
            .unwrap();
        assert!(!closed.is_open);

        let reopened = f
            .service
            .set_open(&f.owner, f.workspace.id, f.conversation.id, true)
            .await
            .unwrap();
        assert!(reopened.is_open);
    }

    #[tokio::test]
    async fn should_list_conversations_with_contacts() {
        let f = fixture().await;
        let listed = f
            .service
            .list_conversations(&f.owner, f.workspace.id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].contact.as_ref().unwrap().name, "Grace");
    }
}
