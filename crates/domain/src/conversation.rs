//! Conversation threads between a workspace and a contact.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{CareOpsError, ValidationError};
use crate::id::{ContactId, ConversationId, MessageId, WorkspaceId};
use crate::time::{Timestamp, now};

/// Display name used for messages authored by the platform itself.
pub const SYSTEM_SENDER: &str = "CareOps";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub workspace_id: WorkspaceId,
    pub contact_id: ContactId,
    pub is_open: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// When staff last replied; drives automation suppression.
    pub last_staff_reply_at: Option<Timestamp>,
}

impl Conversation {
    /// Open a new thread for `contact_id`.
    #[must_use]
    pub fn open(workspace_id: WorkspaceId, contact_id: ContactId) -> Self {
        let created_at = now();
        Self {
            id: ConversationId::new(),
            workspace_id,
            contact_id,
            is_open: true,
            created_at,
            updated_at: created_at,
            last_staff_reply_at: None,
        }
    }

    /// Bump the last-activity timestamp for a newly appended `message`.
    pub fn touch(&mut self, message: &Message) {
        if message.created_at > self.updated_at {
            self.updated_at = message.created_at;
        }
    }

    /// Record a staff reply at `at`.
    pub fn mark_staff_reply(&mut self, at: Timestamp) {
        self.last_staff_reply_at = Some(at);
        if at > self.updated_at {
            self.updated_at = at;
        }
    }

    /// Whether staff replied within `cooldown` before `at`.
    #[must_use]
    pub fn answered_by_staff_within(&self, at: Timestamp, cooldown: Duration) -> bool {
        self.last_staff_reply_at
            .is_some_and(|replied| at - replied <= cooldown)
    }
}

/// Author kind of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    Customer,
    Staff,
    System,
}

/// Transport a [`Message`] travelled (or was logged) on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    System,
}

macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ValidationError::UnknownValue {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(SenderType, "sender type", {
    Customer => "customer",
    Staff => "staff",
    System => "system",
});

text_enum!(Channel, "channel", {
    Email => "email",
    Sms => "sms",
    System => "system",
});

/// A single entry in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_type: SenderType,
    pub sender_name: String,
    pub content: String,
    pub channel: Channel,
    pub created_at: Timestamp,
}

impl Message {
    /// Build a message, rejecting empty content.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] when `content` is blank.
    pub fn new(
        conversation_id: ConversationId,
        sender_type: SenderType,
        sender_name: impl Into<String>,
        content: impl Into<String>,
        channel: Channel,
    ) -> Result<Self, CareOpsError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "content" }.into());
        }
        Ok(Self {
            id: MessageId::new(),
            conversation_id,
            sender_type,
            sender_name: sender_name.into(),
            content,
            channel,
            created_at: now(),
        })
    }

    /// A platform-authored message on the system channel.
    #[must_use]
    pub fn system(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            sender_type: SenderType::System,
            sender_name: SYSTEM_SENDER.to_string(),
            content: content.into(),
            channel: Channel::System,
            created_at: now(),
        }
    }

    /// The greeting logged when a contact's conversation is opened.
    #[must_use]
    pub fn welcome(conversation_id: ConversationId, contact_name: &str) -> Self {
        Self::system(
            conversation_id,
            format!(
                "Welcome {contact_name}! We've received your inquiry and will get back to you shortly."
            ),
        )
    }
}
