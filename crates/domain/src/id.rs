//! Typed identifier newtypes backed by UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a [`User`](crate::user::User).
    UserId
);

define_id!(
    /// Unique identifier for a [`Workspace`](crate::workspace::Workspace).
    WorkspaceId
);

define_id!(
    /// Unique identifier for a [`StaffMember`](crate::staff::StaffMember).
    StaffId
);

define_id!(
    /// Unique identifier for a [`Contact`](crate::contact::Contact).
    ContactId
);

define_id!(
    /// Unique identifier for a [`Conversation`](crate::conversation::Conversation).
    ConversationId
);

define_id!(
    /// Unique identifier for a [`Message`](crate::conversation::Message).
    MessageId
);

define_id!(
    /// Unique identifier for a [`Booking`](crate::booking::Booking).
    BookingId
);

define_id!(
    /// Unique identifier for a [`Form`](crate::form::Form).
    FormId
);

define_id!(
    /// Unique identifier for a [`FormSubmission`](crate::form::FormSubmission).
    SubmissionId
);

define_id!(
    /// Unique identifier for an [`InventoryItem`](crate::inventory::InventoryItem).
    InventoryItemId
);
