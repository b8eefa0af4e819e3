//! Storage port — repository traits for persistence.
//!
//! One repository per aggregate, bundled behind [`Store`] so services take a
//! single storage parameter. Writes that must be atomic (contact with its
//! conversation, booking with its inventory and form side effects) are single
//! repository calls; adapters run them in one transaction.

use std::future::Future;

use careops_domain::booking::Booking;
use careops_domain::contact::Contact;
use careops_domain::conversation::{Conversation, Message};
use careops_domain::error::CareOpsError;
use careops_domain::form::{Form, FormSubmission};
use careops_domain::id::{
    BookingId, ContactId, ConversationId, FormId, InventoryItemId, StaffId, SubmissionId, UserId,
    WorkspaceId,
};
use careops_domain::inventory::InventoryItem;
use careops_domain::staff::StaffMember;
use careops_domain::time::Timestamp;
use careops_domain::user::User;
use careops_domain::workspace::{ActivationChecklist, Workspace};

/// Repository for [`User`] accounts.
pub trait UserRepository {
    fn create(&self, user: User) -> impl Future<Output = Result<User, CareOpsError>> + Send;

    fn get_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, CareOpsError>> + Send;

    /// Look up a user by exact (already normalized) email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, CareOpsError>> + Send;

    fn update(&self, user: User) -> impl Future<Output = Result<User, CareOpsError>> + Send;
}

/// Repository for [`Workspace`] tenants.
pub trait WorkspaceRepository {
    fn create(
        &self,
        workspace: Workspace,
    ) -> impl Future<Output = Result<Workspace, CareOpsError>> + Send;

    fn get_by_id(
        &self,
        id: WorkspaceId,
    ) -> impl Future<Output = Result<Option<Workspace>, CareOpsError>> + Send;

    /// Workspaces owned by `owner`, oldest first.
    fn list_by_owner(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<Workspace>, CareOpsError>> + Send;

    fn update(
        &self,
        workspace: Workspace,
    ) -> impl Future<Output = Result<Workspace, CareOpsError>> + Send;

    /// Current booking and form counts of a workspace, read together.
    fn activation_checklist(
        &self,
        id: WorkspaceId,
    ) -> impl Future<Output = Result<ActivationChecklist, CareOpsError>> + Send;
}

/// Repository for [`StaffMember`] associations.
pub trait StaffRepository {
    fn create(
        &self,
        staff: StaffMember,
    ) -> impl Future<Output = Result<StaffMember, CareOpsError>> + Send;

    fn get_by_id(
        &self,
        id: StaffId,
    ) -> impl Future<Output = Result<Option<StaffMember>, CareOpsError>> + Send;

    /// The membership of `user` in `workspace`, if any.
    fn find(
        &self,
        workspace: WorkspaceId,
        user: UserId,
    ) -> impl Future<Output = Result<Option<StaffMember>, CareOpsError>> + Send;

    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<StaffMember>, CareOpsError>> + Send;

    fn update(
        &self,
        staff: StaffMember,
    ) -> impl Future<Output = Result<StaffMember, CareOpsError>> + Send;
}

/// Repository for [`Contact`]s.
pub trait ContactRepository {
    /// Atomically persist a contact, its conversation and the conversation's
    /// first message.
    fn create_with_conversation(
        &self,
        contact: Contact,
        conversation: Conversation,
        welcome: Message,
    ) -> impl Future<Output = Result<Contact, CareOpsError>> + Send;

    fn get_by_id(
        &self,
        id: ContactId,
    ) -> impl Future<Output = Result<Option<Contact>, CareOpsError>> + Send;

    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<Contact>, CareOpsError>> + Send;
}

/// Repository for [`Conversation`]s and their [`Message`]s.
pub trait ConversationRepository {
    fn get_by_id(
        &self,
        id: ConversationId,
    ) -> impl Future<Output = Result<Option<Conversation>, CareOpsError>> + Send;

    /// The oldest conversation opened for `contact`.
    fn find_by_contact(
        &self,
        contact: ContactId,
    ) -> impl Future<Output = Result<Option<Conversation>, CareOpsError>> + Send;

    /// Conversations of a workspace, most recently updated first.
    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<Conversation>, CareOpsError>> + Send;

    /// The `limit` most recently updated conversations of a workspace.
    fn recent_by_workspace(
        &self,
        workspace: WorkspaceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Conversation>, CareOpsError>> + Send;

    fn count_open(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<u64, CareOpsError>> + Send;

    fn update(
        &self,
        conversation: Conversation,
    ) -> impl Future<Output = Result<Conversation, CareOpsError>> + Send;

    /// Atomically insert `message` and bump its conversation's `updated_at`.
    fn append_message(
        &self,
        message: Message,
    ) -> impl Future<Output = Result<Message, CareOpsError>> + Send;

    /// Messages of a conversation, oldest first.
    fn messages(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<Vec<Message>, CareOpsError>> + Send;
}

/// Result of [`BookingRepository::create_with_effects`].
#[derive(Debug, Clone)]
pub struct BookingCommit {
    pub booking: Booking,
    pub submissions: Vec<FormSubmission>,
    /// Every inventory item of the workspace, after consumption.
    pub inventory: Vec<InventoryItem>,
}

/// Repository for [`Booking`]s.
pub trait BookingRepository {
    /// Atomically insert `booking`, consume one booking's worth of every
    /// inventory item in its workspace, and insert `submissions`.
    fn create_with_effects(
        &self,
        booking: Booking,
        submissions: Vec<FormSubmission>,
    ) -> impl Future<Output = Result<BookingCommit, CareOpsError>> + Send;

    fn get_by_id(
        &self,
        id: BookingId,
    ) -> impl Future<Output = Result<Option<Booking>, CareOpsError>> + Send;

    /// Bookings of a workspace ordered by schedule.
    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<Booking>, CareOpsError>> + Send;

    /// The `limit` most recently created bookings of a workspace.
    fn recent_by_workspace(
        &self,
        workspace: WorkspaceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Booking>, CareOpsError>> + Send;

    /// Bookings scheduled in `[from, until)`, or from `from` onwards when
    /// `until` is `None`.
    fn count_scheduled(
        &self,
        workspace: WorkspaceId,
        from: Timestamp,
        until: Option<Timestamp>,
    ) -> impl Future<Output = Result<u64, CareOpsError>> + Send;

    fn update(
        &self,
        booking: Booking,
    ) -> impl Future<Output = Result<Booking, CareOpsError>> + Send;
}

/// Submission counters for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionCounts {
    pub pending: u64,
    pub overdue: u64,
    pub completed: u64,
}

/// Repository for [`Form`] templates and [`FormSubmission`]s.
pub trait FormRepository {
    fn create(&self, form: Form) -> impl Future<Output = Result<Form, CareOpsError>> + Send;

    fn get_by_id(
        &self,
        id: FormId,
    ) -> impl Future<Output = Result<Option<Form>, CareOpsError>> + Send;

    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<Form>, CareOpsError>> + Send;

    fn get_submission(
        &self,
        id: SubmissionId,
    ) -> impl Future<Output = Result<Option<FormSubmission>, CareOpsError>> + Send;

    fn list_submissions(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<FormSubmission>, CareOpsError>> + Send;

    /// Pending submissions linked to `booking`.
    fn pending_for_booking(
        &self,
        booking: BookingId,
    ) -> impl Future<Output = Result<Vec<FormSubmission>, CareOpsError>> + Send;

    /// Pending submissions of every workspace with `after < due_at <= until`.
    fn pending_due_between(
        &self,
        after: Timestamp,
        until: Timestamp,
    ) -> impl Future<Output = Result<Vec<FormSubmission>, CareOpsError>> + Send;

    fn update_submission(
        &self,
        submission: FormSubmission,
    ) -> impl Future<Output = Result<FormSubmission, CareOpsError>> + Send;

    /// Pending, overdue (pending with `due_at < now`) and completed counts.
    fn submission_counts(
        &self,
        workspace: WorkspaceId,
        now: Timestamp,
    ) -> impl Future<Output = Result<SubmissionCounts, CareOpsError>> + Send;
}

/// Repository for [`InventoryItem`]s.
pub trait InventoryRepository {
    fn create(
        &self,
        item: InventoryItem,
    ) -> impl Future<Output = Result<InventoryItem, CareOpsError>> + Send;

    fn get_by_id(
        &self,
        id: InventoryItemId,
    ) -> impl Future<Output = Result<Option<InventoryItem>, CareOpsError>> + Send;

    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<InventoryItem>, CareOpsError>> + Send;

    fn update(
        &self,
        item: InventoryItem,
    ) -> impl Future<Output = Result<InventoryItem, CareOpsError>> + Send;

    /// Items at or below their threshold.
    fn count_low(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<u64, CareOpsError>> + Send;
}

/// All repositories of one storage backend.
pub trait Store: Send + Sync + 'static {
    type Users: UserRepository + Send + Sync;
    type Workspaces: WorkspaceRepository + Send + Sync;
    type Staff: StaffRepository + Send + Sync;
    type Contacts: ContactRepository + Send + Sync;
    type Conversations: ConversationRepository + Send + Sync;
    type Bookings: BookingRepository + Send + Sync;
    type Forms: FormRepository + Send + Sync;
    type Inventory: InventoryRepository + Send + Sync;

    fn users(&self) -> &Self::Users;
    fn workspaces(&self) -> &Self::Workspaces;
    fn staff(&self) -> &Self::Staff;
    fn contacts(&self) -> &Self::Contacts;
    fn conversations(&self) -> &Self::Conversations;
    fn bookings(&self) -> &Self::Bookings;
    fn forms(&self) -> &Self::Forms;
    fn inventory(&self) -> &Self::Inventory;
}
