//! In-memory implementations of every port, for tests.
//!
//! Enabled for this crate's own tests and, through the `testing` feature, for
//! downstream crates that need services without a database or network.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use careops_domain::booking::Booking;
use careops_domain::contact::Contact;
use careops_domain::conversation::{Conversation, Message};
use careops_domain::error::{AuthError, CareOpsError};
use careops_domain::form::{Form, FormSubmission, SubmissionStatus};
use careops_domain::id::{
    BookingId, ContactId, ConversationId, FormId, InventoryItemId, StaffId, SubmissionId, UserId,
    WorkspaceId,
};
use careops_domain::inventory::InventoryItem;
use careops_domain::notification::{Delivery, EmailMessage, SmsMessage};
use careops_domain::staff::StaffMember;
use careops_domain::time::Timestamp;
use careops_domain::user::User;
use careops_domain::workspace::{ActivationChecklist, Workspace};

use crate::ports::storage::{
    BookingCommit, BookingRepository, ContactRepository, ConversationRepository, FormRepository,
    InventoryRepository, StaffRepository, Store, SubmissionCounts, UserRepository,
    WorkspaceRepository,
};
use crate::ports::{AccessToken, Credentials, Notifier};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    workspaces: HashMap<WorkspaceId, Workspace>,
    staff: HashMap<StaffId, StaffMember>,
    contacts: HashMap<ContactId, Contact>,
    conversations: HashMap<ConversationId, Conversation>,
    messages: Vec<Message>,
    bookings: HashMap<BookingId, Booking>,
    forms: HashMap<FormId, Form>,
    submissions: HashMap<SubmissionId, FormSubmission>,
    inventory: HashMap<InventoryItemId, InventoryItem>,
}

type Shared = Arc<Mutex<Tables>>;

fn lock(tables: &Shared) -> MutexGuard<'_, Tables> {
    tables.lock().unwrap_or_else(PoisonError::into_inner)
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

pub struct InMemoryUsers(Shared);
pub struct InMemoryWorkspaces(Shared);
pub struct InMemoryStaff(Shared);
pub struct InMemoryContacts(Shared);
pub struct InMemoryConversations(Shared);
pub struct InMemoryBookings(Shared);
pub struct InMemoryForms(Shared);
pub struct InMemoryInventory(Shared);

/// A [`Store`] keeping every table in one mutex-guarded map set.
pub struct InMemoryStore {
    users: InMemoryUsers,
    workspaces: InMemoryWorkspaces,
    staff: InMemoryStaff,
    contacts: InMemoryContacts,
    conversations: InMemoryConversations,
    bookings: InMemoryBookings,
    forms: InMemoryForms,
    inventory: InMemoryInventory,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        let tables: Shared = Arc::default();
        Self {
            users: InMemoryUsers(tables.clone()),
            workspaces: InMemoryWorkspaces(tables.clone()),
            staff: InMemoryStaff(tables.clone()),
            contacts: InMemoryContacts(tables.clone()),
            conversations: InMemoryConversations(tables.clone()),
            bookings: InMemoryBookings(tables.clone()),
            forms: InMemoryForms(tables.clone()),
            inventory: InMemoryInventory(tables),
        }
    }
}

impl Store for InMemoryStore {
    type Users = InMemoryUsers;
    type Workspaces = InMemoryWorkspaces;
    type Staff = InMemoryStaff;
    type Contacts = InMemoryContacts;
    type Conversations = InMemoryConversations;
    type Bookings = InMemoryBookings;
    type Forms = InMemoryForms;
    type Inventory = InMemoryInventory;

    fn users(&self) -> &Self::Users {
        &self.users
    }
    fn workspaces(&self) -> &Self::Workspaces {
        &self.workspaces
    }
    fn staff(&self) -> &Self::Staff {
        &self.staff
    }
    fn contacts(&self) -> &Self::Contacts {
        &self.contacts
    }
    fn conversations(&self) -> &Self::Conversations {
        &self.conversations
    }
    fn bookings(&self) -> &Self::Bookings {
        &self.bookings
    }
    fn forms(&self) -> &Self::Forms {
        &self.forms
    }
    fn inventory(&self) -> &Self::Inventory {
        &self.inventory
    }
}

impl UserRepository for InMemoryUsers {
    fn create(&self, user: User) -> impl Future<Output = Result<User, CareOpsError>> + Send {
        lock(&self.0).users.insert(user.id, user.clone());
        async { Ok(user) }
    }

    fn get_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, CareOpsError>> + Send {
        let result = lock(&self.0).users.get(&id).cloned();
        async { Ok(result) }
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, CareOpsError>> + Send {
        let result = lock(&self.0)
            .users
            .values()
            .find(|u| u.email == email)
            .cloned();
        async { Ok(result) }
    }

    fn update(&self, user: User) -> impl Future<Output = Result<User, CareOpsError>> + Send {
        lock(&self.0).users.insert(user.id, user.clone());
        async { Ok(user) }
    }
}

impl WorkspaceRepository for InMemoryWorkspaces {
    fn create(
        &self,
        workspace: Workspace,
    ) -> impl Future<Output = Result<Workspace, CareOpsError>> + Send {
        lock(&self.0)
            .workspaces
            .insert(workspace.id, workspace.clone());
        async { Ok(workspace) }
    }

    fn get_by_id(
        &self,
        id: WorkspaceId,
    ) -> impl Future<Output = Result<Option<Workspace>, CareOpsError>> + Send {
        let result = lock(&self.0).workspaces.get(&id).cloned();
        async { Ok(result) }
    }

    fn list_by_owner(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<Workspace>, CareOpsError>> + Send {
        let mut result: Vec<Workspace> = lock(&self.0)
            .workspaces
            .values()
            .filter(|w| w.owner_id == owner)
            .cloned()
            .collect();
        result.sort_by_key(|w| w.created_at);
        async { Ok(result) }
    }

    fn update(
        &self,
        workspace: Workspace,
    ) -> impl Future<Output = Result<Workspace, CareOpsError>> + Send {
        lock(&self.0)
            .workspaces
            .insert(workspace.id, workspace.clone());
        async { Ok(workspace) }
    }

    fn activation_checklist(
        &self,
        id: WorkspaceId,
    ) -> impl Future<Output = Result<ActivationChecklist, CareOpsError>> + Send {
        let tables = lock(&self.0);
        let checklist = ActivationChecklist {
            booking_count: count(
                tables
                    .bookings
                    .values()
                    .filter(|b| b.workspace_id == id)
                    .count(),
            ),
            form_count: count(tables.forms.values().filter(|f| f.workspace_id == id).count()),
        };
        async move { Ok(checklist) }
    }
}

impl StaffRepository for InMemoryStaff {
    fn create(
        &self,
        staff: StaffMember,
    ) -> impl Future<Output = Result<StaffMember, CareOpsError>> + Send {
        lock(&self.0).staff.insert(staff.id, staff.clone());
        async { Ok(staff) }
    }

    fn get_by_id(
        &self,
        id: StaffId,
    ) -> impl Future<Output = Result<Option<StaffMember>, CareOpsError>> + Send {
        let result = lock(&self.0).staff.get(&id).cloned();
        async { Ok(result) }
    }

    fn find(
        &self,
        workspace: WorkspaceId,
        user: UserId,
    ) -> impl Future<Output = Result<Option<StaffMember>, CareOpsError>> + Send {
        let result = lock(&self.0)
            .staff
            .values()
            .find(|s| s.workspace_id == workspace && s.user_id == user)
            .cloned();
        async { Ok(result) }
    }

    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<StaffMember>, CareOpsError>> + Send {
        let mut result: Vec<StaffMember> = lock(&self.0)
            .staff
            .values()
            .filter(|s| s.workspace_id == workspace)
            .cloned()
            .collect();
        result.sort_by_key(|s| s.created_at);
        async { Ok(result) }
    }

    fn update(
        &self,
        staff: StaffMember,
    ) -> impl Future<Output = Result<StaffMember, CareOpsError>> + Send {
        lock(&self.0).staff.insert(staff.id, staff.clone());
        async { Ok(staff) }
    }
}

impl ContactRepository for InMemoryContacts {
    fn create_with_conversation(
        &self,
        contact: Contact,
        conversation: Conversation,
        welcome: Message,
    ) -> impl Future<Output = Result<Contact, CareOpsError>> + Send {
        let mut tables = lock(&self.0);
        tables.contacts.insert(contact.id, contact.clone());
        tables.conversations.insert(conversation.id, conversation);
        tables.messages.push(welcome);
        async { Ok(contact) }
    }

    fn get_by_id(
        &self,
        id: ContactId,
    ) -> impl Future<Output = Result<Option<Contact>, CareOpsError>> + Send {
        let result = lock(&self.0).contacts.get(&id).cloned();
        async { Ok(result) }
    }

    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<Contact>, CareOpsError>> + Send {
        let mut result: Vec<Contact> = lock(&self.0)
            .contacts
            .values()
            .filter(|c| c.workspace_id == workspace)
            .cloned()
            .collect();
        result.sort_by_key(|c| c.created_at);
        async { Ok(result) }
    }
}

impl InMemoryConversations {
    fn sorted_by_activity(&self, workspace: WorkspaceId) -> Vec<Conversation> {
        let mut result: Vec<Conversation> = lock(&self.0)
            .conversations
            .values()
            .filter(|c| c.workspace_id == workspace)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        result
    }
}

impl ConversationRepository for InMemoryConversations {
    fn get_by_id(
        &self,
        id: ConversationId,
    ) -> impl Future<Output = Result<Option<Conversation>, CareOpsError>> + Send {
        let result = lock(&self.0).conversations.get(&id).cloned();
        async { Ok(result) }
    }

    fn find_by_contact(
        &self,
        contact: ContactId,
    ) -> impl Future<Output = Result<Option<Conversation>, CareOpsError>> + Send {
        let result = lock(&self.0)
            .conversations
            .values()
            .filter(|c| c.contact_id == contact)
            .min_by_key(|c| c.created_at)
            .cloned();
        async { Ok(result) }
    }

    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<Conversation>, CareOpsError>> + Send {
        let result = self.sorted_by_activity(workspace);
        async { Ok(result) }
    }

    fn recent_by_workspace(
        &self,
        workspace: WorkspaceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Conversation>, CareOpsError>> + Send {
        let mut result = self.sorted_by_activity(workspace);
        result.truncate(limit);
        async { Ok(result) }
    }

    fn count_open(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<u64, CareOpsError>> + Send {
        let n = lock(&self.0)
            .conversations
            .values()
            .filter(|c| c.workspace_id == workspace && c.is_open)
            .count();
        async move { Ok(count(n)) }
    }

    fn update(
        &self,
        conversation: Conversation,
    ) -> impl Future<Output = Result<Conversation, CareOpsError>> + Send {
        lock(&self.0)
            .conversations
            .insert(conversation.id, conversation.clone());
        async { Ok(conversation) }
    }

    fn append_message(
        &self,
        message: Message,
    ) -> impl Future<Output = Result<Message, CareOpsError>> + Send {
        let mut tables = lock(&self.0);
        if let Some(conversation) = tables.conversations.get_mut(&message.conversation_id) {
            conversation.touch(&message);
        }
        tables.messages.push(message.clone());
        async { Ok(message) }
    }

    fn messages(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<Vec<Message>, CareOpsError>> + Send {
        let result: Vec<Message> = lock(&self.0)
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation)
            .cloned()
            .collect();
        async { Ok(result) }
    }
}

impl BookingRepository for InMemoryBookings {
    fn create_with_effects(
        &self,
        booking: Booking,
        submissions: Vec<FormSubmission>,
    ) -> impl Future<Output = Result<BookingCommit, CareOpsError>> + Send {
        let mut tables = lock(&self.0);
        tables.bookings.insert(booking.id, booking.clone());
        let mut inventory = Vec::new();
        for item in tables.inventory.values_mut() {
            if item.workspace_id == booking.workspace_id {
                item.consume_for_booking();
                inventory.push(item.clone());
            }
        }
        for submission in &submissions {
            tables.submissions.insert(submission.id, submission.clone());
        }
        async {
            Ok(BookingCommit {
                booking,
                submissions,
                inventory,
            })
        }
    }

    fn get_by_id(
        &self,
        id: BookingId,
    ) -> impl Future<Output = Result<Option<Booking>, CareOpsError>> + Send {
        let result = lock(&self.0).bookings.get(&id).cloned();
        async { Ok(result) }
    }

    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<Booking>, CareOpsError>> + Send {
        let mut result: Vec<Booking> = lock(&self.0)
            .bookings
            .values()
            .filter(|b| b.workspace_id == workspace)
            .cloned()
            .collect();
        result.sort_by_key(|b| b.scheduled_at);
        async { Ok(result) }
    }

    fn recent_by_workspace(
        &self,
        workspace: WorkspaceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Booking>, CareOpsError>> + Send {
        let mut result: Vec<Booking> = lock(&self.0)
            .bookings
            .values()
            .filter(|b| b.workspace_id == workspace)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result.truncate(limit);
        async { Ok(result) }
    }

    fn count_scheduled(
        &self,
        workspace: WorkspaceId,
        from: Timestamp,
        until: Option<Timestamp>,
    ) -> impl Future<Output = Result<u64, CareOpsError>> + Send {
        let n = lock(&self.0)
            .bookings
            .values()
            .filter(|b| {
                b.workspace_id == workspace
                    && b.scheduled_at >= from
                    && until.is_none_or(|until| b.scheduled_at < until)
            })
            .count();
        async move { Ok(count(n)) }
    }

    fn update(
        &self,
        booking: Booking,
    ) -> impl Future<Output = Result<Booking, CareOpsError>> + Send {
        lock(&self.0).bookings.insert(booking.id, booking.clone());
        async { Ok(booking) }
    }
}

impl FormRepository for InMemoryForms {
    fn create(&self, form: Form) -> impl Future<Output = Result<Form, CareOpsError>> + Send {
        lock(&self.0).forms.insert(form.id, form.clone());
        async { Ok(form) }
    }

    fn get_by_id(
        &self,
        id: FormId,
    ) -> impl Future<Output = Result<Option<Form>, CareOpsError>> + Send {
        let result = lock(&self.0).forms.get(&id).cloned();
        async { Ok(result) }
    }

    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<Form>, CareOpsError>> + Send {
        let mut result: Vec<Form> = lock(&self.0)
            .forms
            .values()
            .filter(|f| f.workspace_id == workspace)
            .cloned()
            .collect();
        result.sort_by_key(|f| f.created_at);
        async { Ok(result) }
    }

    fn get_submission(
        &self,
        id: SubmissionId,
    ) -> impl Future<Output = Result<Option<FormSubmission>, CareOpsError>> + Send {
        let result = lock(&self.0).submissions.get(&id).cloned();
        async { Ok(result) }
    }

    fn list_submissions(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<FormSubmission>, CareOpsError>> + Send {
        let mut result: Vec<FormSubmission> = lock(&self.0)
            .submissions
            .values()
            .filter(|s| s.workspace_id == workspace)
            .cloned()
            .collect();
        result.sort_by_key(|s| s.due_at);
        async { Ok(result) }
    }

    fn pending_for_booking(
        &self,
        booking: BookingId,
    ) -> impl Future<Output = Result<Vec<FormSubmission>, CareOpsError>> + Send {
        let result: Vec<FormSubmission> = lock(&self.0)
            .submissions
            .values()
            .filter(|s| s.booking_id == Some(booking) && s.status == SubmissionStatus::Pending)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn pending_due_between(
        &self,
        after: Timestamp,
        until: Timestamp,
    ) -> impl Future<Output = Result<Vec<FormSubmission>, CareOpsError>> + Send {
        let result: Vec<FormSubmission> = lock(&self.0)
            .submissions
            .values()
            .filter(|s| {
                s.status == SubmissionStatus::Pending
                    && s.due_at.is_some_and(|due| due > after && due <= until)
            })
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn update_submission(
        &self,
        submission: FormSubmission,
    ) -> impl Future<Output = Result<FormSubmission, CareOpsError>> + Send {
        lock(&self.0)
            .submissions
            .insert(submission.id, submission.clone());
        async { Ok(submission) }
    }

    fn submission_counts(
        &self,
        workspace: WorkspaceId,
        now: Timestamp,
    ) -> impl Future<Output = Result<SubmissionCounts, CareOpsError>> + Send {
        let tables = lock(&self.0);
        let mut counts = SubmissionCounts::default();
        for submission in tables
            .submissions
            .values()
            .filter(|s| s.workspace_id == workspace)
        {
            match submission.status {
                SubmissionStatus::Pending => {
                    counts.pending += 1;
                    if submission.is_overdue(now) {
                        counts.overdue += 1;
                    }
                }
                SubmissionStatus::Completed => counts.completed += 1,
            }
        }
        async move { Ok(counts) }
    }
}

impl InventoryRepository for InMemoryInventory {
    fn create(
        &self,
        item: InventoryItem,
    ) -> impl Future<Output = Result<InventoryItem, CareOpsError>> + Send {
        lock(&self.0).inventory.insert(item.id, item.clone());
        async { Ok(item) }
    }

    fn get_by_id(
        &self,
        id: InventoryItemId,
    ) -> impl Future<Output = Result<Option<InventoryItem>, CareOpsError>> + Send {
        let result = lock(&self.0).inventory.get(&id).cloned();
        async { Ok(result) }
    }

    fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<Vec<InventoryItem>, CareOpsError>> + Send {
        let mut result: Vec<InventoryItem> = lock(&self.0)
            .inventory
            .values()
            .filter(|i| i.workspace_id == workspace)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        async { Ok(result) }
    }

    fn update(
        &self,
        item: InventoryItem,
    ) -> impl Future<Output = Result<InventoryItem, CareOpsError>> + Send {
        lock(&self.0).inventory.insert(item.id, item.clone());
        async { Ok(item) }
    }

    fn count_low(
        &self,
        workspace: WorkspaceId,
    ) -> impl Future<Output = Result<u64, CareOpsError>> + Send {
        let n = lock(&self.0)
            .inventory
            .values()
            .filter(|i| i.workspace_id == workspace && i.is_low())
            .count();
        async move { Ok(count(n)) }
    }
}

/// A [`Notifier`] that records every message and answers with a fixed outcome.
pub struct SpyNotifier {
    emails: Mutex<Vec<EmailMessage>>,
    sms: Mutex<Vec<SmsMessage>>,
    outcome: Delivery,
}

impl Default for SpyNotifier {
    fn default() -> Self {
        Self::answering(Delivery::Sent {
            reference: "spy".to_string(),
        })
    }
}

impl SpyNotifier {
    /// A spy whose every send reports `outcome`.
    #[must_use]
    pub fn answering(outcome: Delivery) -> Self {
        Self {
            emails: Mutex::new(Vec::new()),
            sms: Mutex::new(Vec::new()),
            outcome,
        }
    }

    #[must_use]
    pub fn emails(&self) -> Vec<EmailMessage> {
        self.emails
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn sms(&self) -> Vec<SmsMessage> {
        self.sms.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.emails
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.sms.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Notifier for SpyNotifier {
    fn send_email(&self, email: EmailMessage) -> impl Future<Output = Delivery> + Send {
        self.emails
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email);
        let outcome = self.outcome.clone();
        async { outcome }
    }

    fn send_sms(&self, sms: SmsMessage) -> impl Future<Output = Delivery> + Send {
        self.sms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sms);
        let outcome = self.outcome.clone();
        async { outcome }
    }
}

/// [`Credentials`] with reversible, plaintext-tagged hashes and tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeCredentials;

impl Credentials for FakeCredentials {
    fn hash_password(&self, password: &str) -> Result<String, CareOpsError> {
        Ok(format!("plain:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, CareOpsError> {
        Ok(hash.strip_prefix("plain:") == Some(password))
    }

    fn issue_token(&self, user: &User) -> Result<AccessToken, CareOpsError> {
        Ok(AccessToken::bearer(format!("token:{}", user.id)))
    }

    fn decode_token(&self, token: &str) -> Result<UserId, CareOpsError> {
        token
            .strip_prefix("token:")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| AuthError::InvalidToken.into())
    }
}
