//! [`Store`] bundle over one connection pool.

use sqlx::SqlitePool;

use careops_app::ports::Store;

use crate::{
    SqliteBookingRepository, SqliteContactRepository, SqliteConversationRepository,
    SqliteFormRepository, SqliteInventoryRepository, SqliteStaffRepository, SqliteUserRepository,
    SqliteWorkspaceRepository,
};

/// Every `SQLite` repository, sharing one pool.
pub struct SqliteStore {
    users: SqliteUserRepository,
    workspaces: SqliteWorkspaceRepository,
    staff: SqliteStaffRepository,
    contacts: SqliteContactRepository,
    conversations: SqliteConversationRepository,
    bookings: SqliteBookingRepository,
    forms: SqliteFormRepository,
    inventory: SqliteInventoryRepository,
}

impl SqliteStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: SqliteUserRepository::new(pool.clone()),
            workspaces: SqliteWorkspaceRepository::new(pool.clone()),
            staff: SqliteStaffRepository::new(pool.clone()),
            contacts: SqliteContactRepository::new(pool.clone()),
            conversations: SqliteConversationRepository::new(pool.clone()),
            bookings: SqliteBookingRepository::new(pool.clone()),
            forms: SqliteFormRepository::new(pool.clone()),
            inventory: SqliteInventoryRepository::new(pool),
        }
    }
}

impl Store for SqliteStore {
    type Users = SqliteUserRepository;
    type Workspaces = SqliteWorkspaceRepository;
    type Staff = SqliteStaffRepository;
    type Contacts = SqliteContactRepository;
    type Conversations = SqliteConversationRepository;
    type Bookings = SqliteBookingRepository;
    type Forms = SqliteFormRepository;
    type Inventory = SqliteInventoryRepository;

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
