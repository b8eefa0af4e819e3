//! # careops-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `careops-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Run the multi-row writes (contact with conversation, booking with its
//!   inventory and form effects) inside one transaction
//!
//! ## Dependency rule
//! Depends on `careops-app` (for port traits) and `careops-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod codec;
pub mod error;
pub mod pool;

mod booking_repo;
mod contact_repo;
mod conversation_repo;
mod form_repo;
mod inventory_repo;
mod staff_repo;
mod store;
mod user_repo;
mod workspace_repo;

pub use booking_repo::SqliteBookingRepository;
pub use contact_repo::SqliteContactRepository;
pub use conversation_repo::SqliteConversationRepository;
pub use error::StorageError;
pub use form_repo::SqliteFormRepository;
pub use inventory_repo::SqliteInventoryRepository;
pub use pool::{Config, Database};
pub use staff_repo::SqliteStaffRepository;
pub use store::SqliteStore;
pub use user_repo::SqliteUserRepository;
pub use workspace_repo::SqliteWorkspaceRepository;

#[cfg(test)]
mod test_support {
    use careops_app::ports::{Store, UserRepository, WorkspaceRepository};
    use careops_domain::user::User;
    use careops_domain::workspace::Workspace;

    use crate::pool::Config;
    use crate::store::SqliteStore;

    /// A store over a fresh in-memory database.
    pub async fn store() -> SqliteStore {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteStore::new(db.pool().clone())
    }

    /// Insert an owner and one of their workspaces.
    pub async fn workspace(store: &SqliteStore) -> Workspace {
        let owner = User::builder()
            .email(format!("{}@clinic.test", careops_domain::id::UserId::new()))
            .full_name("Olive Owner")
            .password_hash("hash")
            .build()
            .unwrap();
        store.users().create(owner.clone()).await.unwrap();
        let workspace = Workspace::builder()
            .owner_id(owner.id)
            .name("Clinic")
            .build()
            .unwrap();
        store.workspaces().create(workspace).await.unwrap()
    }
}
