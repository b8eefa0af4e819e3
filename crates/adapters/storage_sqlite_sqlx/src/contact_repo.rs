//! `SQLite` implementation of [`ContactRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use careops_app::ports::ContactRepository;
use careops_domain::contact::Contact;
use careops_domain::conversation::{Conversation, Message};
use careops_domain::error::CareOpsError;
use careops_domain::id::{ContactId, WorkspaceId};

use crate::codec::{opt_ts, parse, parse_opt_ts, parse_ts, ts};
use crate::conversation_repo::{insert_conversation, insert_message};
use crate::error::StorageError;

struct Wrapper(Contact);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let workspace_id: String = row.try_get("workspace_id")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(Contact {
            id: parse(&id)?,
            workspace_id: parse(&workspace_id)?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            created_at: parse_ts(&created_at)?,
            last_contacted: parse_opt_ts(row.try_get("last_contacted")?)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO contacts (id, workspace_id, name, email, phone, created_at, last_contacted)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM contacts WHERE id = ?";
const SELECT_BY_WORKSPACE: &str =
    "SELECT * FROM contacts WHERE workspace_id = ? ORDER BY created_at, rowid";

/// `SQLite`-backed contact repository.
pub struct SqliteContactRepository {
    pool: SqlitePool,
}

impl SqliteContactRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ContactRepository for SqliteContactRepository {
    async fn create_with_conversation(
        &self,
        contact: Contact,
        conversation: Conversation,
        welcome: Message,
    ) -> Result<Contact, CareOpsError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(contact.id.to_string())
            .bind(contact.workspace_id.to_string())
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.phone)
            .bind(ts(contact.created_at))
            .bind(opt_ts(contact.last_contacted))
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        insert_conversation(&mut tx, &conversation).await?;
        insert_message(&mut tx, &welcome).await?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(contact)
    }

    async fn get_by_id(&self, id: ContactId) -> Result<Option<Contact>, CareOpsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn list_by_workspace(&self, workspace: WorkspaceId) -> Result<Vec<Contact>, CareOpsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_WORKSPACE)
            .bind(workspace.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use careops_app::ports::{ConversationRepository, Store};

    #[tokio::test]
    async fn should_store_contact_with_conversation_and_welcome() {
        let store = test_support::store().await;
        let workspace = test_support::workspace(&store).await;
        let contact = Contact::builder()
            .workspace_id(workspace.id)
            .name("Grace")
            .email(Some("grace@example.com".to_string()))
            .build()
            .unwrap();
        let conversation = Conversation::open(workspace.id, contact.id);
        let welcome = Message::welcome(conversation.id, "Grace");

        store
            .contacts()
            .create_with_conversation(contact.clone(), conversation.clone(), welcome.clone())
            .await
            .unwrap();

        let listed = store.contacts().list_by_workspace(workspace.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].email.as_deref(), Some("grace@example.com"));
        let found = store
            .conversations()
            .find_by_contact(contact.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, conversation);
        let messages = store.conversations().messages(conversation.id).await.unwrap();
        assert_eq!(messages, vec![welcome]);
    }

    #[tokio::test]
    async fn should_roll_back_contact_when_conversation_insert_fails() {
        let store = test_support::store().await;
        let workspace = test_support::workspace(&store).await;
        let contact = Contact::builder()
            .workspace_id(workspace.id)
            .name("Grace")
            .build()
            .unwrap();
        // Points at a contact that does not exist, so the foreign key fails.
        let conversation = Conversation::open(workspace.id, ContactId::new());
        let welcome = Message::welcome(conversation.id, "Grace");

        let result = store
            .contacts()
            .create_with_conversation(contact.clone(), conversation, welcome)
            .await;

        assert!(matches!(result, Err(CareOpsError::Storage(_))));
        assert!(store.contacts().get_by_id(contact.id).await.unwrap().is_none());
    }
}
