//! `SQLite` implementation of [`ConversationRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite, SqlitePool, Transaction};

use careops_app::ports::ConversationRepository;
use careops_domain::conversation::{Conversation, Message};
use careops_domain::error::CareOpsError;
use careops_domain::id::{ContactId, ConversationId, WorkspaceId};

use crate::codec::{count, opt_ts, parse, parse_opt_ts, parse_ts, ts};
use crate::error::StorageError;

struct Wrapper(Conversation);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let workspace_id: String = row.try_get("workspace_id")?;
        let contact_id: String = row.try_get("contact_id")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(Self(Conversation {
            id: parse(&id)?,
            workspace_id: parse(&workspace_id)?,
            contact_id: parse(&contact_id)?,
            is_open: row.try_get("is_open")?,
            created_at: parse_ts(&created_at)?,
            updated_at: parse_ts(&updated_at)?,
            last_staff_reply_at: parse_opt_ts(row.try_get("last_staff_reply_at")?)?,
        }))
    }
}

struct MessageRow(Message);

impl<'r> FromRow<'r, SqliteRow> for MessageRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let conversation_id: String = row.try_get("conversation_id")?;
        let sender_type: String = row.try_get("sender_type")?;
        let channel: String = row.try_get("channel")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(Message {
            id: parse(&id)?,
            conversation_id: parse(&conversation_id)?,
            sender_type: parse(&sender_type)?,
            sender_name: row.try_get("sender_name")?,
            content: row.try_get("content")?,
            channel: parse(&channel)?,
            created_at: parse_ts(&created_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO conversations (id, workspace_id, contact_id, is_open, created_at, updated_at,
                               last_staff_reply_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const INSERT_MESSAGE: &str = r"
    INSERT INTO messages (id, conversation_id, sender_type, sender_name, content, channel, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM conversations WHERE id = ?";
const SELECT_BY_CONTACT: &str =
    "SELECT * FROM conversations WHERE contact_id = ? ORDER BY created_at, rowid LIMIT 1";
const SELECT_BY_WORKSPACE: &str =
    "SELECT * FROM conversations WHERE workspace_id = ? ORDER BY updated_at DESC, rowid DESC";
const SELECT_RECENT: &str = r"
    SELECT * FROM conversations WHERE workspace_id = ?
    ORDER BY updated_at DESC, rowid DESC
    LIMIT ?
";
const COUNT_OPEN: &str =
    "SELECT COUNT(*) FROM conversations WHERE workspace_id = ? AND is_open = 1";
const SELECT_MESSAGES: &str =
    "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at, rowid";

const UPDATE: &str = r"
    UPDATE conversations
    SET is_open = ?, updated_at = ?, last_staff_reply_at = ?
    WHERE id = ?
";

const TOUCH: &str = "UPDATE conversations SET updated_at = MAX(updated_at, ?) WHERE id = ?";

pub(crate) async fn insert_conversation(
    tx: &mut Transaction<'_, Sqlite>,
    conversation: &Conversation,
) -> Result<(), StorageError> {
    sqlx::query(INSERT)
        .bind(conversation.id.to_string())
        .bind(conversation.workspace_id.to_string())
        .bind(conversation.contact_id.to_string())
        .bind(conversation.is_open)
        .bind(ts(conversation.created_at))
        .bind(ts(conversation.updated_at))
        .bind(opt_ts(conversation.last_staff_reply_at))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub(crate) async fn insert_message(
    tx: &mut Transaction<'_, Sqlite>,
    message: &Message,
) -> Result<(), StorageError> {
    sqlx::query(INSERT_MESSAGE)
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.sender_type.as_str())
        .bind(&message.sender_name)
        .bind(&message.content)
        .bind(message.channel.as_str())
        .bind(ts(message.created_at))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// `SQLite`-backed conversation repository.
pub struct SqliteConversationRepository {
    pool: SqlitePool,
}

impl SqliteConversationRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ConversationRepository for SqliteConversationRepository {
    async fn get_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, CareOpsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn find_by_contact(
        &self,
        contact: ContactId,
    ) -> Result<Option<Conversation>, CareOpsError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_CONTACT)
            .bind(contact.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn list_by_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<Conversation>, CareOpsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_WORKSPACE)
            .bind(workspace.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn recent_by_workspace(
        &self,
        workspace: WorkspaceId,
        limit: usize,
    ) -> Result<Vec<Conversation>, CareOpsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(workspace.to_string())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn count_open(&self, workspace: WorkspaceId) -> Result<u64, CareOpsError> {
        let (n,): (i64,) = sqlx::query_as(COUNT_OPEN)
            .bind(workspace.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(count(n))
    }

    async fn update(&self, conversation: Conversation) -> Result<Conversation, CareOpsError> {
        sqlx::query(UPDATE)
            .bind(conversation.is_open)
            .bind(ts(conversation.updated_at))
            .bind(opt_ts(conversation.last_staff_reply_at))
            .bind(conversation.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(conversation)
    }

    async fn append_message(&self, message: Message) -> Result<Message, CareOpsError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        insert_message(&mut tx, &message).await?;
        sqlx::query(TOUCH)
            .bind(ts(message.created_at))
            .bind(message.conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(message)
    }

    async fn messages(&self, conversation: ConversationId) -> Result<Vec<Message>, CareOpsError> {
        let rows: Vec<MessageRow> = sqlx::query_as(SELECT_MESSAGES)
            .bind(conversation.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|m| m.0).collect())
    }
}
