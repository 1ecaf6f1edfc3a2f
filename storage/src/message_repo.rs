//! Message repository: persistence and queries for normalized messages.
//!
//! The bulk insert is the sync pipeline's primary write path: one statement
//! for the whole batch, with ON CONFLICT DO NOTHING so a concurrent sync of
//! the same conversation cannot double-insert a remote message. `insert` is
//! the row-by-row fallback when the bulk call itself fails.

use std::collections::HashSet;

use crate::error::StorageError;
use crate::models::MessageRecord;
use crate::sqlite_pool::SqlitePoolManager;
use sqlx::QueryBuilder;
use tracing::info;

#[derive(Clone)]
pub struct MessageRepository {
    pool_manager: SqlitePoolManager,
}

impl MessageRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating messages table if not exists");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                content TEXT NOT NULL,
                is_from_customer INTEGER NOT NULL,
                is_read INTEGER NOT NULL,
                remote_id TEXT,
                metadata TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_conversation_id ON messages(conversation_id);
            CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_messages_conversation_remote
                ON messages(conversation_id, remote_id) WHERE remote_id IS NOT NULL;
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Inserts one record, silently skipping it if the (conversation,
    /// remote_id) pair already exists. Returns whether a row was written.
    pub async fn insert(&self, message: &MessageRecord) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, kind, content, is_from_customer, is_read, remote_id, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(&message.kind)
        .bind(&message.content)
        .bind(message.is_from_customer)
        .bind(message.is_read)
        .bind(&message.remote_id)
        .bind(&message.metadata)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Inserts the whole batch in one statement, skipping duplicate rows.
    /// Returns the number of rows actually written.
    pub async fn bulk_insert(&self, messages: &[MessageRecord]) -> Result<u64, StorageError> {
        if messages.is_empty() {
            return Ok(0);
        }

        let pool = self.pool_manager.pool();

        let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
            "INSERT INTO messages (id, conversation_id, kind, content, is_from_customer, is_read, remote_id, metadata, created_at, updated_at) ",
        );
        builder.push_values(messages, |mut b, message| {
            b.push_bind(&message.id)
                .push_bind(&message.conversation_id)
                .push_bind(&message.kind)
                .push_bind(&message.content)
                .push_bind(message.is_from_customer)
                .push_bind(message.is_read)
                .push_bind(&message.remote_id)
                .push_bind(&message.metadata)
                .push_bind(message.created_at)
                .push_bind(message.updated_at);
        });
        builder.push(" ON CONFLICT DO NOTHING");

        let result = builder.build().execute(pool).await?;

        info!(
            "Bulk inserted {} of {} messages",
            result.rows_affected(),
            messages.len()
        );
        Ok(result.rows_affected())
    }

    /// Remote ids already stored for the conversation. One query per sync
    /// run; the deduplicator works off this set.
    pub async fn remote_ids_for_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<HashSet<String>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT remote_id FROM messages WHERE conversation_id = ? AND remote_id IS NOT NULL",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn get_message_by_id(
        &self,
        message_id: &str,
    ) -> Result<Option<MessageRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query_as::<_, MessageRecord>("SELECT * FROM messages WHERE id = ?")
            .bind(message_id)
            .fetch_optional(pool)
            .await
            .map_err(StorageError::from)
    }

    /// Messages of one conversation, oldest first.
    pub async fn get_messages_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let messages: Vec<MessageRecord> = sqlx::query_as::<_, MessageRecord>(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    pub async fn count_for_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<i64, StorageError> {
        let pool = self.pool_manager.pool();

        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(pool)
                .await?;

        Ok(count.0)
    }
}
