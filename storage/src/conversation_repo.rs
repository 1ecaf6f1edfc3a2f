//! Conversation repository: lookups scoped by company and channel, plus the
//! `touch` used after a successful message sync.

use crate::error::StorageError;
use crate::models::ConversationRecord;
use crate::sqlite_pool::SqlitePoolManager;
use chrono::Utc;
use tracing::info;

#[derive(Clone)]
pub struct ConversationRepository {
    pool_manager: SqlitePoolManager,
}

impl ConversationRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                channel TEXT NOT NULL,
                customer_psid TEXT,
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
            CREATE INDEX IF NOT EXISTS idx_conversations_company_id ON conversations(company_id);
            CREATE INDEX IF NOT EXISTS idx_conversations_channel ON conversations(channel);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn save(&self, conversation: &ConversationRecord) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT INTO conversations (id, company_id, channel, customer_psid, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&conversation.id)
        .bind(&conversation.company_id)
        .bind(&conversation.channel)
        .bind(&conversation.customer_psid)
        .bind(&conversation.metadata)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(pool)
        .await?;

        info!("Saved conversation: id={}", conversation.id);
        Ok(())
    }

    /// Company-scoped lookup used by the sync resolver: the conversation must
    /// belong to the company and live on the given channel.
    pub async fn find_for_company(
        &self,
        conversation_id: &str,
        company_id: &str,
        channel: &str,
    ) -> Result<Option<ConversationRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query_as::<_, ConversationRecord>(
            "SELECT * FROM conversations WHERE id = ? AND company_id = ? AND channel = ?",
        )
        .bind(conversation_id)
        .bind(company_id)
        .bind(channel)
        .fetch_optional(pool)
        .await
        .map_err(StorageError::from)
    }

    pub async fn find_by_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query_as::<_, ConversationRecord>("SELECT * FROM conversations WHERE id = ?")
            .bind(conversation_id)
            .fetch_optional(pool)
            .await
            .map_err(StorageError::from)
    }

    /// Bumps `updated_at` to now. Called once per sync run after any inserts,
    /// never per message.
    pub async fn touch(&self, conversation_id: &str) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(conversation_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Deletes the conversation; its messages cascade.
    pub async fn delete(&self, conversation_id: &str) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(conversation_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
