//! Channel repository: connected Facebook pages and their access tokens.

use crate::error::StorageError;
use crate::models::ChannelRecord;
use crate::sqlite_pool::SqlitePoolManager;
use tracing::info;

#[derive(Clone)]
pub struct ChannelRepository {
    pool_manager: SqlitePoolManager,
}

impl ChannelRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS channels (
                page_id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                page_name TEXT NOT NULL,
                access_token TEXT NOT NULL,
                status TEXT NOT NULL,
                connected_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_channels_company_id ON channels(company_id)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Upserts the channel; reconnecting a page refreshes its token and
    /// connected_at.
    pub async fn save(&self, channel: &ChannelRecord) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT INTO channels (page_id, company_id, page_name, access_token, status, connected_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(page_id) DO UPDATE SET
                company_id = excluded.company_id,
                page_name = excluded.page_name,
                access_token = excluded.access_token,
                status = excluded.status,
                connected_at = excluded.connected_at
            "#,
        )
        .bind(&channel.page_id)
        .bind(&channel.company_id)
        .bind(&channel.page_name)
        .bind(&channel.access_token)
        .bind(&channel.status)
        .bind(channel.connected_at)
        .execute(pool)
        .await?;

        info!(
            "Saved channel: page_id={}, company_id={}",
            channel.page_id, channel.company_id
        );
        Ok(())
    }

    pub async fn find_by_page_id(
        &self,
        page_id: &str,
    ) -> Result<Option<ChannelRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query_as::<_, ChannelRecord>("SELECT * FROM channels WHERE page_id = ?")
            .bind(page_id)
            .fetch_optional(pool)
            .await
            .map_err(StorageError::from)
    }

    /// The company's most recently connected page that is still connected.
    /// Resolver fallback when a conversation carries no pageId of its own.
    pub async fn latest_connected_for_company(
        &self,
        company_id: &str,
    ) -> Result<Option<ChannelRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query_as::<_, ChannelRecord>(
            r#"
            SELECT * FROM channels
            WHERE company_id = ? AND status = 'connected'
            ORDER BY connected_at DESC
            LIMIT 1
            "#,
        )
        .bind(company_id)
        .fetch_optional(pool)
        .await
        .map_err(StorageError::from)
    }
}
