//! Credential lookup for connected Facebook pages.
//!
//! The trait keeps the pipeline testable without a channels table; production
//! uses [`ChannelCredentialResolver`] backed by storage.

use async_trait::async_trait;
use inbox_core::{PageCredential, Result, SyncError};
use storage::ChannelRepository;

#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Returns the access credential for a page, or None when the page is not
    /// connected.
    async fn resolve(&self, page_id: &str) -> Result<Option<PageCredential>>;
}

/// Resolves credentials from the `channels` table. Disconnected pages resolve
/// to None even when a stale token is still stored.
pub struct ChannelCredentialResolver {
    channels: ChannelRepository,
}

impl ChannelCredentialResolver {
    pub fn new(channels: ChannelRepository) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl CredentialResolver for ChannelCredentialResolver {
    async fn resolve(&self, page_id: &str) -> Result<Option<PageCredential>> {
        let channel = self
            .channels
            .find_by_page_id(page_id)
            .await
            .map_err(SyncError::storage)?;

        Ok(channel
            .filter(|c| c.status == "connected")
            .map(|c| PageCredential {
                access_token: c.access_token,
                page_name: c.page_name,
                company_id: c.company_id,
            }))
    }
}
