//! Conversation resolver: turns (company, conversation) into a [`SyncContext`].
//!
//! Read-only. Page id comes from the conversation's own metadata when pinned
//! there, otherwise from the company's most recently connected channel.

use std::sync::Arc;

use inbox_core::{Result, SyncContext, SyncError};
use storage::{ChannelRepository, ConversationRepository};
use tracing::debug;

use crate::credentials::CredentialResolver;

pub struct ConversationResolver {
    conversations: ConversationRepository,
    channels: ChannelRepository,
    credentials: Arc<dyn CredentialResolver>,
}

impl ConversationResolver {
    pub fn new(
        conversations: ConversationRepository,
        channels: ChannelRepository,
        credentials: Arc<dyn CredentialResolver>,
    ) -> Self {
        Self {
            conversations,
            channels,
            credentials,
        }
    }

    pub async fn resolve(&self, company_id: &str, conversation_id: &str) -> Result<SyncContext> {
        let conversation = self
            .conversations
            .find_for_company(conversation_id, company_id, "facebook")
            .await
            .map_err(SyncError::storage)?
            .ok_or_else(|| SyncError::ConversationNotFound(conversation_id.to_string()))?;

        let customer_psid = conversation
            .customer_psid
            .clone()
            .filter(|psid| !psid.is_empty())
            .ok_or(SyncError::MissingCustomerIdentity)?;

        let page_id = match conversation.page_id() {
            Some(page_id) => page_id,
            None => self
                .channels
                .latest_connected_for_company(company_id)
                .await
                .map_err(SyncError::storage)?
                .map(|channel| channel.page_id)
                .ok_or(SyncError::NoChannelConfigured)?,
        };

        let credential = self
            .credentials
            .resolve(&page_id)
            .await?
            .ok_or_else(|| SyncError::CredentialUnavailable(page_id.clone()))?;

        debug!(
            conversation_id,
            company_id, page_id, "Resolved sync context"
        );

        Ok(SyncContext {
            company_id: company_id.to_string(),
            conversation_id: conversation_id.to_string(),
            customer_psid,
            page_id,
            access_token: credential.access_token,
        })
    }
}
