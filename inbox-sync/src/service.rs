//! Sync service: wires the pipeline stages together.
//!
//! One invocation is one logical task. Two staff members syncing the same
//! conversation at once is expected; the storage unique index, not a lock,
//! keeps that safe.

use std::sync::Arc;

use chrono::Utc;
use facebook_graph::GraphApi;
use inbox_core::{NormalizedMessage, Result, SyncError, SyncReport};
use serde_json::json;
use storage::{ChannelRepository, ConversationRepository, MessageRepository};
use tracing::{info, warn};

use crate::classifier::AttachmentClassifier;
use crate::credentials::{ChannelCredentialResolver, CredentialResolver};
use crate::dedup::split_new;
use crate::direction::resolve_direction;
use crate::fetcher::MessageFetcher;
use crate::persister::BulkPersister;
use crate::resolver::ConversationResolver;

pub struct SyncService {
    resolver: ConversationResolver,
    fetcher: MessageFetcher,
    classifier: AttachmentClassifier,
    messages: MessageRepository,
    persister: BulkPersister,
}

impl SyncService {
    /// Builds the service with the channel-table credential resolver.
    pub fn new(
        conversations: ConversationRepository,
        channels: ChannelRepository,
        messages: MessageRepository,
        api: Arc<dyn GraphApi>,
    ) -> Self {
        let credentials: Arc<dyn CredentialResolver> =
            Arc::new(ChannelCredentialResolver::new(channels.clone()));
        Self::with_credential_resolver(conversations, channels, messages, api, credentials)
    }

    /// Same as [`SyncService::new`] with a caller-supplied credential source.
    pub fn with_credential_resolver(
        conversations: ConversationRepository,
        channels: ChannelRepository,
        messages: MessageRepository,
        api: Arc<dyn GraphApi>,
        credentials: Arc<dyn CredentialResolver>,
    ) -> Self {
        Self {
            resolver: ConversationResolver::new(conversations.clone(), channels, credentials),
            fetcher: MessageFetcher::new(api.clone()),
            classifier: AttachmentClassifier::new(api),
            messages: messages.clone(),
            persister: BulkPersister::new(messages, conversations),
        }
    }

    /// Runs one sync for a conversation and reports what happened.
    ///
    /// Resolution- and fetch-stage failures return `Err`; classification and
    /// per-row persistence failures degrade into the report's error count.
    /// A run where every record was already stored is a success with
    /// `saved = 0`.
    pub async fn sync_conversation(
        &self,
        company_id: &str,
        conversation_id: &str,
    ) -> Result<SyncReport> {
        let ctx = self.resolver.resolve(company_id, conversation_id).await?;
        let records = self.fetcher.fetch(&ctx).await?;

        let total_fetched = records.len();
        let synced_at = Utc::now();
        let mut direction_fallbacks = 0;
        let mut errors = 0;

        let mut normalized: Vec<NormalizedMessage> = Vec::with_capacity(records.len());
        for record in &records {
            let classified = self.classifier.classify(record, &ctx.access_token).await;
            if classified.malformed_attachment {
                warn!(
                    message_id = %record.id,
                    "Attachment payload did not parse; storing placeholder content"
                );
                errors += 1;
            }

            let recipients = record.to_ids();
            let decision = resolve_direction(
                record.from_id(),
                &recipients,
                &ctx.customer_psid,
                &ctx.page_id,
            );
            if decision.ambiguous {
                warn!(
                    message_id = %record.id,
                    from = ?record.from_id(),
                    "Sender matches neither customer nor page; attributing to business"
                );
                direction_fallbacks += 1;
            }

            let metadata = json!({
                "fbMessageId": record.id,
                "syncedAt": synced_at.to_rfc3339(),
                "from": record.from_id(),
                "to": recipients,
                "attachment": record.first_attachment(),
            })
            .to_string();

            normalized.push(NormalizedMessage::new(
                ctx.conversation_id.clone(),
                classified.kind,
                classified.content,
                decision.from_customer,
                Some(record.id.clone()),
                Some(metadata),
                record.created_at(),
            ));
        }

        let existing = self
            .messages
            .remote_ids_for_conversation(&ctx.conversation_id)
            .await
            .map_err(SyncError::storage)?;
        let (fresh, skipped) = split_new(normalized, &existing);

        let outcome = self.persister.persist(&ctx.conversation_id, &fresh).await?;
        errors += outcome.errors;

        let report = SyncReport {
            total_fetched,
            saved: outcome.saved,
            skipped,
            errors,
            direction_fallbacks,
            message: format!(
                "Synced {} messages ({} skipped as duplicates)",
                outcome.saved, skipped
            ),
        };

        info!(
            conversation_id,
            total_fetched = report.total_fetched,
            saved = report.saved,
            skipped = report.skipped,
            errors = report.errors,
            "Sync run finished"
        );
        Ok(report)
    }
}
