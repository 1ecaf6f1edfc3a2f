//! Bulk persister: bulk-first insert with a row-by-row fallback.
//!
//! The two paths are one strategy object so each is testable on its own.
//! The bulk statement skips duplicate rows itself; the fallback only runs
//! when the bulk call fails outright (e.g. connectivity), and a single row's
//! failure there never aborts its siblings.

use inbox_core::{NormalizedMessage, Result};
use storage::{ConversationRepository, MessageRepository};
use tracing::{info, warn};

use crate::adapters::to_record;

/// What persistence did with a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistOutcome {
    pub saved: usize,
    /// Rows that failed individually on the fallback path.
    pub errors: usize,
}

pub struct BulkPersister {
    messages: MessageRepository,
    conversations: ConversationRepository,
}

impl BulkPersister {
    pub fn new(messages: MessageRepository, conversations: ConversationRepository) -> Self {
        Self {
            messages,
            conversations,
        }
    }

    pub async fn persist(
        &self,
        conversation_id: &str,
        batch: &[NormalizedMessage],
    ) -> Result<PersistOutcome> {
        if batch.is_empty() {
            return Ok(PersistOutcome::default());
        }

        let records: Vec<storage::MessageRecord> = batch.iter().map(to_record).collect();

        let outcome = match self.messages.bulk_insert(&records).await {
            Ok(written) => PersistOutcome {
                saved: written as usize,
                errors: 0,
            },
            Err(err) => {
                warn!(
                    conversation_id,
                    error = %err,
                    "Bulk insert failed; retrying row by row"
                );
                self.insert_each(&records).await
            }
        };

        if outcome.saved > 0 {
            // One touch per run, not per message. The messages are already
            // saved at this point, so a failed touch only logs.
            if let Err(err) = self.conversations.touch(conversation_id).await {
                warn!(conversation_id, error = %err, "Failed to touch conversation");
            }
        }

        info!(
            conversation_id,
            saved = outcome.saved,
            errors = outcome.errors,
            "Persisted message batch"
        );
        Ok(outcome)
    }

    /// Fallback path: every record on its own, counting failures.
    async fn insert_each(&self, records: &[storage::MessageRecord]) -> PersistOutcome {
        let mut saved = 0;
        let mut errors = 0;

        for record in records {
            match self.messages.insert(record).await {
                Ok(true) => saved += 1,
                // Duplicate skipped by the unique index; already counted by
                // the deduplicator on the normal path.
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        message_id = %record.id,
                        error = %err,
                        "Failed to insert message"
                    );
                    errors += 1;
                }
            }
        }

        PersistOutcome { saved, errors }
    }
}
