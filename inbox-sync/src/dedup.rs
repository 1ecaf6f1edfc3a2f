//! Deduplication against already-stored messages.
//!
//! One set-membership pass over the batch: O(existing + incoming), never a
//! per-record query. The storage layer's unique index remains the backstop
//! for races between concurrent syncs.

use std::collections::HashSet;

use inbox_core::NormalizedMessage;

/// Splits the batch into (not yet stored, skipped-as-duplicate count).
/// A message is a duplicate iff its remote id is in `existing`; messages
/// without a remote id are never considered duplicates.
pub fn split_new(
    batch: Vec<NormalizedMessage>,
    existing: &HashSet<String>,
) -> (Vec<NormalizedMessage>, usize) {
    let before = batch.len();
    let fresh: Vec<NormalizedMessage> = batch
        .into_iter()
        .filter(|message| {
            message
                .remote_id
                .as_ref()
                .map(|id| !existing.contains(id))
                .unwrap_or(true)
        })
        .collect();
    let skipped = before - fresh.len();
    (fresh, skipped)
}
