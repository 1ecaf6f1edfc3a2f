//! Conversions between core types and storage rows.

use inbox_core::NormalizedMessage;
use storage::MessageRecord;

/// Maps a normalized message onto its storage row. Local id and timestamps
/// are carried over, not regenerated.
pub(crate) fn to_record(message: &NormalizedMessage) -> MessageRecord {
    MessageRecord {
        id: message.id.clone(),
        conversation_id: message.conversation_id.clone(),
        kind: message.kind.as_str().to_string(),
        content: message.content.clone(),
        is_from_customer: message.is_from_customer,
        is_read: message.is_read,
        remote_id: message.remote_id.clone(),
        metadata: message.metadata.clone(),
        created_at: message.created_at,
        updated_at: message.updated_at,
    }
}
