//! Core types: message kind, normalized message, sync context, and the run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse message classification used for storage and UI rendering.
/// Coarser than Facebook's own attachment taxonomy: video and audio
/// attachments fold into `File`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Text,
    Image,
    File,
}

impl MessageKind {
    /// Database/wire representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "TEXT",
            MessageKind::Image => "IMAGE",
            MessageKind::File => "FILE",
        }
    }

    /// Placeholder content used when classification yields an empty string.
    /// An empty content column is never persisted.
    pub fn placeholder(&self) -> &'static str {
        match self {
            MessageKind::Text => "[Message]",
            MessageKind::Image => "[Image]",
            MessageKind::File => "[File]",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message normalized from the remote platform, ready for persistence.
///
/// Owned by exactly one conversation. `content` may be a composite of caption
/// text plus a sentinel-delimited URL suffix (e.g. `"photo |IMAGE_URL|https://..."`);
/// that encoding is load-bearing for existing consumers of the column and must
/// not be changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub id: String,
    pub conversation_id: String,
    pub kind: MessageKind,
    pub content: String,
    pub is_from_customer: bool,
    /// Always false for synced history; staff have not read backfilled messages.
    pub is_read: bool,
    /// The platform's own message id; the dedup/idempotency key.
    pub remote_id: Option<String>,
    /// Serialized JSON bag: remote id, sync timestamp, original from/to
    /// identifiers, raw attachment payload. Kept for audit and debugging.
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NormalizedMessage {
    /// Creates a message with a generated UUID. Timestamps come from the
    /// remote record's creation time, not the sync time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        conversation_id: String,
        kind: MessageKind,
        content: String,
        is_from_customer: bool,
        remote_id: Option<String>,
        metadata: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id,
            kind,
            content,
            is_from_customer,
            is_read: false,
            remote_id,
            metadata,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Everything one sync run needs to talk to the remote platform.
/// Constructed once by the conversation resolver; immutable for the run.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub company_id: String,
    pub conversation_id: String,
    /// The customer's platform-scoped identifier (PSID).
    pub customer_psid: String,
    pub page_id: String,
    pub access_token: String,
}

/// Credential resolved for a connected Facebook page.
#[derive(Debug, Clone)]
pub struct PageCredential {
    pub access_token: String,
    pub page_name: String,
    pub company_id: String,
}

/// Summary of one sync run, returned to the caller.
///
/// `direction_fallbacks` counts records whose sender could not be matched to
/// either the customer or the page and fell back to the legacy
/// "not from customer" default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub total_fetched: usize,
    pub saved: usize,
    pub skipped: usize,
    pub errors: usize,
    pub direction_fallbacks: usize,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_to_column_values() {
        assert_eq!(MessageKind::Text.as_str(), "TEXT");
        assert_eq!(MessageKind::Image.as_str(), "IMAGE");
        assert_eq!(MessageKind::File.as_str(), "FILE");
    }

    #[test]
    fn normalized_message_defaults_unread_with_remote_timestamps() {
        let created = Utc::now() - chrono::Duration::days(3);
        let msg = NormalizedMessage::new(
            "conv-1".to_string(),
            MessageKind::Text,
            "hello".to_string(),
            true,
            Some("m_abc".to_string()),
            None,
            created,
        );

        assert!(!msg.is_read);
        assert_eq!(msg.created_at, created);
        assert_eq!(msg.updated_at, created);
        assert!(!msg.id.is_empty());
    }
}
