//! Message record model for persistence.
//!
//! Maps to the `messages` table and is used by MessageRepository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    /// Coarse type column: "TEXT", "IMAGE", or "FILE".
    pub kind: String,
    pub content: String,
    pub is_from_customer: bool,
    pub is_read: bool,
    /// The messaging platform's own message id. Nullable: live messages
    /// written by the app have none. Unique per conversation when present.
    pub remote_id: Option<String>,
    /// Serialized JSON metadata bag.
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageRecord {
    /// Creates a record with a generated UUID and current timestamps.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        conversation_id: String,
        kind: String,
        content: String,
        is_from_customer: bool,
        remote_id: Option<String>,
        metadata: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id,
            kind,
            content,
            is_from_customer,
            is_read: false,
            remote_id,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
}
