//! Conversation row model.
//!
//! Maps to the `conversations` table. One row per customer thread on one
//! channel; messages reference it and cascade on delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationRecord {
    pub id: String,
    pub company_id: String,
    /// Messaging channel this thread lives on: "facebook" or "telegram".
    pub channel: String,
    /// The customer's platform-scoped identifier (PSID for Facebook).
    pub customer_psid: Option<String>,
    /// Optional JSON bag; may carry a `pageId` key pinning the thread to a
    /// specific connected page.
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationRecord {
    /// Creates a conversation with a generated UUID and current timestamps.
    pub fn new(
        company_id: String,
        channel: String,
        customer_psid: Option<String>,
        metadata: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            company_id,
            channel,
            customer_psid,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reads the `pageId` key out of the metadata JSON, if present.
    pub fn page_id(&self) -> Option<String> {
        let raw = self.metadata.as_deref()?;
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        value
            .get("pageId")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}
