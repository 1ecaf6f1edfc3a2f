//! Channel row model: one connected Facebook page and its access credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChannelRecord {
    /// The Facebook page id; primary key.
    pub page_id: String,
    pub company_id: String,
    pub page_name: String,
    pub access_token: String,
    /// "connected" or "disconnected".
    pub status: String,
    pub connected_at: DateTime<Utc>,
}

impl ChannelRecord {
    /// Creates a connected channel record stamped now.
    pub fn new(
        page_id: String,
        company_id: String,
        page_name: String,
        access_token: String,
    ) -> Self {
        Self {
            page_id,
            company_id,
            page_name,
            access_token,
            status: "connected".to_string(),
            connected_at: Utc::now(),
        }
    }
}
