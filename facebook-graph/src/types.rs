//! Wire types for Graph API message listing.
//!
//! The attachment payload is effectively untyped JSON whose fields vary by
//! message kind, so [`RawAttachment`] makes every field optional and keeps
//! unknown keys in `extra` — the classifier decides what the attachment is,
//! and the raw shape is preserved for the stored metadata bag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Graph wraps the `to` field as `{"data": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantList {
    #[serde(default)]
    pub data: Vec<Participant>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentList {
    #[serde(default)]
    pub data: Vec<AttachmentSlot>,
}

/// One slot of the attachment list: parsed when the payload matches the
/// modeled shape, otherwise the JSON as received. Facebook has been observed
/// delivering wrong-typed fields; one bad slot must not fail the page parse,
/// it degrades to a placeholder downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttachmentSlot {
    Parsed(RawAttachment),
    Malformed(serde_json::Value),
}

impl AttachmentSlot {
    pub fn as_parsed(&self) -> Option<&RawAttachment> {
        match self {
            AttachmentSlot::Parsed(attachment) => Some(attachment),
            AttachmentSlot::Malformed(_) => None,
        }
    }

    pub fn into_parsed(self) -> Option<RawAttachment> {
        match self {
            AttachmentSlot::Parsed(attachment) => Some(attachment),
            AttachmentSlot::Malformed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateButton {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<TemplateButton>>,
}

/// One attachment as delivered on the wire. All fields optional; Facebook is
/// known to omit the declared type or mis-tag images.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAttachment {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_data: Option<VideoData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TemplatePayload>,
    /// Keys this client does not model; kept so the stored metadata bag can
    /// reproduce the payload as received.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One message record as returned by `GET /{conversation-id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ParticipantList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<AttachmentList>,
    /// Record-level sticker URL; stickers are not nested under `attachments`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<String>,
    /// Record-level shares payload; only its presence matters to the classifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<serde_json::Value>,
}

impl RemoteMessage {
    /// First attachment slot of the record, if any. Graph delivers at most
    /// one per message in practice.
    pub fn first_attachment(&self) -> Option<&AttachmentSlot> {
        self.attachments.as_ref().and_then(|list| list.data.first())
    }

    pub fn from_id(&self) -> Option<&str> {
        self.from.as_ref().map(|p| p.id.as_str())
    }

    pub fn to_ids(&self) -> Vec<String> {
        self.to
            .as_ref()
            .map(|list| list.data.iter().map(|p| p.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Parses `created_time`, accepting both RFC3339 and Graph's compact
    /// offset format (`2024-01-05T09:30:00+0000`). Falls back to now.
    pub fn created_at(&self) -> DateTime<Utc> {
        let Some(raw) = self.created_time.as_deref() else {
            return Utc::now();
        };
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagingCursors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursors: Option<PagingCursors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// One page of the message-list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePage {
    #[serde(default)]
    pub data: Vec<RemoteMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
}

impl MessagePage {
    /// Cursor for the next page, present only when Facebook reports one.
    /// The `after` cursor is used rather than the absolute `next` URL so the
    /// client never leaves its configured base URL.
    pub fn next_cursor(&self) -> Option<&str> {
        let paging = self.paging.as_ref()?;
        if paging.next.is_none() {
            return None;
        }
        paging.cursors.as_ref()?.after.as_deref()
    }
}
