//! Attachment classifier: one remote record → (coarse kind, content string).
//!
//! Facebook's attachment payload is inconsistent across message kinds, so
//! classification is layered: declared type, then MIME prefix, then nested
//! image data, then template payload, defaulting to file. Media content keeps
//! the legacy sentinel encoding (`"<caption> |IMAGE_URL|<url>"`) — existing
//! consumers of the content column parse it.
//!
//! This is the only pipeline stage with a network side effect: when an image
//! carries no usable URL, up to two short detail fetches try to recover one.
//! Those fetches fail silently; a record is never dropped over a missing URL.

use std::sync::Arc;

use facebook_graph::{GraphApi, RawAttachment, RemoteMessage};
use inbox_core::MessageKind;
use tracing::debug;

/// Fixed text stored for share records that carry no message text.
pub const SHARE_PLACEHOLDER: &str = "[Shared content]";

/// Attachment variant after classification. Finer than [`MessageKind`]:
/// video and audio keep their identity here so the sentinel can name them,
/// then fold into `File` for storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentVariant {
    Image,
    AnimatedImage,
    Video,
    Audio,
    File,
    Template,
}

impl AttachmentVariant {
    /// Sentinel label used in composite content (`|IMAGE_URL|`, `|VIDEO_URL|`, ...).
    fn sentinel(&self) -> &'static str {
        match self {
            AttachmentVariant::Image | AttachmentVariant::AnimatedImage => "IMAGE",
            AttachmentVariant::Video => "VIDEO",
            AttachmentVariant::Audio => "AUDIO",
            AttachmentVariant::File | AttachmentVariant::Template => "FILE",
        }
    }
}

/// Classification result: the coarse kind and the content string to persist.
#[derive(Debug, Clone)]
pub struct Classified {
    pub kind: MessageKind,
    pub content: String,
    /// True when the record carried an attachment payload that did not match
    /// any known shape. The record still persists with placeholder content;
    /// the run counts it as an error.
    pub malformed_attachment: bool,
}

/// Determines the attachment variant.
///
/// Declared type wins when it is one we know; otherwise MIME prefix, then
/// nested image data, then a template payload, defaulting to file. Facebook
/// is known to mis-tag image attachments, so a nested image-data URL forces
/// Image for everything but templates.
pub fn resolve_variant(attachment: &RawAttachment) -> AttachmentVariant {
    let declared = attachment.kind.as_deref().map(str::to_ascii_lowercase);
    let mut variant = match declared.as_deref() {
        Some("image") => AttachmentVariant::Image,
        Some("animated_image") => AttachmentVariant::AnimatedImage,
        Some("video") => AttachmentVariant::Video,
        Some("audio") => AttachmentVariant::Audio,
        Some("file") => AttachmentVariant::File,
        Some("template") => AttachmentVariant::Template,
        _ => {
            if let Some(mime) = attachment.mime_type.as_deref() {
                if mime.starts_with("image/") {
                    AttachmentVariant::Image
                } else if mime.starts_with("video/") {
                    AttachmentVariant::Video
                } else if mime.starts_with("audio/") {
                    AttachmentVariant::Audio
                } else {
                    AttachmentVariant::File
                }
            } else if attachment.image_data.is_some() {
                AttachmentVariant::Image
            } else if attachment.payload.is_some() {
                AttachmentVariant::Template
            } else {
                AttachmentVariant::File
            }
        }
    };

    let has_image_url = attachment
        .image_data
        .as_ref()
        .and_then(|d| d.url.as_deref())
        .is_some();
    if has_image_url && variant != AttachmentVariant::Template {
        variant = AttachmentVariant::Image;
    }

    variant
}

/// First non-empty image URL, checked in fixed priority order:
/// image_data.url, file_url, url, payload.url, image.url.
pub fn pick_image_url(attachment: &RawAttachment) -> Option<String> {
    let candidates = [
        attachment.image_data.as_ref().and_then(|d| d.url.as_deref()),
        attachment.file_url.as_deref(),
        attachment.url.as_deref(),
        attachment.payload.as_ref().and_then(|p| p.url.as_deref()),
        attachment.image.as_ref().and_then(|d| d.url.as_deref()),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|url| !url.is_empty())
        .map(|url| url.to_string())
}

/// Best-available URL for file, video, and audio attachments.
pub fn pick_file_url(attachment: &RawAttachment) -> Option<String> {
    let candidates = [
        attachment.file_url.as_deref(),
        attachment.url.as_deref(),
        attachment.video_data.as_ref().and_then(|d| d.url.as_deref()),
        attachment.payload.as_ref().and_then(|p| p.url.as_deref()),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|url| !url.is_empty())
        .map(|url| url.to_string())
}

/// Packs caption text and URL into the legacy one-column encoding. With no
/// caption the content is the bare URL (possibly empty).
fn compose(text: &str, sentinel: &str, url: &str) -> String {
    if text.is_empty() {
        url.to_string()
    } else {
        format!("{} |{}_URL|{}", text, sentinel, url)
    }
}

/// Renders a template: its text (or the record's plain text) followed by a
/// numbered list of button titles.
fn render_template(attachment: &RawAttachment, record_text: &str) -> String {
    let payload = attachment.payload.as_ref();
    let base = payload
        .and_then(|p| p.text.as_deref())
        .filter(|t| !t.is_empty())
        .unwrap_or(record_text);

    let mut content = base.to_string();
    if let Some(buttons) = payload.and_then(|p| p.buttons.as_ref()) {
        for (index, button) in buttons.iter().enumerate() {
            if let Some(title) = button.title.as_deref().filter(|t| !t.is_empty()) {
                if !content.is_empty() {
                    content.push('\n');
                }
                content.push_str(&format!("{}. {}", index + 1, title));
            }
        }
    }
    content
}

pub struct AttachmentClassifier {
    api: Arc<dyn GraphApi>,
}

impl AttachmentClassifier {
    pub fn new(api: Arc<dyn GraphApi>) -> Self {
        Self { api }
    }

    /// Classifies one record. Never fails: network fallbacks are swallowed
    /// and an empty result degrades to a kind-appropriate placeholder.
    pub async fn classify(&self, record: &RemoteMessage, access_token: &str) -> Classified {
        let text = record.message.as_deref().unwrap_or("").trim();
        let mut malformed_attachment = false;

        let (kind, content) = if let Some(slot) = record.first_attachment() {
            match slot.as_parsed() {
                Some(attachment) => {
                    let variant = resolve_variant(attachment);
                    match variant {
                        AttachmentVariant::Template => {
                            (MessageKind::Text, render_template(attachment, text))
                        }
                        AttachmentVariant::Image | AttachmentVariant::AnimatedImage => {
                            let url = match pick_image_url(attachment) {
                                Some(url) => url,
                                None => self
                                    .recover_image_url(attachment, &record.id, access_token)
                                    .await
                                    .unwrap_or_default(),
                            };
                            (MessageKind::Image, compose(text, variant.sentinel(), &url))
                        }
                        AttachmentVariant::Video
                        | AttachmentVariant::Audio
                        | AttachmentVariant::File => {
                            let url = pick_file_url(attachment).unwrap_or_default();
                            (MessageKind::File, compose(text, variant.sentinel(), &url))
                        }
                    }
                }
                None => {
                    debug!(
                        message_id = %record.id,
                        "Attachment payload did not match any known shape"
                    );
                    malformed_attachment = true;
                    (MessageKind::Text, text.to_string())
                }
            }
        } else if let Some(sticker) = record.sticker.as_deref().filter(|s| !s.is_empty()) {
            (MessageKind::Image, sticker.to_string())
        } else if record.shares.is_some() {
            let content = if text.is_empty() {
                SHARE_PLACEHOLDER.to_string()
            } else {
                text.to_string()
            };
            (MessageKind::Text, content)
        } else {
            (MessageKind::Text, text.to_string())
        };

        // Never persist an empty content column.
        let content = if content.trim().is_empty() {
            kind.placeholder().to_string()
        } else {
            content
        };

        Classified {
            kind,
            content,
            malformed_attachment,
        }
    }

    /// Up to two detail fetches against the Graph API: by attachment id, then
    /// by message id. Both requests carry the short detail timeout and their
    /// failures are logged and swallowed.
    async fn recover_image_url(
        &self,
        attachment: &RawAttachment,
        message_id: &str,
        access_token: &str,
    ) -> Option<String> {
        if let Some(attachment_id) = attachment.id.as_deref() {
            match self.api.attachment_detail(attachment_id, access_token).await {
                Ok(detail) => {
                    if let Some(url) = pick_image_url(&detail) {
                        return Some(url);
                    }
                }
                Err(err) => {
                    debug!(attachment_id, error = %err, "Attachment detail fetch failed");
                }
            }
        }

        match self.api.message_attachment(message_id, access_token).await {
            Ok(Some(detail)) => pick_image_url(&detail),
            Ok(None) => None,
            Err(err) => {
                debug!(message_id, error = %err, "Message detail fetch failed");
                None
            }
        }
    }
}
