//! Reqwest client for the Graph API endpoints the sync uses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::GraphApiError;
use crate::types::{MessagePage, RawAttachment};

/// Records requested per page.
pub const PAGE_SIZE: u32 = 50;
/// Pages fetched per sync run at most. A cost bound, not a completeness
/// guarantee.
pub const MAX_PAGES: u32 = 3;
/// Timeout for conversation/message listing calls.
pub const LIST_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for the URL-recovery detail calls.
pub const DETAIL_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
const DEFAULT_VERSION: &str = "v19.0";

/// Fields requested for each message, with the attachment expansion the
/// classifier reads.
const MESSAGE_FIELDS: &str =
    "id,message,from,to,created_time,sticker,shares,attachments{id,mime_type,name,url,file_url,image_data,video_data,payload}";

/// The Graph API surface consumed by the sync pipeline. Implemented by
/// [`GraphClient`]; tests may substitute their own.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Resolves the Graph-side conversation id for a customer PSID, or None
    /// when the page has no conversation with that participant.
    async fn find_conversation(
        &self,
        page_id: &str,
        customer_psid: &str,
        access_token: &str,
    ) -> Result<Option<String>, GraphApiError>;

    /// One page of messages for a Graph conversation id, optionally resumed
    /// from an `after` cursor.
    async fn list_messages(
        &self,
        graph_conversation_id: &str,
        access_token: &str,
        after: Option<&str>,
    ) -> Result<MessagePage, GraphApiError>;

    /// Detail fetch by attachment id, requesting URL fields specifically.
    async fn attachment_detail(
        &self,
        attachment_id: &str,
        access_token: &str,
    ) -> Result<RawAttachment, GraphApiError>;

    /// Detail fetch by message id; returns its first attachment, if any.
    async fn message_attachment(
        &self,
        message_id: &str,
        access_token: &str,
    ) -> Result<Option<RawAttachment>, GraphApiError>;
}

/// Production Graph API client. The base URL is overridable so tests can
/// point it at a local mock server.
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct ConversationList {
    #[serde(default)]
    data: Vec<ConversationRef>,
}

#[derive(Debug, Deserialize)]
struct ConversationRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageDetail {
    #[serde(default)]
    attachments: Option<crate::types::AttachmentList>,
}

impl GraphClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), DEFAULT_VERSION.to_string())
    }

    pub fn with_base_url(base_url: String, version: String) -> Self {
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            version,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.version, path)
    }

    /// Sends a GET and turns any non-2xx response into a classified
    /// [`GraphApiError`].
    async fn get_checked(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<reqwest::Response, GraphApiError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(GraphApiError::from_response(status, &body))
    }
}

impl Default for GraphClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn find_conversation(
        &self,
        page_id: &str,
        customer_psid: &str,
        access_token: &str,
    ) -> Result<Option<String>, GraphApiError> {
        let url = self.url(&format!("{}/conversations", page_id));
        debug!(page_id, customer_psid, "Looking up Graph conversation");

        let response = self
            .get_checked(
                &url,
                &[
                    ("user_id", customer_psid),
                    ("fields", "id"),
                    ("access_token", access_token),
                ],
                LIST_TIMEOUT,
            )
            .await?;

        let list: ConversationList = response.json().await?;
        Ok(list.data.into_iter().next().map(|c| c.id))
    }

    async fn list_messages(
        &self,
        graph_conversation_id: &str,
        access_token: &str,
        after: Option<&str>,
    ) -> Result<MessagePage, GraphApiError> {
        let url = self.url(&format!("{}/messages", graph_conversation_id));
        let limit = PAGE_SIZE.to_string();

        let mut query: Vec<(&str, &str)> = vec![
            ("fields", MESSAGE_FIELDS),
            ("limit", &limit),
            ("access_token", access_token),
        ];
        if let Some(cursor) = after {
            query.push(("after", cursor));
        }

        let response = self.get_checked(&url, &query, LIST_TIMEOUT).await?;
        let page: MessagePage = response.json().await?;

        info!(
            conversation = graph_conversation_id,
            count = page.data.len(),
            has_next = page.next_cursor().is_some(),
            "Fetched message page"
        );
        Ok(page)
    }

    async fn attachment_detail(
        &self,
        attachment_id: &str,
        access_token: &str,
    ) -> Result<RawAttachment, GraphApiError> {
        let url = self.url(attachment_id);
        debug!(attachment_id, "Fetching attachment detail for URL recovery");

        let response = self
            .get_checked(
                &url,
                &[
                    ("fields", "id,mime_type,name,url,file_url,image_data"),
                    ("access_token", access_token),
                ],
                DETAIL_TIMEOUT,
            )
            .await?;

        Ok(response.json().await?)
    }

    async fn message_attachment(
        &self,
        message_id: &str,
        access_token: &str,
    ) -> Result<Option<RawAttachment>, GraphApiError> {
        let url = self.url(message_id);
        debug!(message_id, "Fetching message detail for URL recovery");

        let response = self
            .get_checked(
                &url,
                &[
                    ("fields", "attachments{id,mime_type,name,url,file_url,image_data}"),
                    ("access_token", access_token),
                ],
                DETAIL_TIMEOUT,
            )
            .await?;

        let detail: MessageDetail = response.json().await?;
        Ok(detail
            .attachments
            .and_then(|list| list.data.into_iter().next())
            .and_then(|slot| slot.into_parsed()))
    }
}
