//! Paginated message fetcher.
//!
//! Resolves the Graph-side conversation id, then walks the message list
//! following the `after` cursor, stopping at [`MAX_PAGES`]. Any remote failure
//! aborts the whole fetch; partial pages are not persisted.

use std::sync::Arc;

use facebook_graph::{GraphApi, GraphApiError, RemoteMessage, MAX_PAGES};
use inbox_core::{RemoteErrorKind, Result, SyncContext, SyncError};
use tracing::info;

pub struct MessageFetcher {
    api: Arc<dyn GraphApi>,
}

impl MessageFetcher {
    pub fn new(api: Arc<dyn GraphApi>) -> Self {
        Self { api }
    }

    /// All records for the context's conversation, newest page first as Graph
    /// returns them.
    pub async fn fetch(&self, ctx: &SyncContext) -> Result<Vec<RemoteMessage>> {
        let graph_conversation_id = self
            .api
            .find_conversation(&ctx.page_id, &ctx.customer_psid, &ctx.access_token)
            .await
            .map_err(map_graph_error)?
            .ok_or(SyncError::RemoteConversationNotFound)?;

        let mut records: Vec<RemoteMessage> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages_fetched = 0;

        while pages_fetched < MAX_PAGES {
            let page = self
                .api
                .list_messages(&graph_conversation_id, &ctx.access_token, cursor.as_deref())
                .await
                .map_err(map_graph_error)?;
            pages_fetched += 1;

            let next = page.next_cursor().map(|c| c.to_string());
            records.extend(page.data);

            match next {
                Some(next_cursor) => cursor = Some(next_cursor),
                None => break,
            }
        }

        if records.is_empty() {
            return Err(SyncError::NoMessagesFound);
        }

        info!(
            conversation = %graph_conversation_id,
            pages = pages_fetched,
            total = records.len(),
            "Fetched remote messages"
        );
        Ok(records)
    }
}

/// Carries the Graph error taxonomy into [`SyncError`] so the HTTP boundary
/// can echo Facebook's own code/type.
pub(crate) fn map_graph_error(err: GraphApiError) -> SyncError {
    let kind = match &err {
        GraphApiError::Permission { .. } => RemoteErrorKind::Permission,
        GraphApiError::NotFound { .. } => RemoteErrorKind::NotFound,
        GraphApiError::Api { .. } | GraphApiError::Transport(_) => RemoteErrorKind::Other,
    };
    SyncError::RemoteApi {
        kind,
        message: err.message(),
        code: err.code(),
        error_type: err.error_type(),
    }
}
