//! Sync error taxonomy.
//!
//! Resolution errors map to 4xx, remote-API errors carry Facebook's own error
//! classification, and storage errors surface as 500. Classification and
//! per-row persistence failures are NOT represented here: they are recovered
//! inside the pipeline and reported as a non-zero error count in the summary.

use thiserror::Error;

/// Classification of a remote-API failure, derived from Facebook's error
/// payload (`error.code` / `error.type`) and the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Code 100 or an OAuth error: the token lacks permission for the page.
    Permission,
    /// Code 803 or HTTP 404: the remote object does not exist.
    NotFound,
    Other,
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Customer has no Facebook identity on this conversation")]
    MissingCustomerIdentity,

    #[error("No Facebook page is configured for this company")]
    NoChannelConfigured,

    #[error("No access token available for page {0}")]
    CredentialUnavailable(String),

    #[error("No Facebook conversation found for this customer")]
    RemoteConversationNotFound,

    #[error("No messages found in the Facebook conversation")]
    NoMessagesFound,

    #[error("Facebook API error: {message}")]
    RemoteApi {
        kind: RemoteErrorKind,
        message: String,
        code: Option<i64>,
        error_type: Option<String>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl SyncError {
    /// HTTP status this error maps to at the REST boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            SyncError::ConversationNotFound(_)
            | SyncError::NoChannelConfigured
            | SyncError::CredentialUnavailable(_)
            | SyncError::RemoteConversationNotFound
            | SyncError::NoMessagesFound => 404,
            SyncError::MissingCustomerIdentity => 400,
            SyncError::RemoteApi { kind, .. } => match kind {
                RemoteErrorKind::Permission => 403,
                RemoteErrorKind::NotFound => 404,
                RemoteErrorKind::Other => 500,
            },
            SyncError::Storage(_) | SyncError::Config(_) => 500,
        }
    }

    /// Wraps a storage-layer error. Used with `map_err` at repository call sites.
    pub fn storage<E: std::fmt::Display>(err: E) -> Self {
        SyncError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
