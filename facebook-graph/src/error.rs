//! Graph API error parsing and classification.
//!
//! Facebook wraps failures as `{"error": {"message", "type", "code", ...}}`.
//! The variants here mirror the statuses the sync endpoint surfaces:
//! Permission → 403, NotFound → 404, everything else → 500.

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphApiError {
    /// Code 100 or an OAuthException: token invalid or missing page permission.
    #[error("Facebook permission error: {message}")]
    Permission {
        message: String,
        code: Option<i64>,
        error_type: Option<String>,
    },

    /// Code 803 or HTTP 404: the object does not exist or is not visible.
    #[error("Facebook object not found: {message}")]
    NotFound {
        message: String,
        code: Option<i64>,
        error_type: Option<String>,
    },

    #[error("Facebook API error: {message}")]
    Api {
        message: String,
        code: Option<i64>,
        error_type: Option<String>,
    },

    /// Network failure or per-request timeout.
    #[error("Facebook request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<i64>,
}

impl GraphApiError {
    /// Classifies a non-2xx response from its status and body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let payload = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error)
            .ok();

        let message = payload
            .as_ref()
            .and_then(|p| p.message.clone())
            .unwrap_or_else(|| format!("Facebook API request failed with status {}", status));
        let code = payload.as_ref().and_then(|p| p.code);
        let error_type = payload.as_ref().and_then(|p| p.error_type.clone());

        let oauth = error_type.as_deref() == Some("OAuthException");
        if code == Some(100) || oauth {
            GraphApiError::Permission {
                message,
                code,
                error_type,
            }
        } else if code == Some(803) || status == 404 {
            GraphApiError::NotFound {
                message,
                code,
                error_type,
            }
        } else {
            GraphApiError::Api {
                message,
                code,
                error_type,
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            GraphApiError::Permission { message, .. }
            | GraphApiError::NotFound { message, .. }
            | GraphApiError::Api { message, .. } => message.clone(),
            GraphApiError::Transport(err) => err.to_string(),
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            GraphApiError::Permission { code, .. }
            | GraphApiError::NotFound { code, .. }
            | GraphApiError::Api { code, .. } => *code,
            GraphApiError::Transport(_) => None,
        }
    }

    pub fn error_type(&self) -> Option<String> {
        match self {
            GraphApiError::Permission { error_type, .. }
            | GraphApiError::NotFound { error_type, .. }
            | GraphApiError::Api { error_type, .. } => error_type.clone(),
            GraphApiError::Transport(_) => None,
        }
    }
}
