//! Sync config: database, Graph API endpoint, logging. Loaded from env.

use anyhow::Result;
use std::env;

/// Runtime configuration for the sync pipeline.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// DATABASE_URL
    pub database_url: String,
    /// GRAPH_API_URL; override to point at a test server
    pub graph_api_url: String,
    /// GRAPH_API_VERSION
    pub graph_api_version: String,
    /// Log file path
    pub log_file: String,
}

impl SyncConfig {
    /// Load from environment variables. `database_url` overrides DATABASE_URL
    /// if provided.
    pub fn load(database_url: Option<String>) -> Result<Self> {
        let database_url = database_url
            .or_else(|| env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| "file:./inbox.db".to_string());
        let graph_api_url = env::var("GRAPH_API_URL")
            .unwrap_or_else(|_| "https://graph.facebook.com".to_string());
        let graph_api_version =
            env::var("GRAPH_API_VERSION").unwrap_or_else(|_| "v19.0".to_string());
        let log_file =
            env::var("LOG_FILE").unwrap_or_else(|_| "logs/inbox-sync.log".to_string());

        Ok(Self {
            database_url,
            graph_api_url,
            graph_api_version,
            log_file,
        })
    }

    /// Validate config (GRAPH_API_URL must parse as a URL).
    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.graph_api_url).is_err() {
            anyhow::bail!(
                "GRAPH_API_URL is set but not a valid URL: {}",
                self.graph_api_url
            );
        }
        Ok(())
    }
}
