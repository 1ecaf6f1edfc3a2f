//! # inbox-sync
//!
//! The Facebook message synchronization pipeline: pulls a customer's thread
//! from the Graph API, normalizes each record into the internal message model,
//! deduplicates against already-stored messages, and bulk-persists the rest.
//!
//! Stages, in order:
//!
//! 1. [`resolver`] – conversation → page id + access token ([`SyncContext`])
//! 2. [`fetcher`] – cursor-paginated Graph fetch, capped at 3 pages
//! 3. [`classifier`] – attachment payload → coarse kind + content string
//! 4. [`direction`] – customer-or-business attribution
//! 5. [`dedup`] – drop records whose remote id is already stored
//! 6. [`persister`] – bulk insert, row-by-row fallback
//!
//! [`SyncService::sync_conversation`] wires them together and returns a
//! [`SyncReport`](inbox_core::SyncReport).
//!
//! [`SyncContext`]: inbox_core::SyncContext

pub mod classifier;
pub mod config;
pub mod credentials;
pub mod dedup;
pub mod direction;
pub mod fetcher;
pub mod persister;
pub mod resolver;
pub mod service;

mod adapters;

pub use classifier::{AttachmentClassifier, Classified};
pub use config::SyncConfig;
pub use credentials::{ChannelCredentialResolver, CredentialResolver};
pub use dedup::split_new;
pub use direction::{resolve_direction, DirectionDecision};
pub use fetcher::MessageFetcher;
pub use persister::{BulkPersister, PersistOutcome};
pub use resolver::ConversationResolver;
pub use service::SyncService;
