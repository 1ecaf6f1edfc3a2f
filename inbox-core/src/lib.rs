//! # inbox-core
//!
//! Core types and errors for the Facebook inbox sync pipeline: [`SyncContext`],
//! [`NormalizedMessage`], [`SyncReport`], the [`SyncError`] taxonomy, and
//! tracing initialization. Transport- and storage-agnostic; used by
//! facebook-graph, storage adapters, and inbox-sync.

pub mod error;
pub mod logger;
pub mod types;

pub use error::{RemoteErrorKind, Result, SyncError};
pub use logger::init_tracing;
pub use types::{MessageKind, NormalizedMessage, PageCredential, SyncContext, SyncReport};
