//! Storage crate: SQLite persistence for conversations, channels, and messages.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – ConversationRecord, ChannelRecord, MessageRecord
//! - [`conversation_repo`] – ConversationRepository
//! - [`channel_repo`] – ChannelRepository (connected Facebook pages)
//! - [`message_repo`] – MessageRepository with bulk skip-on-duplicate insert
//! - [`sqlite_pool`] – SqlitePoolManager
//!
//! Repositories share one [`SqlitePoolManager`] and create their own tables
//! on construction. The messages table references conversations with
//! ON DELETE CASCADE, so construct a [`ConversationRepository`] before a
//! [`MessageRepository`] on a fresh database.

mod channel_repo;
mod conversation_repo;
mod error;
mod message_repo;
mod models;
mod sqlite_pool;

pub use channel_repo::ChannelRepository;
pub use conversation_repo::ConversationRepository;
pub use error::StorageError;
pub use message_repo::MessageRepository;
pub use models::{ChannelRecord, ConversationRecord, MessageRecord};
pub use sqlite_pool::SqlitePoolManager;
