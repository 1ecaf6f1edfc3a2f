//! Row models for the storage crate.

mod channel;
mod conversation;
mod message_record;

pub use channel::ChannelRecord;
pub use conversation::ConversationRecord;
pub use message_record::MessageRecord;
