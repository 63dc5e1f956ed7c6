//! Conversation records and their on-disk store.
//!
//! Each session is one pretty-printed JSON array of messages in the sessions
//! directory. The file name doubles as the chat id and is derived from a
//! model-generated topic the first time a conversation is saved.

pub mod message;
pub mod naming;
pub mod store;

pub use message::{Message, Role};
pub use naming::{
    format_chat_title, resolve_unique_chat_id, sanitize_filename, DEFAULT_CHAT_STEM,
    MAX_TOPIC_CHARS,
};
pub use store::{SessionStore, SessionSummary, StoreError};
