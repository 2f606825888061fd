//! Conversation and message synchronisation for support chat - Library exports

pub mod config;
pub mod core;
pub mod error;
pub mod infrastructure;

pub use crate::config::SyncSettings;
pub use crate::core::conversations::ConversationSyncEngine;
pub use crate::core::messages::{MessageSyncEngine, SendOutcome};
pub use crate::core::services::ChatSession;
pub use crate::error::{ChatError, StoreError};
pub use crate::infrastructure::realtime_store::SqliteRealtimeStore;
