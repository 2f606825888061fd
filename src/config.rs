//! Runtime settings, read from the environment (and `.env`).

use crate::core::pagination::DEFAULT_PAGE_SIZE;
use log::warn;
use std::env;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_AGENT_ID: &str = "bot";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub database_url: String,
    pub conversation_page_size: usize,
    pub message_page_size: usize,
    /// Id of the support agent users talk to.
    pub agent_id: String,
    pub conversations_collection: String,
    pub messages_collection: String,
    pub translation_url: Option<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            conversation_page_size: DEFAULT_PAGE_SIZE,
            message_page_size: DEFAULT_PAGE_SIZE,
            agent_id: DEFAULT_AGENT_ID.to_owned(),
            conversations_collection: "conversations".to_owned(),
            messages_collection: "messages".to_owned(),
            translation_url: None,
        }
    }
}

impl SyncSettings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            database_url: string_var("DATABASE_URL").unwrap_or(defaults.database_url),
            conversation_page_size: parsed_var("CONVERSATION_PAGE_SIZE")
                .unwrap_or(defaults.conversation_page_size),
            message_page_size: parsed_var("MESSAGE_PAGE_SIZE").unwrap_or(defaults.message_page_size),
            agent_id: string_var("SUPPORT_AGENT_ID").unwrap_or(defaults.agent_id),
            conversations_collection: string_var("CONVERSATIONS_COLLECTION")
                .unwrap_or(defaults.conversations_collection),
            messages_collection: string_var("MESSAGES_COLLECTION")
                .unwrap_or(defaults.messages_collection),
            translation_url: string_var("TRANSLATION_API_URL"),
        }
    }
}

fn string_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = string_var(name)?;
    match T::from_str(raw.trim()) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring {name}={raw}: not a valid value");
            None
        }
    }
}
