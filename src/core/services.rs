//! The chat session handed to the UI layer.
//!

use crate::config::SyncSettings;
use crate::core::conversations::ConversationSyncEngine;
use crate::core::messages::{MessageSyncEngine, SendOutcome};
use crate::core::traits::IdentityProvider;
use crate::error::ChatError;
use crate::infrastructure::traits::DocumentStore;
use log::error;
use std::sync::Arc;

/// Identity fixed at construction, for embedders that already know the user.
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self(Some(user_id.into()))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Builds engines for whoever is currently signed in.
///
/// Every operation resolves the user first and refuses to run without one, so nothing is ever
/// attributed to a placeholder id.
pub struct ChatSession {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    settings: SyncSettings,
}

impl ChatSession {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            identity,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn current_user(&self) -> Result<String, ChatError> {
        match self.identity.current_user_id() {
            Some(user_id) if !user_id.is_empty() => Ok(user_id),
            _ => {
                error!("chat operation attempted without a signed-in user");
                Err(ChatError::MissingIdentity)
            }
        }
    }

    pub fn conversations(&self) -> Result<ConversationSyncEngine, ChatError> {
        ConversationSyncEngine::new(
            Arc::clone(&self.store),
            self.current_user()?,
            &self.settings,
        )
    }

    pub fn open_conversation(&self, conversation_id: &str) -> Result<MessageSyncEngine, ChatError> {
        self.current_user()?;

        MessageSyncEngine::new(Arc::clone(&self.store), conversation_id, &self.settings)
    }

    /// Creates an empty conversation between the current user and the support agent.
    pub async fn start_support_conversation(&self) -> Result<String, ChatError> {
        self.conversations()?
            .start_conversation_with(&self.settings.agent_id)
            .await
    }

    pub async fn send_to_agent(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<SendOutcome, ChatError> {
        let user_id = self.current_user()?;

        self.open_conversation(conversation_id)?
            .send_message(&user_id, &self.settings.agent_id, content)
            .await
    }
}
