//! DI "Interfaces" for the collaborators around the sync engines

use crate::error::TranslationError;
use async_trait::async_trait;

pub trait IdentityProvider: Send + Sync {
    /// Stable id of the signed-in user, or `None` before sign-in completes.
    fn current_user_id(&self) -> Option<String>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` into `target_language`.
    ///
    /// Callers that must not block on translation should go through
    /// [`translate_or_original`](crate::core::translation::translate_or_original).
    async fn translate(&self, text: &str, target_language: &str)
    -> Result<String, TranslationError>;
}
