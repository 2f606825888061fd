//! Error types shared by the store and the sync engines.

use thiserror::Error;

/// Failures reported by a [`DocumentStore`](crate::infrastructure::traits::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("document body is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document {collection}/{id} does not exist")]
    NotFound { collection: String, id: String },

    #[error("document {id} is malformed: {reason}")]
    Malformed { id: String, reason: String },

    #[error("store rejected the operation: {0}")]
    Rejected(String),
}

/// Errors surfaced by the sync engines to whoever initiated the operation.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The live query could not be established or was terminated by the store.
    #[error("subscription failed: {0}")]
    Subscription(#[source] StoreError),

    /// An append or update was rejected. Nothing was applied locally.
    #[error("write failed: {0}")]
    WriteFailure(#[source] StoreError),

    /// An operation ran before a user id was available.
    #[error("no authenticated user is available")]
    MissingIdentity,

    #[error("invalid participants: {0}")]
    InvalidParticipants(String),

    #[error("message content is empty")]
    EmptyMessage,
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation endpoint answered with status {0}")]
    Status(u16),
}
