//! Storage side: documents, queries, converters and the SQLite-backed realtime store.

pub mod converters;
pub mod database;
pub mod documents;
pub mod entities;
pub mod query;
pub mod realtime_store;
pub mod traits;
