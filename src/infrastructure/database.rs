//! Pooled SQLite connection

use crate::error::StoreError;
use log::debug;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::ops::{Deref, DerefMut};

#[derive(Clone)]
pub struct DatabaseConnection {
    connection: SqlitePool,
}

impl DatabaseConnection {
    /// Connects to `database_url` and brings the schema up to date.
    ///
    /// In-memory databases live inside a single connection, so they get a pool of one
    /// connection that is never recycled.
    pub async fn connect(database_url: &str) -> Result<DatabaseConnection, StoreError> {
        let options = if database_url.contains(":memory:") || database_url.contains("mode=memory")
        {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = options.connect(database_url).await?;
        sqlx::migrate!().run(&pool).await?;
        debug!("connected to {database_url}");

        Ok(DatabaseConnection { connection: pool })
    }

    pub async fn in_memory() -> Result<DatabaseConnection, StoreError> {
        Self::connect("sqlite::memory:").await
    }
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl DerefMut for DatabaseConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}
