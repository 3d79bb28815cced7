//! Database connection and initialization.

use std::time::Duration;

use bson::{doc, Document};
use mongodb::error::Error as MongoError;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};

use common::DatabaseConfig;

/// Application name reported to the server
const APP_NAME: &str = "user-service";

/// Database wrapper for connection management.
///
/// Created once at startup; cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct Database {
    database: mongodb::Database,
}

impl Database {
    /// Build a client for the configured deployment.
    ///
    /// The driver connects lazily, so this does not fail when the server is
    /// down; use [`Database::ping`] to check connectivity.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, MongoError> {
        let mut options = ClientOptions::parse(&config.url).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.max_pool_size = Some(config.max_pool_size);
        options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        options.server_selection_timeout = Some(Duration::from_millis(config.connect_timeout_ms));

        let client = Client::with_options(options)?;
        let database = client.database(&config.database);
        tracing::info!(database = %config.database, "Database client created");

        Ok(Self { database })
    }

    /// Get a handle to a collection of raw documents.
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// Check database connectivity by running the `ping` command.
    pub async fn ping(&self) -> Result<(), MongoError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
