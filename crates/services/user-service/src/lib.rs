//! User Service Library
//!
//! Data access for user records kept in a document database: point lookups,
//! single-field updates and filtered listing through the optional-filter
//! query builder in `common::query`.

pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use tracing::info;

use common::AppResult;

use crate::config::UserServiceConfig;
use crate::infra::{Database, MongoStore};
use crate::repository::UserStore;
use crate::service::UserManager;

/// Build the user service against the configured MongoDB deployment.
pub async fn connect(config: &UserServiceConfig) -> AppResult<UserManager> {
    let db = Database::connect(&config.database).await?;
    let store = Arc::new(MongoStore::new(db.collection(&config.collection)));

    let user_repo = Arc::new(UserStore::new(store).with_decode_policy(config.decode_policy));
    info!(collection = %config.collection, "User repository ready");

    Ok(UserManager::new(user_repo))
}

/// Check that the configured deployment answers.
pub async fn ping(config: &UserServiceConfig) -> AppResult<()> {
    let db = Database::connect(&config.database).await?;
    db.ping().await?;
    info!("Database ping succeeded");
    Ok(())
}
