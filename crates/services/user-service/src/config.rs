//! User service configuration.

use std::env;

use common::DatabaseConfig;
use domain::USER_COLLECTION;

use crate::repository::DecodePolicy;

/// User service configuration.
#[derive(Debug, Clone)]
pub struct UserServiceConfig {
    /// Document database connection settings
    pub database: DatabaseConfig,
    /// Collection holding user documents
    pub collection: String,
    /// Handling of documents that fail to decode
    pub decode_policy: DecodePolicy,
}

impl UserServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = DatabaseConfig::default();
        Self {
            database: DatabaseConfig {
                url: env::var("USER_SERVICE_MONGODB_URI")
                    .or_else(|_| env::var("MONGODB_URI"))
                    .unwrap_or(defaults.url),
                database: env::var("USER_SERVICE_DATABASE").unwrap_or(defaults.database),
                max_pool_size: env::var("USER_SERVICE_MAX_POOL_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_pool_size),
                connect_timeout_ms: env::var("USER_SERVICE_CONNECT_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.connect_timeout_ms),
            },
            collection: env::var("USER_SERVICE_COLLECTION")
                .unwrap_or_else(|_| USER_COLLECTION.to_string()),
            decode_policy: match env::var("USER_SERVICE_STRICT_DECODE").as_deref() {
                Ok("1") | Ok("true") => DecodePolicy::Strict,
                _ => DecodePolicy::Skip,
            },
        }
    }
}

impl Default for UserServiceConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            collection: USER_COLLECTION.to_string(),
            decode_policy: DecodePolicy::Skip,
        }
    }
}
