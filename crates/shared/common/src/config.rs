//! Shared configuration structures.

use serde::{Deserialize, Serialize};

/// Document database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `mongodb://localhost:27017`
    pub url: String,
    /// Database name
    pub database: String,
    pub max_pool_size: u32,
    /// Server selection / connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://127.0.0.1:27017".to_string(),
            database: "app".to_string(),
            max_pool_size: 10,
            connect_timeout_ms: 5000,
        }
    }
}
