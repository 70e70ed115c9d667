//! Order storage configuration.

use serde::Deserialize;

fn default_max_connections() -> u32 {
    5
}

/// Order storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub path: Option<String>,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}
