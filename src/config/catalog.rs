//! Demo catalog configuration.

use serde::Deserialize;

/// Catalog seeding settings for the demo binary.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Path to a YAML file with a top-level `items` list.
    pub seed_path: Option<String>,
}
