//! Report instance store configuration

use serde::Deserialize;

/// Backend kind for the report instance store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// In-memory store, lost on restart (tests, dry runs)
    #[default]
    Memory,
    /// JSON-file-backed store
    File,
}

/// Report instance store configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend kind
    pub kind: StoreKind,

    /// Directory for the file backend
    pub path: Option<String>,
}
