//! Integration audit log configuration

use serde::Deserialize;

/// Sink kind for the append-only integration audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// In-memory ring, lost on restart
    #[default]
    Memory,
    /// JSONL file, one event per line
    File,
}

/// Audit log configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Sink kind
    pub sink: AuditSinkKind,

    /// File path for the file sink
    pub path: Option<String>,
}
