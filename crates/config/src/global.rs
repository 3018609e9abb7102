//! Global pipeline settings

use serde::Deserialize;

/// Global worker limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Maximum pipeline runs in flight at once
    pub max_concurrent_runs: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 4,
        }
    }
}
