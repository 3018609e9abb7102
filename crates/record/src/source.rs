//! Source type taxonomy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of external system a data source mapping pulls from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Risk metric logs from the core banking system
    CoreBanking,
    /// Incident management records
    Incident,
    /// Control test records
    Control,
    /// Vendor master data
    Vendor,
    /// Generic external API
    ExternalApi,
}

impl SourceType {
    /// Stable string form used in config files and audit events
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::CoreBanking => "core_banking",
            SourceType::Incident => "incident",
            SourceType::Control => "control",
            SourceType::Vendor => "vendor",
            SourceType::ExternalApi => "external_api",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_round_trip() {
        let parsed: SourceType = serde_json::from_str("\"core_banking\"").unwrap();
        assert_eq!(parsed, SourceType::CoreBanking);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"core_banking\"");
    }

    #[test]
    fn test_display_matches_config_form() {
        assert_eq!(SourceType::ExternalApi.to_string(), "external_api");
        assert_eq!(SourceType::Vendor.to_string(), "vendor");
    }
}
