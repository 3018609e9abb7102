//! Connector registry with per-connector lock shards

use crate::connector::{Connector, ConnectorSnapshot, ConnectorStatus};
use crate::{ConnectorError, Result};
use chrono::{DateTime, Utc};
use filer_config::ConnectorsConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all configured connectors
///
/// Each entry sits behind its own `RwLock` so workers touching different
/// connectors never contend; the outer map is built once at startup and
/// only read afterwards.
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<RwLock<Connector>>>,
}

impl ConnectorRegistry {
    /// Build the registry from configuration
    pub fn from_config(config: &ConnectorsConfig) -> Self {
        let connectors = config
            .iter()
            .map(|(id, connector_config)| {
                (
                    id.clone(),
                    Arc::new(RwLock::new(Connector::new(id.clone(), connector_config.clone()))),
                )
            })
            .collect();
        Self { connectors }
    }

    /// All connector ids
    pub fn ids(&self) -> Vec<String> {
        self.connectors.keys().cloned().collect()
    }

    /// Number of registered connectors
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Shared handle to one connector's lock shard
    pub fn get(&self, id: &str) -> Result<Arc<RwLock<Connector>>> {
        self.connectors
            .get(id)
            .cloned()
            .ok_or_else(|| ConnectorError::Unknown(id.to_string()))
    }

    /// Point-in-time snapshot of one connector
    pub fn snapshot(&self, id: &str) -> Result<ConnectorSnapshot> {
        Ok(self.get(id)?.read().snapshot())
    }

    /// Snapshots of every connector, in id order
    pub fn snapshots(&self) -> Vec<ConnectorSnapshot> {
        let mut all: Vec<_> = self
            .connectors
            .values()
            .map(|c| c.read().snapshot())
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Record a successful sync for a connector
    pub fn record_success(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.get(id)?.write().record_success(at);
        Ok(())
    }

    /// Record a failed sync for a connector
    pub fn record_failure(&self, id: &str) -> Result<()> {
        self.get(id)?.write().record_failure();
        Ok(())
    }

    /// Reset a connector's consecutive error count after a successful
    /// health check
    pub fn reset_errors(&self, id: &str) -> Result<()> {
        self.get(id)?.write().reset_errors();
        Ok(())
    }

    /// Transition a connector's status
    ///
    /// Callers are the health monitor and the scheduler; nothing else
    /// should drive status.
    pub fn set_status(&self, id: &str, status: ConnectorStatus) -> Result<()> {
        self.get(id)?.write().set_status(status);
        Ok(())
    }

    /// Record a connector's next scheduled sync time
    pub fn set_next_sync(&self, id: &str, at: Option<DateTime<Utc>>) -> Result<()> {
        self.get(id)?.write().set_next_sync(at);
        Ok(())
    }
}
