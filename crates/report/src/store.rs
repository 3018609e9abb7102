//! Report instance store
//!
//! Abstract interface over the durable report/template store. The
//! pipeline treats the store as opaque and never assumes in-memory
//! visibility across restarts; the file backend re-reads from disk on
//! every get.

use crate::instance::{InstanceStatus, ReportInstance};
use crate::{ReportError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

/// Durable store for report instances
///
/// Implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a new instance
    async fn create(&self, instance: &ReportInstance) -> Result<()>;

    /// Persist changes to an existing instance
    ///
    /// Fails with `Immutable` when the stored instance is `Submitted`.
    async fn update(&self, instance: &ReportInstance) -> Result<()>;

    /// Load an instance by id
    async fn get(&self, id: &str) -> Result<ReportInstance>;

    /// List instance ids for a report configuration
    async fn list_for_config(&self, config_id: &str) -> Result<Vec<String>>;

    /// Store backend name (for logging)
    fn name(&self) -> &'static str;
}

/// In-memory store for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    instances: RwLock<HashMap<String, ReportInstance>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn create(&self, instance: &ReportInstance) -> Result<()> {
        self.instances
            .write()
            .insert(instance.id.clone(), instance.clone());
        Ok(())
    }

    async fn update(&self, instance: &ReportInstance) -> Result<()> {
        let mut instances = self.instances.write();
        match instances.get(&instance.id) {
            None => Err(ReportError::UnknownInstance(instance.id.clone())),
            Some(existing) if existing.status == InstanceStatus::Submitted => {
                Err(ReportError::Immutable(instance.id.clone()))
            }
            Some(_) => {
                instances.insert(instance.id.clone(), instance.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<ReportInstance> {
        self.instances
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ReportError::UnknownInstance(id.to_string()))
    }

    async fn list_for_config(&self, config_id: &str) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .instances
            .read()
            .values()
            .filter(|i| i.config_id == config_id)
            .map(|i| i.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// File-backed store, one JSON document per instance
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory
    ///
    /// The directory is created if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| ReportError::Store(e.to_string()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn read_instance(&self, id: &str) -> Result<ReportInstance> {
        let path = self.path_for(id);
        let bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReportError::UnknownInstance(id.to_string())
            } else {
                ReportError::Store(e.to_string())
            }
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ReportError::Store(e.to_string()))
    }

    fn write_instance(&self, instance: &ReportInstance) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(instance)
            .map_err(|e| ReportError::Store(e.to_string()))?;
        // Write-then-rename so a crash never leaves a torn document
        let tmp = self.dir.join(format!("{}.json.tmp", instance.id));
        std::fs::write(&tmp, &bytes).map_err(|e| ReportError::Store(e.to_string()))?;
        std::fs::rename(&tmp, self.path_for(&instance.id))
            .map_err(|e| ReportError::Store(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ReportStore for FileStore {
    async fn create(&self, instance: &ReportInstance) -> Result<()> {
        self.write_instance(instance)
    }

    async fn update(&self, instance: &ReportInstance) -> Result<()> {
        let existing = self.read_instance(&instance.id)?;
        if existing.status == InstanceStatus::Submitted {
            return Err(ReportError::Immutable(instance.id.clone()));
        }
        self.write_instance(instance)
    }

    async fn get(&self, id: &str) -> Result<ReportInstance> {
        self.read_instance(id)
    }

    async fn list_for_config(&self, config_id: &str) -> Result<Vec<String>> {
        let entries =
            std::fs::read_dir(&self.dir).map_err(|e| ReportError::Store(e.to_string()))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ReportError::Store(e.to_string()))?;
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if let Ok(instance) = self.read_instance(stem) {
                if instance.config_id == config_id {
                    ids.push(instance.id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
