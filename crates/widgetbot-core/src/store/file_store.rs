use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::instance::Instance;
use crate::util::{ensure_dir, safe_filename};

use super::InstanceStore;

/// File-based instance store: one pretty-printed JSON file per instance.
pub struct FileInstanceStore {
    instances_dir: PathBuf,
}

impl FileInstanceStore {
    pub fn new(instances_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let instances_dir = ensure_dir(&instances_dir.into())
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(Self { instances_dir })
    }

    fn instance_path(&self, id: &str) -> PathBuf {
        self.instances_dir.join(format!("{}.json", safe_filename(id)))
    }
}

impl InstanceStore for FileInstanceStore {
    fn load(&self, id: &str) -> Result<Option<Instance>, StoreError> {
        let path = self.instance_path(id);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Read(format!("{}: {}", path.display(), e))),
        };
        let instance = serde_json::from_str(&content)
            .map_err(|e| StoreError::Read(format!("{}: {}", path.display(), e)))?;
        Ok(Some(instance))
    }

    fn save(&self, instance: &Instance) -> Result<(), StoreError> {
        let path = self.instance_path(&instance.id);
        let json = serde_json::to_string_pretty(instance)?;

        // Write to a sibling file first so readers never see a torn record.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| StoreError::Write(format!("{}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| StoreError::Write(format!("{}: {}", path.display(), e)))?;
        debug!("Saved instance {} to {}", instance.id, path.display());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let path = self.instance_path(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Write(format!("{}: {}", path.display(), e))),
        }
    }

    fn list(&self) -> Result<Vec<Instance>, StoreError> {
        let entries = std::fs::read_dir(&self.instances_dir)
            .map_err(|e| StoreError::Read(format!("{}: {}", self.instances_dir.display(), e)))?;

        let mut instances = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    serde_json::from_str::<Instance>(&content).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(instance) => instances.push(instance),
                Err(e) => warn!("Skipping unreadable instance file {}: {}", path.display(), e),
            }
        }
        instances.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(instances)
    }
}
