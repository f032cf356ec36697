pub mod file_store;
pub mod memory;

use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::error::StoreError;
use crate::instance::Instance;

pub use file_store::FileInstanceStore;
pub use memory::MemoryInstanceStore;

/// Trait for instance storage backends.
///
/// A store holds whole instance records, settings document included. It does
/// no locking of its own: callers that read, modify and write back a record
/// are responsible for serializing those steps.
pub trait InstanceStore: Send + Sync {
    /// Load an instance by id. `Ok(None)` when it does not exist.
    fn load(&self, id: &str) -> Result<Option<Instance>, StoreError>;

    /// Insert or replace an instance.
    fn save(&self, instance: &Instance) -> Result<(), StoreError>;

    /// Delete an instance. Returns whether it existed.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// List all instances, oldest first.
    fn list(&self) -> Result<Vec<Instance>, StoreError>;
}

/// Open the store selected by the configuration.
pub fn open_store(config: &Config) -> Result<Arc<dyn InstanceStore>, StoreError> {
    match config.storage.backend {
        StorageBackend::File => {
            let dir = config.data_dir_path().join("instances");
            Ok(Arc::new(FileInstanceStore::new(dir)?))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryInstanceStore::new())),
    }
}
