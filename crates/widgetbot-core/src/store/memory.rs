use dashmap::DashMap;

use crate::error::StoreError;
use crate::instance::Instance;

use super::InstanceStore;

/// In-memory instance store (for local dev/testing).
#[derive(Default)]
pub struct MemoryInstanceStore {
    instances: DashMap<String, Instance>,
}

impl MemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstanceStore for MemoryInstanceStore {
    fn load(&self, id: &str) -> Result<Option<Instance>, StoreError> {
        Ok(self.instances.get(id).map(|entry| entry.value().clone()))
    }

    fn save(&self, instance: &Instance) -> Result<(), StoreError> {
        self.instances.insert(instance.id.clone(), instance.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.instances.remove(id).is_some())
    }

    fn list(&self) -> Result<Vec<Instance>, StoreError> {
        let mut instances: Vec<Instance> = self
            .instances
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        instances.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(instances)
    }
}
