use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::instance::{Instance, InstanceCreate, InstanceUpdate};
use crate::settings::{
    default_settings, merge, merge_section, migrate_legacy, validate_document, Section,
};
use crate::store::InstanceStore;

/// Instance lifecycle and settings mutations on top of an [`InstanceStore`].
///
/// Payloads are expected to be validated by the caller. Every
/// read-modify-write holds the instance's lock from load to save, so two
/// updates of the same instance never interleave within this process.
pub struct InstanceService {
    store: Arc<dyn InstanceStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl InstanceService {
    pub fn new(store: Arc<dyn InstanceStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `op` while holding the instance's lock.
    ///
    /// The registry only keeps entries for instances somebody is holding or
    /// waiting on; the entry is dropped as soon as the last holder is done.
    async fn locked<T>(&self, id: &str, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            op()
        };
        drop(lock);
        self.locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Load, change and persist an instance under its lock.
    async fn modify(&self, id: &str, change: impl FnOnce(&mut Instance)) -> Result<Instance> {
        self.locked(id, || {
            let mut instance = self.load_existing(id)?;
            change(&mut instance);
            self.store.save(&instance)?;
            Ok(instance)
        })
        .await
    }

    fn load_existing(&self, id: &str) -> Result<Instance> {
        self.store
            .load(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()).into())
    }

    // ====== Instances ======

    pub async fn create_instance(&self, owner_id: Option<&str>, data: InstanceCreate) -> Result<Instance> {
        let instance = Instance::new(owner_id, data);
        self.store.save(&instance)?;
        info!("Created instance {} ({})", instance.id, instance.name);
        Ok(instance)
    }

    pub fn get_instance(&self, id: &str) -> Result<Instance> {
        self.load_existing(id)
    }

    /// Resolve a widget API key. Inactive instances do not resolve.
    pub fn get_instance_by_api_key(&self, api_key: &str) -> Result<Option<Instance>> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .find(|i| i.is_active && i.api_key == api_key))
    }

    /// Instances belonging to `owner_id`, oldest first.
    pub fn list_instances(&self, owner_id: &str) -> Result<Vec<Instance>> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|i| i.owner_id.as_deref() == Some(owner_id))
            .collect())
    }

    pub async fn update_instance(&self, id: &str, update: InstanceUpdate) -> Result<Instance> {
        let instance = self.modify(id, |instance| instance.apply(update)).await?;
        info!("Updated instance {}", id);
        Ok(instance)
    }

    /// Delete an instance together with its settings.
    pub async fn delete_instance(&self, id: &str) -> Result<()> {
        let deleted = self.locked(id, || Ok(self.store.delete(id)?)).await?;
        if !deleted {
            return Err(StoreError::NotFound(id.to_string()).into());
        }
        info!("Deleted instance {}", id);
        Ok(())
    }

    // ====== Settings ======

    pub fn get_settings(&self, id: &str) -> Result<Value> {
        Ok(self.load_existing(id)?.settings)
    }

    /// Deep-merge a partial document into the stored settings.
    pub async fn update_settings(&self, id: &str, partial: &Value) -> Result<Value> {
        let instance = self
            .modify(id, |instance| {
                instance.settings = merge(&instance.settings, partial);
                instance.touch();
            })
            .await?;
        debug!("Updated settings of instance {}", id);
        Ok(instance.settings)
    }

    /// Deep-merge a partial section; other sections are left untouched.
    pub async fn update_settings_section(
        &self,
        id: &str,
        section: Section,
        partial: &Value,
    ) -> Result<Value> {
        let instance = self
            .modify(id, |instance| {
                instance.settings = merge_section(&instance.settings, section, partial);
                instance.touch();
            })
            .await?;
        debug!("Updated settings section {} of instance {}", section, id);
        Ok(instance.settings)
    }

    /// Replace the settings with a fresh default document.
    ///
    /// `identity.name` comes back as the schema default, not the display name.
    pub async fn reset_settings(&self, id: &str) -> Result<Value> {
        let instance = self
            .modify(id, |instance| {
                instance.settings = default_settings();
                instance.touch();
            })
            .await?;
        info!("Reset settings of instance {}", id);
        Ok(instance.settings)
    }

    /// Rewrite every stored document into the current layout.
    ///
    /// Returns the number of migrated instances.
    pub async fn migrate_all(&self) -> Result<usize> {
        let ids: Vec<String> = self.store.list()?.into_iter().map(|i| i.id).collect();
        let mut migrated = 0;
        for id in ids {
            let done = self
                .locked(&id, || {
                    // Deleted since listing.
                    let Some(mut instance) = self.store.load(&id)? else {
                        return Ok(false);
                    };
                    instance.settings = migrate_legacy(&instance.settings, &instance.name);
                    for error in validate_document(&instance.settings) {
                        warn!("Instance {} has invalid migrated settings: {}", id, error);
                    }
                    instance.touch();
                    self.store.save(&instance)?;
                    Ok(true)
                })
                .await?;
            if done {
                migrated += 1;
            }
        }
        info!("Migrated settings of {} instances", migrated);
        Ok(migrated)
    }
}
