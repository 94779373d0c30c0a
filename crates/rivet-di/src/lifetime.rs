//! Caching policies for resolved instances
//!
//! A registration owns one [`Lifetime`]. Resolution asks it for a cached
//! value first and hands every freshly built value back to it. A failed
//! build never reaches `store`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::instance::Instance;

pub trait Lifetime: Send + Sync {
    /// Previously stored instance, if this lifetime reuses one
    fn fetch(&self) -> Option<Instance>;

    fn store(&self, instance: &Instance);
}

/// Builds a new instance on every resolution
#[derive(Debug, Default, Clone, Copy)]
pub struct TransientLifetime;

impl Lifetime for TransientLifetime {
    fn fetch(&self) -> Option<Instance> {
        None
    }

    fn store(&self, _instance: &Instance) {}
}

/// Keeps the first stored instance for the lifetime of the registration
#[derive(Debug, Default)]
pub struct MemoryLifetime {
    slot: Mutex<Option<Instance>>,
}

impl MemoryLifetime {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Lifetime for MemoryLifetime {
    fn fetch(&self) -> Option<Instance> {
        self.slot.lock().clone()
    }

    fn store(&self, instance: &Instance) {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            *slot = Some(instance.clone());
        }
    }
}

/// Keyed instance storage shared by [`ExternalLifetime`]s
pub trait ObjectStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Instance>;

    fn add(&self, key: &str, instance: Instance);

    /// Drop every stored instance
    fn purge(&self);
}

/// In-memory [`ObjectStore`]
#[derive(Debug, Default)]
pub struct ObjectManager {
    objects: RwLock<HashMap<String, Instance>>,
}

impl ObjectManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for ObjectManager {
    fn get(&self, key: &str) -> Option<Instance> {
        self.objects.read().get(key).cloned()
    }

    fn add(&self, key: &str, instance: Instance) {
        self.objects.write().insert(key.to_string(), instance);
    }

    fn purge(&self) {
        let mut objects = self.objects.write();
        debug!(count = objects.len(), "purging object store");
        objects.clear();
    }
}

/// Delegates caching to an [`ObjectStore`] under a fixed key, so the cache
/// can outlive or be purged independently of the container
pub struct ExternalLifetime {
    key: String,
    store: Arc<dyn ObjectStore>,
}

impl ExternalLifetime {
    pub fn new(key: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            key: key.into(),
            store,
        }
    }
}

impl Lifetime for ExternalLifetime {
    fn fetch(&self) -> Option<Instance> {
        self.store.get(&self.key)
    }

    fn store(&self, instance: &Instance) {
        self.store.add(&self.key, instance.clone());
    }
}

/// Configurable choice between the built-in lifetimes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifetimeKind {
    #[default]
    Transient,
    Memory,
}

impl LifetimeKind {
    pub fn create(self) -> Arc<dyn Lifetime> {
        match self {
            LifetimeKind::Transient => Arc::new(TransientLifetime),
            LifetimeKind::Memory => Arc::new(MemoryLifetime::new()),
        }
    }
}
