//! Typed singleton registry
//!
//! Holds at most one shared instance per type. Instances are created lazily
//! on first request and handed out as `Arc<T>` afterwards. Observers
//! registered with [`InstanceRegistry::on_create`] are called synchronously,
//! in registration order, whenever a new instance enters the registry.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = InstanceRegistry::new();
//! let a = registry.get_or_create::<ConfigHandler>();
//! let b = registry.get_or_create::<ConfigHandler>();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

use once_cell::sync::Lazy;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

type SharedInstance = Arc<dyn Any + Send + Sync>;

/// Observer invoked with the type name of each newly stored instance.
pub type CreateObserver = Box<dyn Fn(&'static str) + Send + Sync>;

static GLOBAL: Lazy<Mutex<InstanceRegistry>> = Lazy::new(|| Mutex::new(InstanceRegistry::new()));

/// Process-wide registry. Callers serialize access through the mutex.
pub fn global() -> &'static Mutex<InstanceRegistry> {
    &GLOBAL
}

#[derive(Default)]
pub struct InstanceRegistry {
    instances: HashMap<TypeId, SharedInstance>,
    names: HashMap<TypeId, &'static str>,
    observers: Vec<CreateObserver>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for instance creation.
    pub fn on_create<F>(&mut self, observer: F)
    where
        F: Fn(&'static str) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Shared instance of `T`, created with `T::default()` on first use.
    pub fn get_or_create<T>(&mut self) -> Arc<T>
    where
        T: Default + Send + Sync + 'static,
    {
        self.get_or_create_with(T::default)
    }

    /// Shared instance of `T`, created with `init` on first use.
    pub fn get_or_create_with<T, F>(&mut self, init: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.get_or_insert(init, |_| {})
    }

    /// Like [`InstanceRegistry::get_or_create`], running `connect` with the
    /// new instance on first creation only.
    pub fn get_or_create_connected<T, C>(&mut self, connect: C) -> Arc<T>
    where
        T: Default + Send + Sync + 'static,
        C: FnOnce(&Arc<T>),
    {
        self.get_or_insert(T::default, connect)
    }

    fn get_or_insert<T, F, C>(&mut self, init: F, connect: C) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
        C: FnOnce(&Arc<T>),
    {
        if let Some(existing) = self.get::<T>() {
            return existing;
        }
        let instance = Arc::new(init());
        self.insert(Arc::clone(&instance));
        connect(&instance);
        instance
    }

    /// Store a pre-built instance unless one of that type already exists.
    ///
    /// Returns `true` if the instance was stored.
    pub fn save_instance<T>(&mut self, instance: Arc<T>) -> bool
    where
        T: Send + Sync + 'static,
    {
        if self.contains::<T>() {
            return false;
        }
        self.insert(instance);
        true
    }

    fn insert<T>(&mut self, instance: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        let id = TypeId::of::<T>();
        let name = type_name::<T>();
        self.instances.insert(id, instance);
        self.names.insert(id, name);
        debug!("Registered global instance {}", name);
        for observer in &self.observers {
            observer(name);
        }
    }

    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let shared = self.instances.get(&TypeId::of::<T>())?;
        Arc::clone(shared).downcast::<T>().ok()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.instances.contains_key(&TypeId::of::<T>())
    }

    /// Type names of stored instances, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.names.values().copied().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
