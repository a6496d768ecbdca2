//! Generic Resource Manager
//!
//! [`Manager<K, T>`] is the owning store behind every `new_X` / `X` / `has_X`
//! / `delete_X` family in the engine. One manager exists per resource kind;
//! aggregates such as `ResourceManager` and `Stage` compose several of them.
//!
//! # Lifecycle
//!
//! 1. A fresh id is allocated.
//! 2. The instance is constructed (default, given value, or clone of another entry).
//! 3. [`Managed::init`] runs; failure aborts creation.
//! 4. The instance is stored and the post-create hooks run with `(&mut instance, id)`.
//!
//! Removal fires the pre-delete signal first and only then drops the entry.
//! Any later lookup of that id is a not-found error.

use std::collections::BTreeMap;

use crate::core::id::{IdKind, UniqueId};
use crate::core::signal::{InstanceHook, Signal};
use crate::errors::{EngineError, Result};

/// Setup step run once after construction, before the instance is stored.
pub trait Managed {
    /// Returns an error if the object can not be used.
    fn init(&mut self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Owning store for one resource kind.
pub struct Manager<K: IdKind, T> {
    objects: BTreeMap<UniqueId<K>, T>,
    fallback: Option<UniqueId<K>>,
    post_create: Signal<InstanceHook<T, UniqueId<K>>>,
    pre_delete: Signal<dyn FnMut(UniqueId<K>)>,
}

impl<K: IdKind, T: Managed + 'static> Manager<K, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            fallback: None,
            post_create: Signal::new(),
            pre_delete: Signal::new(),
        }
    }

    /// Default-constructs and stores a new instance.
    pub fn create(&mut self) -> Result<UniqueId<K>>
    where
        T: Default,
    {
        self.create_with(T::default())
    }

    /// Stores `value` under a freshly allocated id.
    pub fn create_with(&mut self, mut value: T) -> Result<UniqueId<K>> {
        value
            .init()
            .map_err(|reason| EngineError::InitializationFailed {
                kind: K::NAME,
                reason,
            })?;

        let id = UniqueId::allocate();
        self.objects.insert(id, value);

        if let Err(err) = self.run_post_create(id) {
            self.objects.remove(&id);
            return Err(err);
        }

        Ok(id)
    }

    /// Copy-constructs a new instance from an existing entry.
    pub fn create_from(&mut self, source: UniqueId<K>) -> Result<UniqueId<K>>
    where
        T: Clone,
    {
        let copy = self.get(source)?.clone();
        self.create_with(copy)
    }

    fn run_post_create(&mut self, id: UniqueId<K>) -> Result<()> {
        let Some(instance) = self.objects.get_mut(&id) else {
            return Err(EngineError::not_found(K::NAME, id.get()));
        };
        self.post_create.emit(instance, id)
    }
}

impl<K: IdKind, T: 'static> Manager<K, T> {
    /// Makes the null id resolve to `id`.
    pub fn set_fallback(&mut self, id: Option<UniqueId<K>>) {
        self.fallback = id;
    }

    #[must_use]
    pub fn fallback(&self) -> Option<UniqueId<K>> {
        self.fallback
    }

    fn resolve(&self, id: UniqueId<K>) -> UniqueId<K> {
        match (id.is_null(), self.fallback) {
            (true, Some(fallback)) => fallback,
            _ => id,
        }
    }

    pub fn get(&self, id: UniqueId<K>) -> Result<&T> {
        let id = self.resolve(id);
        self.objects
            .get(&id)
            .ok_or_else(|| EngineError::not_found(K::NAME, id.get()))
    }

    pub fn get_mut(&mut self, id: UniqueId<K>) -> Result<&mut T> {
        let id = self.resolve(id);
        self.objects
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found(K::NAME, id.get()))
    }

    /// Existence check. The null id only counts if a fallback is set and live.
    #[must_use]
    pub fn contains(&self, id: UniqueId<K>) -> bool {
        self.objects.contains_key(&self.resolve(id))
    }

    /// Fires the pre-delete signal, then drops the entry.
    ///
    /// The null id is never routed to the fallback here.
    pub fn remove(&mut self, id: UniqueId<K>) -> Result<T> {
        if !self.objects.contains_key(&id) {
            return Err(EngineError::not_found(K::NAME, id.get()));
        }

        self.pre_delete.emit(id);

        if self.fallback == Some(id) {
            log::warn!("Removing fallback {} {id}; null lookups will now fail", K::NAME);
            self.fallback = None;
        }

        self.objects
            .remove(&id)
            .ok_or_else(|| EngineError::not_found(K::NAME, id.get()))
    }

    /// Ids in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = UniqueId<K>> + '_ {
        self.objects.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UniqueId<K>, &T)> {
        self.objects.iter().map(|(id, obj)| (*id, obj))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (UniqueId<K>, &mut T)> {
        self.objects.iter_mut().map(|(id, obj)| (*id, obj))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Hooks run after every successful store, with the stored instance.
    pub fn post_create_signal(&mut self) -> &mut Signal<InstanceHook<T, UniqueId<K>>> {
        &mut self.post_create
    }

    /// Notifications fired right before an entry is dropped.
    pub fn pre_delete_signal(&mut self) -> &mut Signal<dyn FnMut(UniqueId<K>)> {
        &mut self.pre_delete
    }
}

impl<K: IdKind, T: Managed + 'static> Default for Manager<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IdKind, T> std::fmt::Debug for Manager<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("kind", &K::NAME)
            .field("len", &self.objects.len())
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}
