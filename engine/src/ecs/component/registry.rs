use std::{
    any::TypeId as StdTypeId,
    sync::{
        PoisonError, RwLock,
        atomic::{AtomicU32, Ordering},
    },
};

use dashmap::DashMap;

use crate::ecs::{
    component::{Component, Id, MAX_COMPONENTS, Manager},
    error::{Error, fatal},
};

/// A thread-safe component type registry. Assigns every component type a small [`Id`] on first
/// registration and keeps the type's [`Manager`].
///
/// Lookups from Rust `TypeId` to component id are lock-free reads through `DashMap`.
/// Registration only locks a single map shard and the manager list.
///
/// Why thread-safe?
/// - Registries are single-threaded, but several may live in different threads and share one
///   type registry through an `Arc`, in which case they all need to agree on component ids.
pub struct TypeRegistry {
    /// Map from TypeId to component Id.
    type_map: DashMap<StdTypeId, Id>,

    /// Managers indexed by component id. Protected by RwLock for rare writes.
    managers: RwLock<Vec<Option<Manager>>>,

    /// Next available component identifier.
    next_id: AtomicU32,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    #[inline]
    pub fn new() -> Self {
        Self {
            type_map: DashMap::new(),
            managers: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(0),
        }
    }

    /// Register a component type and get its id.
    ///
    /// Idempotent: registering a type again returns the id it was first given. Registering more
    /// than [`MAX_COMPONENTS`] distinct types is fatal.
    pub fn register<C: Component>(&self) -> Id {
        let type_id = StdTypeId::of::<C>();

        // Fast path: already registered
        if let Some(id) = self.type_map.get(&type_id) {
            return *id;
        }

        // The entry API keeps two threads that both miss the fast path from minting two ids.
        *self
            .type_map
            .entry(type_id)
            .or_insert_with(|| {
                let value = self.next_id.fetch_add(1, Ordering::Relaxed);
                if value as usize >= MAX_COMPONENTS {
                    fatal(Error::TooManyComponents {
                        limit: MAX_COMPONENTS,
                    });
                }
                let id = Id::new(value);

                let mut managers = self
                    .managers
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                let index = id.index();
                if index >= managers.len() {
                    managers.resize(index + 1, None);
                }
                managers[index] = Some(Manager::new::<C>(id));

                log::debug!("registered component {} as {}", std::any::type_name::<C>(), value);
                id
            })
            .value()
    }

    /// Get the id of component type `C`, if registered.
    #[inline]
    pub fn get<C: Component>(&self) -> Option<Id> {
        self.type_map
            .get(&StdTypeId::of::<C>())
            .map(|entry| *entry.value())
    }

    /// Get the manager of a registered component id.
    #[inline]
    pub fn manager(&self, id: Id) -> Option<Manager> {
        let managers = self.managers.read().unwrap_or_else(PoisonError::into_inner);
        managers.get(id.index()).and_then(|manager| *manager)
    }

    /// The number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.type_map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.type_map.is_empty()
    }
}
