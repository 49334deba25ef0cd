//! The Registry is the central container for entities, component pools and owning groups.
//!
//! # Architecture
//!
//! The Registry coordinates several subsystems:
//! - **Entity Allocator**: hands out entity identifiers and recycles freed ones
//! - **Type Registry**: maps component types to small ids, possibly shared with other registries
//! - **Pools**: one sparse set per component id, created on first use
//! - **Signatures**: a paged table recording which components each entity has
//! - **Groups**: owning groups created by views, kept in step on every add and remove
//!
//! # Example
//!
//! ```ignore
//! use rusty_ecs::ecs::Registry;
//!
//! let mut registry = Registry::new();
//!
//! let entity = registry.create();
//! registry.add_component(entity, 5i32);
//! assert_eq!(*registry.get_component::<i32>(entity), 5);
//!
//! registry.remove_component::<i32>(entity);
//! registry.free(entity);
//! ```
//!
//! # Misuse
//!
//! Every contract violation (adding a component twice, removing or reading one that is absent,
//! touching a freed entity, claiming an owned pool twice) is logged at error level and panics.
//! None of the operations return a recoverable error.

use std::{any, marker::PhantomData, sync::Arc};

use crate::ecs::{
    component::{self, Component, Signature, TypeRegistry},
    config::Config,
    entity::{self, Entity},
    error::{Error, fatal},
    group::{self, Group, TagInfo, Tags},
    storage::{Ownership, PagedArray, Pool},
    view::View,
};

/// Owns every entity, component and group of one simulation.
pub struct Registry {
    /// Tuning knobs for pools and tables created by this registry.
    config: Config,

    /// Component type ids, possibly shared with other registries.
    types: Arc<TypeRegistry>,

    /// Pools indexed by component id. `None` until the type is first used.
    pools: Vec<Option<Pool>>,

    /// The component signature of every entity identifier.
    signatures: PagedArray<Signature>,

    /// The registry's entity allocator.
    allocator: entity::Allocator,

    /// Owning groups indexed by group id. Destroyed groups leave a `None`.
    groups: Vec<Option<Group>>,

    /// Marker to make Registry !Send. A registry belongs to one simulation thread.
    _not_send: PhantomData<*mut ()>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_type_registry(Arc::new(TypeRegistry::new()), config)
    }

    /// Create a registry sharing component ids with other registries.
    pub fn with_type_registry(types: Arc<TypeRegistry>, config: Config) -> Self {
        Self {
            signatures: PagedArray::with_page_size(Signature::new(), config.signature_page_size),
            allocator: entity::Allocator::new(config.recycle),
            config,
            types,
            pools: Vec::new(),
            groups: Vec::new(),
            _not_send: PhantomData,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Create a new entity with no components.
    pub fn create(&mut self) -> Entity {
        let entity = self.allocator.alloc();
        debug_assert!(
            self.signatures.get(entity.index()).is_empty(),
            "recycled entity {entity} kept a signature"
        );
        log::trace!("created {entity}");
        entity
    }

    /// Remove every component of the entity and recycle its identifier.
    ///
    /// # Panics
    /// Fatal if the entity is not alive.
    pub fn free(&mut self, entity: Entity) {
        self.ensure_alive(entity);
        let ids: Vec<component::Id> = self.signatures.get(entity.index()).ids().collect();
        for id in ids {
            self.remove_by_id(entity, id);
        }
        self.allocator.free(entity);
        log::trace!("freed {entity}");
    }

    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// The number of alive entities.
    #[inline]
    pub fn alive_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Register a component type and create its pool.
    ///
    /// Registration is optional: [`Registry::add_component`] creates pools on first use.
    ///
    /// # Panics
    /// Fatal if the type is already registered with this registry.
    pub fn register_component<C: Component>(&mut self) -> component::Id {
        let id = self.types.register::<C>();
        if self.pool_by_id(id).is_some() {
            fatal(Error::AlreadyRegistered {
                component: any::type_name::<C>(),
            });
        }
        self.ensure_pool(id);
        id
    }

    /// The id of a component type, if any registry sharing this one's types registered it.
    #[inline]
    pub fn component_id<C: Component>(&self) -> Option<component::Id> {
        self.types.get::<C>()
    }

    /// Attach a component to the entity, promoting it into every owning group it now satisfies.
    ///
    /// # Panics
    /// - Fatal if the entity is not alive.
    /// - Fatal if the entity already has a `C`.
    pub fn add_component<C: Component>(&mut self, entity: Entity, value: C) {
        self.ensure_alive(entity);
        let id = self.types.register::<C>();
        self.ensure_pool(id).push(entity, value);
        self.signatures.index(entity.index()).insert(id);

        let Self {
            pools,
            signatures,
            groups,
            ..
        } = self;
        let signature = signatures.get(entity.index());
        for group in groups.iter_mut().flatten() {
            // Check against the full signature so a group whose partial component just arrived
            // is caught too.
            if group.affected().contains(id) && group.contains_signature(signature) {
                group.promote(&mut pools[..], entity);
            }
        }
    }

    /// Detach a component from the entity, demoting it from every owning group first.
    ///
    /// # Panics
    /// - Fatal if the entity is not alive.
    /// - Fatal if the entity has no `C`.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) {
        self.ensure_alive(entity);
        let Some(id) = self.types.get::<C>() else {
            fatal(Error::Missing {
                entity,
                component: any::type_name::<C>(),
            })
        };
        self.remove_by_id(entity, id);
    }

    /// Detach a component by id.
    ///
    /// # Panics
    /// - Fatal if the entity is not alive.
    /// - Fatal if the entity has no component with this id.
    pub fn remove_component_by_id(&mut self, entity: Entity, id: component::Id) {
        self.ensure_alive(entity);
        self.remove_by_id(entity, id);
    }

    /// Get the entity's component.
    ///
    /// # Panics
    /// - Fatal if the entity is not alive.
    /// - Fatal if the entity has no `C`.
    pub fn get_component<C: Component>(&self, entity: Entity) -> &C {
        self.ensure_alive(entity);
        match self.pool::<C>() {
            Some(pool) => pool.get(entity),
            None => missing::<C>(entity),
        }
    }

    /// Get the entity's component mutably.
    ///
    /// # Panics
    /// - Fatal if the entity is not alive.
    /// - Fatal if the entity has no `C`.
    pub fn get_component_mut<C: Component>(&mut self, entity: Entity) -> &mut C {
        self.ensure_alive(entity);
        let pool = self
            .types
            .get::<C>()
            .and_then(|id| self.pools.get_mut(id.index()))
            .and_then(Option::as_mut);
        match pool {
            Some(pool) => pool.get_mut(entity),
            None => missing::<C>(entity),
        }
    }

    /// Determine if the entity is alive and has a `C`.
    pub fn contains<C: Component>(&self, entity: Entity) -> bool {
        self.is_alive(entity)
            && self
                .types
                .get::<C>()
                .is_some_and(|id| self.signatures.get(entity.index()).contains(id))
    }

    /// The entity's component signature. Entities that are not alive have an empty signature.
    #[inline]
    pub fn signature(&self, entity: Entity) -> &Signature {
        if self.is_alive(entity) {
            self.signatures.get(entity.index())
        } else {
            self.signatures.default_value()
        }
    }

    /// The pool for `C`, if one was created.
    #[inline]
    pub fn pool<C: Component>(&self) -> Option<&Pool> {
        self.types.get::<C>().and_then(|id| self.pool_by_id(id))
    }

    #[inline]
    pub(crate) fn pool_by_id(&self, id: component::Id) -> Option<&Pool> {
        self.pools.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub(crate) fn pool_by_id_mut(&mut self, id: component::Id) -> Option<&mut Pool> {
        self.pools.get_mut(id.index()).and_then(Option::as_mut)
    }

    #[inline]
    pub(crate) fn group(&self, id: group::Id) -> Option<&Group> {
        self.groups.get(id.index()).and_then(Option::as_ref)
    }

    /// Create a view over the entities having every tagged component.
    ///
    /// A view with at least one [`Owned`](crate::ecs::Owned) tag is backed by an owning group.
    /// The group is created on the first call, claiming the owned pools and moving every matching
    /// entity into their prefix, and reused by later calls with the same tags.
    ///
    /// # Panics
    /// - Fatal if a component is tagged more than once.
    /// - Fatal if an owned pool is already owned by a group with different tags.
    pub fn create_view<T: Tags>(&mut self) -> View<'_, T> {
        let tags = group::resolve::<T>(&self.types);
        for tag in &tags {
            self.ensure_pool(tag.id);
        }

        if tags.iter().any(|tag| tag.owned) {
            let group = self.ensure_group(&tags);
            View::owning(self, group)
        } else {
            let filter = Signature::from_ids(tags.iter().map(|tag| tag.id));
            let source = self.smallest_pool(&tags);
            View::filtered(self, source, filter)
        }
    }

    /// Release the owning group created for these tags, leaving dense order as it is.
    ///
    /// Returns `false` if no owning group matches the tags.
    pub fn destroy_view<T: Tags>(&mut self) -> bool {
        let tags = group::resolve::<T>(&self.types);
        let Some(slot) = self
            .groups
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|group| group.matches(&tags)))
        else {
            return false;
        };
        let Some(group) = slot.take() else {
            return false;
        };
        for id in group.owned_ids() {
            if let Some(pool) = self.pools.get_mut(id.index()).and_then(Option::as_mut) {
                pool.set_owner(Ownership::Unowned);
            }
        }
        log::debug!("destroyed {} ({} entities)", group.id(), group.len());
        true
    }

    /// The size of the owning group created for these tags, if there is one.
    pub fn group_len<T: Tags>(&self) -> Option<usize> {
        let tags = group::resolve::<T>(&self.types);
        self.groups
            .iter()
            .flatten()
            .find(|group| group.matches(&tags))
            .map(Group::len)
    }

    /// Find or create the owning group for the tags.
    fn ensure_group(&mut self, tags: &[TagInfo]) -> group::Id {
        if let Some(group) = self.groups.iter().flatten().find(|group| group.matches(tags)) {
            return group.id();
        }

        // At most one owner per pool.
        for tag in tags.iter().filter(|tag| tag.owned) {
            if self
                .pool_by_id(tag.id)
                .is_some_and(|pool| pool.owner() != Ownership::Unowned)
            {
                fatal(Error::PoolAlreadyOwned {
                    component: tag.name,
                });
            }
        }

        let id = group::Id::new(self.groups.len() as u32);
        let mut group = Group::new(id, tags);
        for tag in tags.iter().filter(|tag| tag.owned) {
            self.ensure_pool(tag.id).set_owner(Ownership::Owned(id));
        }

        let source = self.smallest_pool(tags);
        let candidates = self
            .pool_by_id(source)
            .map(|pool| pool.entities().to_vec())
            .unwrap_or_default();
        for entity in candidates {
            if group.contains_signature(self.signatures.get(entity.index())) {
                group.promote(&mut self.pools, entity);
            }
        }

        log::debug!("created {id} with {} entities", group.len());
        self.groups.push(Some(group));
        id
    }

    /// The tagged pool with the fewest values.
    fn smallest_pool(&self, tags: &[TagInfo]) -> component::Id {
        tags.iter()
            .map(|tag| tag.id)
            .min_by_key(|id| self.pool_by_id(*id).map_or(0, Pool::len))
            .unwrap_or_default()
    }

    /// Get the pool for a component id, creating it on first use.
    fn ensure_pool(&mut self, id: component::Id) -> &mut Pool {
        let index = id.index();
        if index >= self.pools.len() {
            self.pools.resize_with(index + 1, || None);
        }
        let types = &self.types;
        let config = &self.config;
        self.pools[index].get_or_insert_with(|| {
            let Some(manager) = types.manager(id) else {
                unreachable!("component {} has an id but no manager", index)
            };
            log::debug!("created pool for {} ({})", manager.name(), index);
            Pool::new(manager, config.sparse_page_size, config.growth.clone())
        })
    }

    fn remove_by_id(&mut self, entity: Entity, id: component::Id) {
        let Self {
            types,
            pools,
            signatures,
            groups,
            ..
        } = self;
        let signature = signatures.get(entity.index());
        if !signature.contains(id) {
            fatal(Error::Missing {
                entity,
                component: types.manager(id).map_or("<unregistered>", |m| m.name()),
            });
        }

        // Leave every prefix holding the entity before the pool swap-pops it.
        for group in groups.iter_mut().flatten() {
            if group.affected().contains(id) && group.contains_signature(signature) {
                group.demote(&mut pools[..], entity);
            }
        }

        // Clear the bit first so a panicking destructor leaves the signature and pool agreeing.
        signatures.index(entity.index()).remove(id);
        match pools.get_mut(id.index()).and_then(Option::as_mut) {
            Some(pool) => pool.free(entity),
            None => unreachable!("entity {entity} has component {} but no pool", id.index()),
        }
    }

    #[inline]
    fn ensure_alive(&self, entity: Entity) {
        if !self.is_alive(entity) {
            fatal(Error::DeadEntity { entity });
        }
    }
}

#[cold]
#[track_caller]
fn missing<C: Component>(entity: Entity) -> ! {
    fatal(Error::Missing {
        entity,
        component: any::type_name::<C>(),
    })
}
