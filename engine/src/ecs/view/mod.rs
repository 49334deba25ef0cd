//! Iteration over the entities holding a fixed combination of components.
//!
//! A [`View`] is created by [`Registry::create_view`] from a tuple of [`Owned`](crate::ecs::Owned)
//! and [`Partial`](crate::ecs::Partial) tags. Iteration is forward-only and single-pass: call
//! `create_view` again for a fresh snapshot.
//!
//! - **Owning views** walk the owned prefix of their group. Every entity visited matches, and
//!   owned components are read straight from the visited dense index.
//! - **Filtered views** (no owned tags) walk the smallest tagged pool and skip entities whose
//!   signature lacks a tagged component.
//!
//! ```rust,ignore
//! let view = registry.create_view::<(Owned<Position>, Partial<Velocity>)>();
//! for element in &view {
//!     let position = element.get::<Position>();
//!     let velocity = element.get::<Velocity>();
//! }
//! ```
//!
//! # Structural Changes
//!
//! A view holds the registry's exclusive borrow, so adding or removing components or entities
//! while a view is alive does not compile. Swap-pop removal and group repartitioning move dense
//! slots, so an iterator surviving such a change would skip or repeat entities.
//!
//! ```compile_fail
//! use rusty_ecs::ecs::{Owned, Registry};
//!
//! let mut registry = Registry::new();
//! let entity = registry.create();
//! registry.add_component(entity, 1i32);
//!
//! let view = registry.create_view::<Owned<i32>>();
//! for element in &view {
//!     registry.remove_component::<i32>(element.entity());
//! }
//! ```
//!
//! Values can still be changed in place through [`View::for_each_mut`].

use std::marker::PhantomData;

use crate::ecs::{
    component::{self, Component, Signature},
    entity::Entity,
    error::{Error, fatal},
    group::{self, Tags},
    registry::Registry,
    storage::{Ownership, Pool},
};

/// A view over the entities matching a tag tuple `T`.
pub struct View<'r, T: Tags> {
    registry: &'r mut Registry,

    /// The pool whose entity list is walked.
    source: component::Id,

    /// Number of source slots to walk: the group length, or the source pool length.
    len: usize,

    /// The owning group, for owning views.
    group: Option<group::Id>,

    /// Required signature, checked per entity by filtered views.
    filter: Signature,

    _tags: PhantomData<fn() -> T>,
}

impl<'r, T: Tags> View<'r, T> {
    /// A view over an owning group's prefix.
    pub(crate) fn owning(registry: &'r mut Registry, id: group::Id) -> Self {
        let (source, len, filter) = match registry.group(id) {
            Some(group) => (group.owned_ids()[0], group.len(), group.affected().clone()),
            None => unreachable!("{id} does not exist"),
        };
        Self {
            registry,
            source,
            len,
            group: Some(id),
            filter,
            _tags: PhantomData,
        }
    }

    /// A view walking a whole pool and filtering by signature.
    pub(crate) fn filtered(
        registry: &'r mut Registry,
        source: component::Id,
        filter: Signature,
    ) -> Self {
        let len = registry.pool_by_id(source).map_or(0, Pool::len);
        Self {
            registry,
            source,
            len,
            group: None,
            filter,
            _tags: PhantomData,
        }
    }

    /// Determine if this view is backed by an owning group.
    #[inline]
    pub fn is_owning(&self) -> bool {
        self.group.is_some()
    }

    /// The number of entities an owning view yields, or an upper bound for a filtered view.
    #[inline]
    pub fn len_hint(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn iter(&self) -> ViewIter<'_> {
        ViewIter::new(&*self.registry, self.source, self.len, self.group, &self.filter)
    }

    /// The matching entities, in iteration order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.iter().map(|element| element.entity())
    }

    /// Visit every matching entity with mutable access to its components.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(ViewElementMut<'_>),
    {
        for index in 0..self.len {
            let entity = match self.registry.pool_by_id(self.source) {
                Some(pool) => pool.entities()[index],
                None => return,
            };
            if self.group.is_none() && !self.registry.signature(entity).is_superset(&self.filter) {
                continue;
            }
            f(ViewElementMut {
                registry: &mut *self.registry,
                entity,
                index,
                group: self.group,
            });
        }
    }
}

impl<'v, 'r, T: Tags> IntoIterator for &'v View<'r, T> {
    type Item = ViewElement<'v>;
    type IntoIter = ViewIter<'v>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'r, T: Tags> IntoIterator for View<'r, T> {
    type Item = ViewElement<'r>;
    type IntoIter = ViewIter<'r>;

    fn into_iter(self) -> Self::IntoIter {
        let registry: &'r Registry = self.registry;
        ViewIter::new(registry, self.source, self.len, self.group, &self.filter)
    }
}

/// A forward-only iterator over a view's matching entities.
pub struct ViewIter<'a> {
    registry: &'a Registry,
    entities: &'a [Entity],
    index: usize,
    group: Option<group::Id>,

    /// Only set for filtered views.
    filter: Option<Signature>,
}

impl<'a> ViewIter<'a> {
    fn new(
        registry: &'a Registry,
        source: component::Id,
        len: usize,
        group: Option<group::Id>,
        filter: &Signature,
    ) -> Self {
        let entities = registry
            .pool_by_id(source)
            .map_or(&[][..], |pool| &pool.entities()[..len]);
        Self {
            registry,
            entities,
            index: 0,
            group,
            filter: group.is_none().then(|| filter.clone()),
        }
    }
}

impl<'a> Iterator for ViewIter<'a> {
    type Item = ViewElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(entity) = self.entities.get(self.index).copied() {
            let index = self.index;
            self.index += 1;
            if let Some(filter) = &self.filter {
                if !self.registry.signature(entity).is_superset(filter) {
                    continue;
                }
            }
            return Some(ViewElement {
                registry: self.registry,
                entity,
                index,
                group: self.group,
            });
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entities.len() - self.index;
        if self.filter.is_some() {
            (0, Some(remaining))
        } else {
            (remaining, Some(remaining))
        }
    }
}

/// The current entity of a view and read access to its components.
#[derive(Clone, Copy)]
pub struct ViewElement<'a> {
    registry: &'a Registry,
    entity: Entity,

    /// Dense index of the entity in the view's source pool.
    index: usize,
    group: Option<group::Id>,
}

impl<'a> ViewElement<'a> {
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Get a component of the current entity.
    ///
    /// Components owned by the view's group are read at the current dense index. Anything else
    /// is looked up through the registry after checking the entity's signature.
    ///
    /// # Panics
    /// Fatal if the entity has no `C`.
    pub fn get<C: Component>(&self) -> &'a C {
        let Some(id) = self.registry.component_id::<C>() else {
            missing::<C>(self.entity)
        };
        let Some(pool) = self.registry.pool_by_id(id) else {
            missing::<C>(self.entity)
        };
        if is_owned_by(pool, self.group) {
            return pool.get_at(self.index);
        }
        if !self.registry.signature(self.entity).contains(id) {
            missing::<C>(self.entity)
        }
        pool.get(self.entity)
    }
}

/// The current entity of a view with mutable access to its components.
pub struct ViewElementMut<'a> {
    registry: &'a mut Registry,
    entity: Entity,
    index: usize,
    group: Option<group::Id>,
}

impl ViewElementMut<'_> {
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Get a component of the current entity.
    ///
    /// # Panics
    /// Fatal if the entity has no `C`.
    pub fn get<C: Component>(&self) -> &C {
        ViewElement {
            registry: &*self.registry,
            entity: self.entity,
            index: self.index,
            group: self.group,
        }
        .get()
    }

    /// Get a component of the current entity mutably.
    ///
    /// # Panics
    /// Fatal if the entity has no `C`.
    pub fn get_mut<C: Component>(&mut self) -> &mut C {
        let Some(id) = self.registry.component_id::<C>() else {
            missing::<C>(self.entity)
        };
        if !self.registry.signature(self.entity).contains(id) {
            missing::<C>(self.entity)
        }
        let Some(pool) = self.registry.pool_by_id_mut(id) else {
            missing::<C>(self.entity)
        };
        if is_owned_by(pool, self.group) {
            return pool.get_at_mut(self.index);
        }
        pool.get_mut(self.entity)
    }
}

#[inline]
fn is_owned_by(pool: &Pool, group: Option<group::Id>) -> bool {
    matches!((pool.owner(), group), (Ownership::Owned(owner), Some(group)) if owner == group)
}

#[cold]
#[track_caller]
fn missing<C: Component>(entity: Entity) -> ! {
    fatal(Error::Missing {
        entity,
        component: std::any::type_name::<C>(),
    })
}
