//! View declarations and owning groups.
//!
//! A view is declared by a tuple of tags, one per component type:
//!
//! - [`Owned<C>`]: the view's group takes exclusive ownership of `C`'s pool and keeps matching
//!   entities in a contiguous prefix of it
//! - [`Partial<C>`]: the entity must have a `C`, but `C`'s pool is left as is
//!
//! # Owning Groups
//!
//! A view with at least one owned tag materializes a [`Group`]. For every pool the group owns,
//! dense indices `[0, len)` hold exactly the entities whose signature covers every tagged
//! component, and an entity in the prefix sits at the same dense index in every owned pool:
//!
//! ```text
//!              prefix (len = 3)
//!            ┌─────────────────┐
//! Pool<A>    │ e4  │ e1  │ e9  │ e2  │ e7  │
//! Pool<B>    │ e4  │ e1  │ e9  │ e5  │
//!            └─────────────────┘
//! ```
//!
//! Iterating an owning view is a walk over the prefix with no per-entity checks. The prefix is
//! kept up to date incrementally: [`Group::promote`] and [`Group::demote`] are the only operations
//! that move the boundary, and the registry calls them from `add_component` and
//! `remove_component`.
//!
//! A view without owned tags does not create a group. It walks the smallest tagged pool and
//! filters by signature.

use std::{
    any::{self, TypeId as StdTypeId},
    fmt,
    marker::PhantomData,
};

use crate::{
    impl_for_tuples,
    ecs::{
        component::{self, Component, Signature, TypeRegistry},
        entity::Entity,
        error::{Error, fatal},
        storage::Pool,
    },
};

/// An owning group identifier, unique within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(u32);

impl Id {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Marks a view component as owned: the view's group repartitions its pool.
pub struct Owned<C: Component>(PhantomData<C>);

/// Marks a view component as required but not owned.
pub struct Partial<C: Component>(PhantomData<C>);

/// A single view tag.
pub trait Tag: 'static {
    type Component: Component;

    /// Whether the view's group owns the component's pool.
    const OWNED: bool;
}

impl<C: Component> Tag for Owned<C> {
    type Component = C;
    const OWNED: bool = true;
}

impl<C: Component> Tag for Partial<C> {
    type Component = C;
    const OWNED: bool = false;
}

/// A tag resolved against a type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagInfo {
    pub id: component::Id,
    pub owned: bool,
    pub type_id: StdTypeId,
    pub name: &'static str,
}

impl TagInfo {
    /// Resolve a tag, registering its component type if needed.
    pub fn of<T: Tag>(types: &TypeRegistry) -> Self {
        Self {
            id: types.register::<T::Component>(),
            owned: T::OWNED,
            type_id: StdTypeId::of::<T::Component>(),
            name: any::type_name::<T::Component>(),
        }
    }
}

/// A single tag or a tuple of tags declaring a view.
pub trait Tags: 'static {
    /// Append the tags in declaration order.
    fn collect(types: &TypeRegistry, tags: &mut Vec<TagInfo>);
}

impl<T: Tag> Tags for T {
    fn collect(types: &TypeRegistry, tags: &mut Vec<TagInfo>) {
        tags.push(TagInfo::of::<T>(types));
    }
}

macro_rules! tuple_tags {
    ($($name: ident),*) => {
        impl<$($name: Tags),*> Tags for ($($name,)*) {
            fn collect(types: &TypeRegistry, tags: &mut Vec<TagInfo>) {
                $(
                    <$name>::collect(types, tags);
                )*
            }
        }
    }
}

// Views take up to 12 tags.
impl_for_tuples!(tuple_tags);

/// Resolve the tags of a view declaration.
///
/// # Panics
/// Fatal if a component type is tagged more than once.
pub fn resolve<T: Tags>(types: &TypeRegistry) -> Vec<TagInfo> {
    let mut tags = Vec::new();
    T::collect(types, &mut tags);
    for (i, tag) in tags.iter().enumerate() {
        if tags[..i].iter().any(|other| other.id == tag.id) {
            fatal(Error::DuplicateTag {
                component: tag.name,
            });
        }
    }
    tags
}

/// An owning group: the partition state of the pools it owns.
#[derive(Debug)]
pub struct Group {
    id: Id,

    /// Number of entities in the owned prefix.
    len: usize,

    /// Components whose pools this group owns.
    owned: Signature,

    /// Components required but not owned.
    partial: Signature,

    /// `owned | partial`.
    affected: Signature,

    /// The owned component ids, ascending.
    owned_ids: Vec<component::Id>,
}

impl Group {
    /// Create an empty group over the given tags. Claiming the pools and filling the prefix is up
    /// to the caller.
    pub fn new(id: Id, tags: &[TagInfo]) -> Self {
        let owned = Signature::from_ids(tags.iter().filter(|tag| tag.owned).map(|tag| tag.id));
        let partial = Signature::from_ids(tags.iter().filter(|tag| !tag.owned).map(|tag| tag.id));
        debug_assert!(!owned.is_empty(), "an owning group needs an owned component");
        Self {
            id,
            len: 0,
            affected: owned.union(&partial),
            owned_ids: owned.ids().collect(),
            owned,
            partial,
        }
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn owned(&self) -> &Signature {
        &self.owned
    }

    #[inline]
    pub fn partial(&self) -> &Signature {
        &self.partial
    }

    #[inline]
    pub fn affected(&self) -> &Signature {
        &self.affected
    }

    #[inline]
    pub fn owned_ids(&self) -> &[component::Id] {
        &self.owned_ids
    }

    /// Determine if the signature has every owned component.
    #[inline]
    pub fn owns_signature(&self, signature: &Signature) -> bool {
        signature.is_superset(&self.owned)
    }

    /// Determine if the signature has every owned and partial component.
    #[inline]
    pub fn contains_signature(&self, signature: &Signature) -> bool {
        signature.is_superset(&self.affected)
    }

    /// Determine if this group was declared by exactly these tags, in any order.
    pub fn matches(&self, tags: &[TagInfo]) -> bool {
        let owned = Signature::from_ids(tags.iter().filter(|tag| tag.owned).map(|tag| tag.id));
        let partial = Signature::from_ids(tags.iter().filter(|tag| !tag.owned).map(|tag| tag.id));
        owned == self.owned && partial == self.partial
    }

    /// Determine if the entity sits inside the owned prefix.
    pub fn in_prefix(&self, pools: &[Option<Pool>], entity: Entity) -> bool {
        let pool = owned_pool(pools, self.owned_ids[0]);
        pool.index_of(entity).is_some_and(|index| index < self.len)
    }

    /// Move the entity to the end of the prefix in every owned pool and grow the prefix.
    ///
    /// The entity must have a value in every owned pool and sit outside the prefix.
    pub fn promote(&mut self, pools: &mut [Option<Pool>], entity: Entity) {
        debug_assert!(
            !self.in_prefix(pools, entity),
            "entity {entity} is already in {}",
            self.id
        );
        for id in &self.owned_ids {
            let pool = owned_pool_mut(pools, *id);
            let Some(index) = pool.index_of(entity) else {
                fatal(Error::Missing {
                    entity,
                    component: pool.manager().name(),
                })
            };
            pool.swap_dense(index, self.len);
        }
        self.len += 1;
        log::trace!("promoted {entity} into {} (len: {})", self.id, self.len);
    }

    /// Move the entity to the end of the prefix in every owned pool and shrink the prefix past it.
    ///
    /// The entity must sit inside the prefix.
    pub fn demote(&mut self, pools: &mut [Option<Pool>], entity: Entity) {
        debug_assert!(
            self.in_prefix(pools, entity),
            "entity {entity} is not in {}",
            self.id
        );
        let last = self.len - 1;
        for id in &self.owned_ids {
            let pool = owned_pool_mut(pools, *id);
            let Some(index) = pool.index_of(entity) else {
                fatal(Error::Missing {
                    entity,
                    component: pool.manager().name(),
                })
            };
            pool.swap_dense(index, last);
        }
        self.len = last;
        log::trace!("demoted {entity} from {} (len: {})", self.id, self.len);
    }
}

fn owned_pool(pools: &[Option<Pool>], id: component::Id) -> &Pool {
    match pools.get(id.index()).and_then(Option::as_ref) {
        Some(pool) => pool,
        None => unreachable!("owned pool {} was never created", id.index()),
    }
}

fn owned_pool_mut(pools: &mut [Option<Pool>], id: component::Id) -> &mut Pool {
    match pools.get_mut(id.index()).and_then(Option::as_mut) {
        Some(pool) => pool,
        None => unreachable!("owned pool {} was never created", id.index()),
    }
}

#[cfg(test)]
mod tests {
    use rusty_ecs_macros::Component;

    use crate::ecs::{component::Manager, storage::GrowthStrategy};

    use super::*;

    #[derive(Component, Debug, PartialEq)]
    struct A(u32);

    #[derive(Component, Debug, PartialEq)]
    struct B(u32);

    #[derive(Component, Debug, PartialEq)]
    struct C(u32);

    fn entity(id: u32) -> Entity {
        Entity::from_parts(id, 0)
    }

    fn pools_for(types: &TypeRegistry, tags: &[TagInfo]) -> Vec<Option<Pool>> {
        let mut pools: Vec<Option<Pool>> = (0..types.len()).map(|_| None).collect();
        for tag in tags {
            let manager: Manager = types.manager(tag.id).unwrap();
            pools[tag.id.index()] = Some(Pool::new(manager, 64, GrowthStrategy::Multiply(2)));
        }
        pools
    }

    #[test]
    fn resolve_tags_in_order() {
        // Given
        let types = TypeRegistry::new();

        // When
        let tags = resolve::<(Owned<A>, Partial<B>, Owned<C>)>(&types);

        // Then
        assert_eq!(tags.len(), 3);
        assert!(tags[0].owned && !tags[1].owned && tags[2].owned);
        assert_eq!(tags[1].id, types.get::<B>().unwrap());
        assert_eq!(tags[2].type_id, StdTypeId::of::<C>());
    }

    #[test]
    fn resolve_single_tag() {
        // Given
        let types = TypeRegistry::new();

        // When
        let tags = resolve::<Partial<A>>(&types);

        // Then
        assert_eq!(tags.len(), 1);
        assert!(!tags[0].owned);
    }

    #[test]
    #[should_panic(expected = "appears more than once")]
    fn duplicate_tags_are_fatal() {
        let types = TypeRegistry::new();
        resolve::<(Owned<A>, Partial<A>)>(&types);
    }

    #[test]
    fn signature_checks() {
        // Given
        let types = TypeRegistry::new();
        let tags = resolve::<(Owned<A>, Partial<B>)>(&types);
        let group = Group::new(Id::new(0), &tags);
        let a = Signature::from_ids([tags[0].id]);
        let ab = Signature::from_ids([tags[0].id, tags[1].id]);

        // Then
        assert!(group.owns_signature(&a));
        assert!(!group.contains_signature(&a));
        assert!(group.owns_signature(&ab));
        assert!(group.contains_signature(&ab));
        assert_eq!(group.owned_ids(), &[tags[0].id]);
        assert_eq!(group.affected().len(), 2);
    }

    #[test]
    fn matches_ignores_order() {
        // Given
        let types = TypeRegistry::new();
        let tags = resolve::<(Owned<A>, Owned<B>, Partial<C>)>(&types);
        let group = Group::new(Id::new(0), &tags);

        // Then
        assert!(group.matches(&resolve::<(Partial<C>, Owned<B>, Owned<A>)>(&types)));
        assert!(!group.matches(&resolve::<(Owned<A>, Owned<B>)>(&types)));
        assert!(!group.matches(&resolve::<(Owned<A>, Partial<B>, Partial<C>)>(&types)));
    }

    #[test]
    fn promote_aligns_owned_pools() {
        // Given
        let types = TypeRegistry::new();
        let tags = resolve::<(Owned<A>, Owned<B>)>(&types);
        let mut pools = pools_for(&types, &tags);
        let mut group = Group::new(Id::new(0), &tags);
        for id in 0..4 {
            pools[tags[0].id.index()].as_mut().unwrap().push(entity(id), A(id));
        }
        for id in [3, 2] {
            pools[tags[1].id.index()].as_mut().unwrap().push(entity(id), B(id));
        }

        // When
        group.promote(&mut pools, entity(2));
        group.promote(&mut pools, entity(3));

        // Then - Both entities lead both pools in the same order
        assert_eq!(group.len(), 2);
        for tag in &tags {
            let pool = pools[tag.id.index()].as_ref().unwrap();
            assert_eq!(&pool.entities()[..2], &[entity(2), entity(3)]);
        }
        assert!(group.in_prefix(&pools, entity(3)));
        assert!(!group.in_prefix(&pools, entity(0)));
        assert_eq!(
            pools[tags[0].id.index()].as_ref().unwrap().get::<A>(entity(2)),
            &A(2)
        );
    }

    #[test]
    fn demote_shrinks_prefix() {
        // Given
        let types = TypeRegistry::new();
        let tags = resolve::<(Owned<A>, Owned<B>)>(&types);
        let mut pools = pools_for(&types, &tags);
        let mut group = Group::new(Id::new(0), &tags);
        for id in 0..3 {
            pools[tags[0].id.index()].as_mut().unwrap().push(entity(id), A(id));
            pools[tags[1].id.index()].as_mut().unwrap().push(entity(id), B(id));
            group.promote(&mut pools, entity(id));
        }

        // When
        group.demote(&mut pools, entity(0));

        // Then
        assert_eq!(group.len(), 2);
        assert!(!group.in_prefix(&pools, entity(0)));
        for tag in &tags {
            let pool = pools[tag.id.index()].as_ref().unwrap();
            assert_eq!(pool.entities()[2], entity(0));
            assert!(!pool.entities()[..2].contains(&entity(0)));
        }
    }
}
