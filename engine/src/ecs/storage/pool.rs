use std::any;

use crate::ecs::{
    component::{Component, Manager},
    entity::Entity,
    error::{Error, fatal},
    group,
    storage::{GrowthStrategy, IndexedMemory, PagedArray},
};

/// Sparse slot value for identifiers with no component in the pool.
pub const DEAD: u32 = u32::MAX;

/// Which group, if any, is allowed to reorder a pool's dense prefix.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    #[default]
    Unowned,
    Owned(group::Id),
}

/// A sparse set holding every instance of one component type.
///
/// ```text
///  sparse (paged, by entity id)        dense (packed)        entities
/// ┌─────┬─────┬─────┬─────┬─────┐     ┌─────┬─────┬─────┐   ┌─────┬─────┬─────┐
/// │DEAD │  2  │DEAD │  0  │  1  │ ──> │ c3  │ c4  │ c1  │   │ e3  │ e4  │ e1  │
/// └─────┴─────┴─────┴─────┴─────┘     └─────┴─────┴─────┘   └─────┴─────┴─────┘
/// ```
///
/// The dense buffer holds exactly `len()` live values with no gaps: removal swaps the last value
/// into the hole. For every dense index `i < len()`, `sparse[entities[i].id] == i`, and every other
/// sparse slot is [`DEAD`].
///
/// Values are stored type-erased and handled through the component's [`Manager`]. Typed
/// accessors check the requested type against the manager before touching memory.
pub struct Pool {
    /// Entity id to dense index.
    sparse: PagedArray<u32>,

    /// Packed component values, `entities.len()` of them initialized.
    dense: IndexedMemory,

    /// Dense index to owning entity.
    entities: Vec<Entity>,

    /// Type-erased operations for the stored type.
    manager: Manager,

    /// How `dense` grows when full.
    growth: GrowthStrategy,

    /// The owning group, if any.
    ownership: Ownership,
}

impl Pool {
    /// Create an empty pool for the manager's component type.
    pub fn new(manager: Manager, sparse_page_size: usize, growth: GrowthStrategy) -> Self {
        Self {
            sparse: PagedArray::with_page_size(DEAD, sparse_page_size),
            dense: IndexedMemory::new(manager.layout()),
            entities: Vec::new(),
            manager,
            growth,
            ownership: Ownership::Unowned,
        }
    }

    #[inline]
    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.dense.capacity()
    }

    /// The entities with a value in this pool, in dense order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[inline]
    pub fn owner(&self) -> Ownership {
        self.ownership
    }

    #[inline]
    pub(crate) fn set_owner(&mut self, ownership: Ownership) {
        self.ownership = ownership;
    }

    /// Get the dense index of the entity's value, if it has one.
    #[inline]
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        let index = *self.sparse.get(entity.index());
        if index == DEAD {
            return None;
        }
        let index = index as usize;
        // A recycled id under a bumped version is a different entity.
        (self.entities[index] == entity).then_some(index)
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.index_of(entity).is_some()
    }

    /// Add a value for the entity.
    ///
    /// # Panics
    /// - Fatal if the entity already has a value in this pool.
    /// - Fatal if `C` is not this pool's component type.
    pub fn push<C: Component>(&mut self, entity: Entity, value: C) {
        self.ensure_type::<C>();
        if self.contains(entity) {
            fatal(Error::AlreadyHas {
                entity,
                component: self.manager.name(),
            });
        }

        self.reserve(1);
        let index = self.len();
        // SAFETY: reserve guarantees index < capacity, the slot is uninitialized and C matches
        // the element layout.
        unsafe {
            (self.dense.slot(index).as_ptr() as *mut C).write(value);
        }
        *self.sparse.index(entity.index()) = index as u32;
        self.entities.push(entity);
    }

    /// Get the entity's value.
    ///
    /// # Panics
    /// Fatal if the entity has no value in this pool.
    pub fn get<C: Component>(&self, entity: Entity) -> &C {
        match self.index_of(entity) {
            Some(index) => self.get_at(index),
            None => self.missing(entity),
        }
    }

    /// Get the entity's value mutably.
    ///
    /// # Panics
    /// Fatal if the entity has no value in this pool.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> &mut C {
        match self.index_of(entity) {
            Some(index) => self.get_at_mut(index),
            None => self.missing(entity),
        }
    }

    /// Get the value at a dense index.
    ///
    /// # Panics
    /// Panics if `index >= len()`, fatal if `C` is not this pool's component type.
    #[inline]
    pub fn get_at<C: Component>(&self, index: usize) -> &C {
        self.ensure_type::<C>();
        self.check_index(index);
        // SAFETY: index < len so the slot is initialized, and the type was checked.
        unsafe { &*(self.dense.slot(index).as_ptr() as *const C) }
    }

    /// Get the value at a dense index mutably.
    ///
    /// # Panics
    /// Panics if `index >= len()`, fatal if `C` is not this pool's component type.
    #[inline]
    pub fn get_at_mut<C: Component>(&mut self, index: usize) -> &mut C {
        self.ensure_type::<C>();
        self.check_index(index);
        // SAFETY: index < len so the slot is initialized, and the type was checked.
        unsafe { &mut *(self.dense.slot(index).as_ptr() as *mut C) }
    }

    /// All values in dense order.
    pub fn values<C: Component>(&self) -> &[C] {
        self.ensure_type::<C>();
        // SAFETY: the first len slots are initialized values of C, and the pointer is aligned
        // even when nothing is allocated.
        unsafe { std::slice::from_raw_parts(self.dense.base().as_ptr() as *const C, self.len()) }
    }

    /// All values in dense order, mutably.
    pub fn values_mut<C: Component>(&mut self) -> &mut [C] {
        self.ensure_type::<C>();
        // SAFETY: as in `values`, and we hold the pool exclusively.
        unsafe {
            std::slice::from_raw_parts_mut(self.dense.base().as_ptr() as *mut C, self.len())
        }
    }

    /// Exchange the dense slots of two entities: values, entity records and sparse pointers.
    ///
    /// # Panics
    /// Fatal if either entity has no value in this pool.
    pub fn swap(&mut self, a: Entity, b: Entity) {
        let Some(i) = self.index_of(a) else {
            self.missing(a)
        };
        let Some(j) = self.index_of(b) else {
            self.missing(b)
        };
        self.swap_dense(i, j);
    }

    /// Exchange two dense slots, keeping the sparse side in step.
    pub fn swap_dense(&mut self, i: usize, j: usize) {
        self.check_index(i);
        self.check_index(j);
        if i == j {
            return;
        }
        // SAFETY: both slots are initialized values of the manager's type.
        unsafe {
            self.manager
                .swap(self.dense.slot(i), self.dense.slot(j));
        }
        self.entities.swap(i, j);
        *self.sparse.index(self.entities[i].index()) = i as u32;
        *self.sparse.index(self.entities[j].index()) = j as u32;
    }

    /// Drop the entity's value and fill its slot with the last value.
    ///
    /// # Panics
    /// Fatal if the entity has no value in this pool.
    pub fn free(&mut self, entity: Entity) {
        let Some(index) = self.index_of(entity) else {
            self.missing(entity)
        };
        let last = self.len() - 1;
        self.swap_dense(index, last);

        // Unlink before dropping so a panicking destructor cannot lead to a second drop.
        self.entities.pop();
        *self.sparse.index(entity.index()) = DEAD;
        // SAFETY: the slot at `last` is initialized and now outside the live range.
        unsafe {
            self.manager.drop_many(self.dense.slot(last), 1);
        }
    }

    /// Drop every value, keeping the allocated capacity.
    pub fn clear(&mut self) {
        let len = self.len();
        for entity in self.entities.drain(..) {
            *self.sparse.index(entity.index()) = DEAD;
        }
        if len > 0 {
            // SAFETY: the first len slots were initialized and are no longer tracked.
            unsafe {
                self.manager.drop_many(self.dense.base(), len);
            }
        }
    }

    /// Make room for `additional` more values, relocating live values if the buffer moves.
    pub fn reserve(&mut self, additional: usize) {
        let required = self.len() + additional;
        if required <= self.dense.capacity() {
            return;
        }

        let capacity = self.growth.next_capacity(self.dense.capacity(), required);
        let dense = IndexedMemory::with_capacity(self.manager.layout(), capacity);
        if !self.is_empty() {
            // SAFETY: the old block holds len initialized values, the new block has room for
            // them and the two allocations are distinct.
            unsafe {
                self.manager
                    .move_many(self.dense.base(), dense.base(), self.len());
            }
        }
        // The old block only deallocates, its values were moved out.
        self.dense = dense;
    }

    /// Check that `C` is the type stored in this pool.
    #[inline]
    fn ensure_type<C: Component>(&self) {
        if !self.manager.is::<C>() {
            fatal(Error::TypeMismatch {
                expected: self.manager.name(),
                found: any::type_name::<C>(),
            });
        }
    }

    #[inline]
    fn check_index(&self, index: usize) {
        assert!(
            index < self.len(),
            "dense index {} out of bounds (len: {})",
            index,
            self.len()
        );
    }

    #[cold]
    #[track_caller]
    fn missing(&self, entity: Entity) -> ! {
        fatal(Error::Missing {
            entity,
            component: self.manager.name(),
        })
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use crate::ecs::component;

    use super::*;

    fn pool_of<C: Component>() -> Pool {
        Pool::new(
            Manager::new::<C>(component::Id::new(0)),
            64,
            GrowthStrategy::Multiply(2),
        )
    }

    fn entity(id: u32) -> Entity {
        Entity::from_parts(id, 0)
    }

    /// Check the two-way sparse/dense mapping.
    fn assert_packed(pool: &Pool) {
        for (index, entity) in pool.entities().iter().enumerate() {
            assert_eq!(pool.index_of(*entity), Some(index));
        }
    }

    struct DropTracker(Arc<AtomicUsize>);

    impl Drop for DropTracker {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl Component for DropTracker {}

    #[test]
    fn push_and_get() {
        // Given
        let mut pool = pool_of::<i32>();

        // When
        pool.push(entity(10), 100i32);
        pool.push(entity(3), 30i32);

        // Then
        assert_eq!(pool.len(), 2);
        assert_eq!(*pool.get::<i32>(entity(10)), 100);
        assert_eq!(*pool.get::<i32>(entity(3)), 30);
        assert!(pool.contains(entity(3)));
        assert!(!pool.contains(entity(4)));
        assert_eq!(pool.entities(), &[entity(10), entity(3)]);
        assert_packed(&pool);
    }

    #[test]
    fn get_mut_updates_value() {
        // Given
        let mut pool = pool_of::<String>();
        pool.push(entity(1), String::from("a"));

        // When
        pool.get_mut::<String>(entity(1)).push('b');

        // Then
        assert_eq!(pool.get::<String>(entity(1)), "ab");
    }

    #[test]
    #[should_panic(expected = "already has component")]
    fn push_twice_is_fatal() {
        // Given
        let mut pool = pool_of::<i32>();
        pool.push(entity(1), 1i32);

        // When
        pool.push(entity(1), 2i32);
    }

    #[test]
    #[should_panic(expected = "does not have component")]
    fn get_missing_is_fatal() {
        // Given
        let pool = pool_of::<i32>();

        // When
        pool.get::<i32>(entity(1));
    }

    #[test]
    #[should_panic(expected = "does not have component")]
    fn free_missing_is_fatal() {
        // Given
        let mut pool = pool_of::<i32>();
        pool.push(entity(2), 1i32);

        // When
        pool.free(entity(1));
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn wrong_type_is_fatal() {
        // Given
        let mut pool = pool_of::<i32>();

        // When
        pool.push(entity(1), 1.0f32);
    }

    #[test]
    fn stale_version_is_not_contained() {
        // Given
        let mut pool = pool_of::<i32>();
        pool.push(Entity::from_parts(5, 0), 1i32);

        // Then - Same id, different version
        assert!(!pool.contains(Entity::from_parts(5, 1)));
    }

    #[test]
    fn free_swaps_last_into_hole() {
        // Given
        let mut pool = pool_of::<i32>();
        for id in 0..4 {
            pool.push(entity(id), id as i32 * 10);
        }

        // When
        pool.free(entity(1));

        // Then
        assert_eq!(pool.len(), 3);
        assert!(!pool.contains(entity(1)));
        assert_eq!(pool.entities(), &[entity(0), entity(3), entity(2)]);
        assert_eq!(pool.values::<i32>(), &[0, 30, 20]);
        assert_packed(&pool);
    }

    #[test]
    fn free_last_element() {
        // Given
        let mut pool = pool_of::<i32>();
        pool.push(entity(0), 0i32);
        pool.push(entity(1), 1i32);

        // When
        pool.free(entity(1));

        // Then
        assert_eq!(pool.entities(), &[entity(0)]);
        assert_packed(&pool);
    }

    #[test]
    fn swap_exchanges_everything() {
        // Given
        let mut pool = pool_of::<String>();
        pool.push(entity(7), String::from("seven"));
        pool.push(entity(8), String::from("eight"));

        // When
        pool.swap(entity(7), entity(8));

        // Then
        assert_eq!(pool.entities(), &[entity(8), entity(7)]);
        assert_eq!(pool.get_at::<String>(0), "eight");
        assert_eq!(pool.get::<String>(entity(7)), "seven");
        assert_packed(&pool);
    }

    #[test]
    fn values_mut_edits_in_dense_order() {
        // Given
        let mut pool = pool_of::<u64>();
        for id in 0..4 {
            pool.push(entity(id), u64::from(id));
        }
        pool.free(entity(1));

        // When
        for value in pool.values_mut::<u64>() {
            *value *= 10;
        }

        // Then - entity 3 filled the hole left by entity 1
        assert_eq!(pool.values::<u64>(), &[0, 30, 20]);
        assert_eq!(*pool.get::<u64>(entity(3)), 30);
    }

    #[test]
    fn values_of_empty_pool() {
        // Given
        let mut pool = pool_of::<String>();

        // Then - dangling but aligned, never dereferenced
        assert!(pool.values::<String>().is_empty());
        assert!(pool.values_mut::<String>().is_empty());
    }

    #[test]
    fn growth_relocates_values() {
        // Given
        let mut pool = pool_of::<String>();

        // When - Several reallocations
        for id in 0..100 {
            pool.push(entity(id), id.to_string());
        }

        // Then
        assert!(pool.capacity() >= 100);
        for id in 0..100 {
            assert_eq!(pool.get::<String>(entity(id)), &id.to_string());
        }
    }

    #[test]
    fn clear_drops_values_and_keeps_capacity() {
        // Given
        let drops = Arc::new(AtomicUsize::new(0));
        let mut pool = pool_of::<DropTracker>();
        for id in 0..5 {
            pool.push(entity(id), DropTracker(drops.clone()));
        }
        let capacity = pool.capacity();

        // When
        pool.clear();

        // Then
        assert_eq!(drops.load(Ordering::Relaxed), 5);
        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), capacity);
        assert!(!pool.contains(entity(0)));
    }

    #[test]
    fn free_and_drop_run_destructors_once() {
        // Given
        let drops = Arc::new(AtomicUsize::new(0));
        let mut pool = pool_of::<DropTracker>();
        for id in 0..3 {
            pool.push(entity(id), DropTracker(drops.clone()));
        }

        // When
        pool.free(entity(0));

        // Then
        assert_eq!(drops.load(Ordering::Relaxed), 1);

        // When
        drop(pool);

        // Then
        assert_eq!(drops.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn zero_sized_components() {
        // Given
        #[derive(Debug, PartialEq)]
        struct Marker;
        impl Component for Marker {}
        let mut pool = pool_of::<Marker>();

        // When
        pool.push(entity(1), Marker);
        pool.push(entity(2), Marker);
        pool.free(entity(1));

        // Then
        assert_eq!(pool.entities(), &[entity(2)]);
        assert_eq!(pool.get::<Marker>(entity(2)), &Marker);
    }

    #[test]
    fn random_churn_keeps_pool_packed() {
        // Given
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut pool = pool_of::<u64>();
        let mut present = vec![false; 256];

        // When - Random adds, removes and swaps
        for _ in 0..5000 {
            let id = rng.gen_range(0..256u32);
            if present[id as usize] {
                if rng.gen_bool(0.5) {
                    pool.free(entity(id));
                    present[id as usize] = false;
                } else {
                    let other = pool.entities()[rng.gen_range(0..pool.len())];
                    pool.swap(entity(id), other);
                }
            } else {
                pool.push(entity(id), id as u64);
                present[id as usize] = true;
            }

            // Then
            assert_packed(&pool);
        }

        // Then - Every value stayed with its entity
        assert_eq!(pool.len(), present.iter().filter(|p| **p).count());
        for (id, present) in present.iter().enumerate() {
            assert_eq!(pool.contains(entity(id as u32)), *present);
            if *present {
                assert_eq!(*pool.get::<u64>(entity(id as u32)), id as u64);
            }
        }
    }
}
