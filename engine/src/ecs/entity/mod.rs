//! Entity handles and identifier recycling.
//!
//! An [`Entity`] packs a 20 bit identifier and a 12 bit version into a single `u32`. The
//! identifier indexes every sparse structure in the registry; the version distinguishes
//! successive occupants of the same identifier slot.
//!
//! ```text
//!  31        20 19                   0
//! ┌────────────┬──────────────────────┐
//! │  version   │      identifier      │
//! └────────────┴──────────────────────┘
//! ```
//!
//! The [`Allocator`] hands out identifiers, reusing freed ones in LIFO order before minting new
//! ones. Whether a freed slot's version is bumped is controlled by [`Recycle`]. By default the
//! version is kept, so a handle captured before `free` compares equal to the handle later handed
//! out for the same slot. Use [`Recycle::BumpVersion`] when stale handles must be detectable.

use std::fmt;

use crate::ecs::{
    config::Recycle,
    error::{Error, fatal},
};

const ID_BITS: u32 = 20;
const ID_MASK: u32 = (1 << ID_BITS) - 1;
const VERSION_MASK: u32 = (1 << (32 - ID_BITS)) - 1;

/// An entity identifier: the slot index part of an [`Entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// The largest identifier that can be handed out. `0xFFFFF` is reserved for [`Entity::DEAD`].
    pub const MAX: Self = Self(ID_MASK - 1);

    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id & ID_MASK)
    }

    /// Get the index of this id in indexable storage.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// The version of an identifier slot, 12 bits wide.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u16);

impl Version {
    /// The version of a freshly minted identifier.
    pub const FIRST: Self = Self(0);

    #[inline]
    pub const fn new(version: u16) -> Self {
        Self(version & VERSION_MASK as u16)
    }

    /// The next version, wrapping within 12 bits.
    #[inline]
    pub const fn next(&self) -> Self {
        Self::new(self.0.wrapping_add(1))
    }

    #[inline]
    pub const fn value(&self) -> u16 {
        self.0
    }
}

/// An opaque handle to an entity. Carries no data of its own.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u32);

impl Entity {
    /// The "no entity" value.
    pub const DEAD: Self = Self(u32::MAX);

    /// Construct an entity from its identifier and version.
    #[inline]
    pub const fn new(id: Id, version: Version) -> Self {
        Self(((version.0 as u32) << ID_BITS) | id.0)
    }

    /// Construct an entity from raw identifier and version values.
    #[inline]
    pub const fn from_parts(id: u32, version: u16) -> Self {
        Self::new(Id::new(id), Version::new(version))
    }

    /// Reinterpret a packed value.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn to_bits(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn id(&self) -> Id {
        Id(self.0 & ID_MASK)
    }

    #[inline]
    pub const fn version(&self) -> Version {
        Version(((self.0 >> ID_BITS) & VERSION_MASK) as u16)
    }

    /// Index of this entity's identifier in sparse storage.
    #[inline]
    pub const fn index(&self) -> usize {
        (self.0 & ID_MASK) as usize
    }

    #[inline]
    pub const fn is_dead(&self) -> bool {
        self.0 == Self::DEAD.0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dead() {
            write!(f, "Entity(DEAD)")
        } else {
            write!(f, "Entity({}v{})", self.id().0, self.version().0)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dead() {
            write!(f, "DEAD")
        } else {
            write!(f, "{}v{}", self.id().0, self.version().0)
        }
    }
}

/// The state of one identifier slot.
#[derive(Debug, Clone, Copy)]
struct Slot {
    version: Version,
    alive: bool,
}

/// Allocates entity identifiers and recycles freed ones.
///
/// Freed identifiers go on a stack and are handed out again before any fresh identifier is
/// minted, so the identifier space stays compact.
#[derive(Debug)]
pub struct Allocator {
    /// Per identifier slot state, indexed by id.
    slots: Vec<Slot>,

    /// Freed identifiers, most recently freed last.
    free: Vec<Id>,

    /// What happens to a slot's version when it is freed.
    recycle: Recycle,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new(Recycle::default())
    }
}

impl Allocator {
    pub const fn new(recycle: Recycle) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            recycle,
        }
    }

    /// Allocate an entity, reusing the most recently freed identifier if there is one.
    pub fn alloc(&mut self) -> Entity {
        if let Some(id) = self.free.pop() {
            let slot = &mut self.slots[id.index()];
            slot.alive = true;
            return Entity::new(id, slot.version);
        }

        let next = self.slots.len() as u32;
        if next > Id::MAX.0 {
            fatal(Error::EntitiesExhausted);
        }
        self.slots.push(Slot {
            version: Version::FIRST,
            alive: true,
        });
        Entity::new(Id(next), Version::FIRST)
    }

    /// Return an entity's identifier to the free list.
    pub fn free(&mut self, entity: Entity) {
        if !self.is_alive(entity) {
            fatal(Error::DeadEntity { entity });
        }
        let slot = &mut self.slots[entity.index()];
        slot.alive = false;
        if self.recycle == Recycle::BumpVersion {
            slot.version = slot.version.next();
        }
        self.free.push(entity.id());
    }

    /// Determine if the entity is the current, alive occupant of its slot.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index())
            .is_some_and(|slot| slot.alive && slot.version == entity.version())
    }

    /// The number of alive entities.
    #[inline]
    pub fn alive_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// The number of identifiers ever minted.
    #[inline]
    pub fn minted(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_packs_id_and_version() {
        // Given
        let entity = Entity::from_parts(0xABCDE, 0x7FF);

        // Then
        assert_eq!(entity.id(), Id::new(0xABCDE));
        assert_eq!(entity.version(), Version::new(0x7FF));
        assert_eq!(entity.index(), 0xABCDE);
        assert_eq!(entity.to_bits(), 0x7FF0_0000 | 0xABCDE);
        assert!(!entity.is_dead());
    }

    #[test]
    fn dead_entity() {
        // Then
        assert!(Entity::DEAD.is_dead());
        assert_eq!(Entity::DEAD.to_bits(), 0xFFFF_FFFF);
        assert_eq!(Entity::DEAD.index(), 0xFFFFF);
        assert_eq!(format!("{:?}", Entity::DEAD), "Entity(DEAD)");
    }

    #[test]
    fn version_wraps_at_twelve_bits() {
        // Given
        let last = Version::new(0xFFF);

        // Then
        assert_eq!(last.next(), Version::FIRST);
        assert_eq!(Version::new(0x1001), Version::new(1));
    }

    #[test]
    fn allocator_uniqueness() {
        // Given
        let mut allocator = Allocator::default();

        // When
        let mut entities: Vec<_> = (0..200).map(|_| allocator.alloc()).collect();

        // Then - No dupes generated
        let pre_len = entities.len();
        entities.sort();
        entities.dedup();
        assert_eq!(pre_len, entities.len());
        assert_eq!(allocator.alive_count(), 200);
    }

    #[test]
    fn allocator_reuses_most_recently_freed() {
        // Given
        let mut allocator = Allocator::default();
        let e0 = allocator.alloc();
        let e1 = allocator.alloc();
        let e2 = allocator.alloc();

        // When
        allocator.free(e0);
        allocator.free(e2);

        // Then - LIFO reuse, then fresh ids
        assert_eq!(allocator.alloc().id(), e2.id());
        assert_eq!(allocator.alloc().id(), e0.id());
        assert_eq!(allocator.alloc().id(), Id::new(3));
        assert!(allocator.is_alive(e1));
    }

    #[test]
    fn allocator_keeps_version_by_default() {
        // Given
        let mut allocator = Allocator::default();
        let entity = allocator.alloc();

        // When
        allocator.free(entity);
        let reused = allocator.alloc();

        // Then - The recycled handle is indistinguishable from the stale one
        assert_eq!(reused, entity);
        assert!(allocator.is_alive(entity));
    }

    #[test]
    fn allocator_bumps_version_when_configured() {
        // Given
        let mut allocator = Allocator::new(Recycle::BumpVersion);
        let entity = allocator.alloc();

        // When
        allocator.free(entity);
        let reused = allocator.alloc();

        // Then
        assert_eq!(reused.id(), entity.id());
        assert_eq!(reused.version(), Version::new(1));
        assert!(!allocator.is_alive(entity));
        assert!(allocator.is_alive(reused));
    }

    #[test]
    fn allocator_alive_tracking() {
        // Given
        let mut allocator = Allocator::default();
        let entity = allocator.alloc();

        // When
        allocator.free(entity);

        // Then
        assert!(!allocator.is_alive(entity));
        assert!(!allocator.is_alive(Entity::from_parts(99, 0)));
        assert_eq!(allocator.alive_count(), 0);
        assert_eq!(allocator.minted(), 1);
    }

    #[test]
    #[should_panic(expected = "is not alive")]
    fn allocator_double_free_is_fatal() {
        // Given
        let mut allocator = Allocator::default();
        let entity = allocator.alloc();
        allocator.free(entity);

        // When
        allocator.free(entity);
    }

    #[test]
    fn allocator_large_scale_reuse() {
        // Given
        let mut allocator = Allocator::default();
        let mut entities: Vec<_> = (0..1000).map(|_| allocator.alloc()).collect();

        // When - Free half of them and allocate 500 more
        for e in entities.drain(0..500) {
            allocator.free(e);
        }
        let reused: Vec<_> = (0..500).map(|_| allocator.alloc()).collect();

        // Then - IDs should come from the freed range, no new ids minted
        assert!(reused.iter().all(|e| e.index() < 500));
        assert_eq!(allocator.minted(), 1000);
        assert_eq!(allocator.alive_count(), 1000);
    }
}
