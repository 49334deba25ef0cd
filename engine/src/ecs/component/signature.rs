use fixedbitset::FixedBitSet;

use crate::ecs::component::Id;

/// The set of component types attached to an entity, one bit per component [`Id`].
///
/// Signatures are fixed at [`Signature::BITS`] bits so that every signature compares and unions
/// against every other without resizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    bitset: FixedBitSet,
}

impl Signature {
    /// The number of component ids a signature can describe.
    pub const BITS: usize = 256;

    /// An empty signature.
    #[inline]
    pub fn new() -> Self {
        Self {
            bitset: FixedBitSet::with_capacity(Self::BITS),
        }
    }

    /// Build a signature holding each of the given ids.
    pub fn from_ids(ids: impl IntoIterator<Item = Id>) -> Self {
        let mut signature = Self::new();
        for id in ids {
            signature.insert(id);
        }
        signature
    }

    #[inline]
    pub fn insert(&mut self, id: Id) {
        debug_assert!(id.index() < Self::BITS, "component id {} out of range", id.index());
        self.bitset.insert(id.index());
    }

    #[inline]
    pub fn remove(&mut self, id: Id) {
        debug_assert!(id.index() < Self::BITS, "component id {} out of range", id.index());
        self.bitset.set(id.index(), false);
    }

    #[inline]
    pub fn contains(&self, id: Id) -> bool {
        self.bitset.contains(id.index())
    }

    /// Determine if every id in `other` is also in this signature.
    #[inline]
    pub fn is_superset(&self, other: &Signature) -> bool {
        self.bitset.is_superset(&other.bitset)
    }

    /// Union of two signatures.
    #[inline]
    pub fn union(&self, other: &Signature) -> Self {
        let mut bitset = self.bitset.clone();
        bitset.union_with(&other.bitset);
        Self { bitset }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bitset.is_clear()
    }

    /// The number of component ids in this signature.
    #[inline]
    pub fn len(&self) -> usize {
        self.bitset.count_ones(..)
    }

    /// Iterate the component ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.bitset.ones().map(Id::from)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.bitset.clear();
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_contains() {
        // Given
        let mut signature = Signature::new();

        // When
        signature.insert(Id::new(3));
        signature.insert(Id::new(254));

        // Then
        assert!(signature.contains(Id::new(3)));
        assert!(signature.contains(Id::new(254)));
        assert!(!signature.contains(Id::new(4)));
        assert_eq!(signature.len(), 2);

        // When
        signature.remove(Id::new(3));

        // Then
        assert!(!signature.contains(Id::new(3)));
        assert_eq!(signature.ids().collect::<Vec<_>>(), vec![Id::new(254)]);
    }

    #[test]
    fn superset_checks() {
        // Given
        let owned = Signature::from_ids([Id::new(0), Id::new(1)]);
        let affected = owned.union(&Signature::from_ids([Id::new(5)]));

        // Then
        assert!(affected.is_superset(&owned));
        assert!(!owned.is_superset(&affected));
        assert!(owned.is_superset(&Signature::new()));
        assert_eq!(affected.len(), 3);
    }

    #[test]
    fn clear_empties_signature() {
        // Given
        let mut signature = Signature::from_ids([Id::new(7), Id::new(9)]);

        // When
        signature.clear();

        // Then
        assert!(signature.is_empty());
        assert_eq!(signature, Signature::default());
    }
}
