//! Raw element buffers behind component pools.
//!
//! [`IndexedMemory`] is one allocation of `capacity` slots sharing a single element layout. It
//! does not know the element type, does not track which slots hold values and never drops them.
//! The owning [`Pool`](super::Pool) pairs it with the component's
//! [`Manager`](crate::ecs::component::Manager) for that.
//!
//! A pool grows by allocating a larger block, bulk-moving its live values across and dropping
//! the old block, which only releases memory.
//!
//! # Safety Contract
//!
//! Callers must:
//! - Only address slots below `capacity()`
//! - Only read slots they initialized
//! - Drop initialized values before the block is dropped
//! - Cast slots to the type the layout came from
//!
//! Allocation failure goes through [`std::alloc::handle_alloc_error`], which aborts. A layout
//! that overflows `isize` panics.

use std::{
    alloc::{self, Layout},
    cmp,
    ptr::{self, NonNull},
};

/// How a dense buffer grows when it runs out of room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrowthStrategy {
    /// Multiply the current capacity. A factor of 2 gives amortized O(1) pushes.
    Multiply(usize),
    /// Add a fixed number of slots.
    Buffer(usize),
    /// Grow to exactly what was asked for.
    Exact,
}

impl GrowthStrategy {
    /// The capacity to grow to when `required` slots are needed and `current` exist.
    pub fn next_capacity(&self, current: usize, required: usize) -> usize {
        let grown = match self {
            Self::Multiply(factor) => current.saturating_mul(*factor),
            Self::Buffer(extra) => current.saturating_add(*extra),
            Self::Exact => required,
        };
        cmp::max(grown, required)
    }
}

impl Default for GrowthStrategy {
    fn default() -> Self {
        Self::Multiply(2)
    }
}

/// A block of `capacity` uninitialized slots of one element layout.
pub struct IndexedMemory {
    base: NonNull<u8>,
    capacity: usize,
    layout: Layout,
}

impl IndexedMemory {
    /// An empty block. Nothing is allocated.
    #[inline]
    pub fn new(layout: Layout) -> Self {
        Self {
            // SAFETY: an alignment is never zero.
            base: unsafe { NonNull::new_unchecked(ptr::without_provenance_mut(layout.align())) },
            capacity: 0,
            layout,
        }
    }

    /// A block with room for exactly `capacity` elements.
    pub fn with_capacity(layout: Layout, capacity: usize) -> Self {
        let mut block = Self::new(layout);
        if capacity > 0 && layout.size() > 0 {
            let array = array_layout(layout, capacity);
            // SAFETY: the array layout has a non-zero size.
            let raw = unsafe { alloc::alloc(array) };
            match NonNull::new(raw) {
                Some(base) => block.base = base,
                None => alloc::handle_alloc_error(array),
            }
        }
        // Zero sized elements live on the dangling, aligned base.
        block.capacity = capacity;
        block
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pointer to the slot at `index`.
    ///
    /// # Panics
    /// Debug builds panic if `index >= capacity()`.
    #[inline]
    pub fn slot(&self, index: usize) -> NonNull<u8> {
        debug_assert!(
            index < self.capacity,
            "slot {index} out of bounds (capacity: {})",
            self.capacity
        );
        // SAFETY: the offset stays inside the allocation, or is zero for zero sized elements.
        unsafe { self.base.add(index * self.layout.size()) }
    }

    /// Pointer to slot 0. Aligned and non-null even when nothing is allocated.
    #[inline]
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }
}

fn array_layout(element: Layout, capacity: usize) -> Layout {
    element
        .size()
        .checked_mul(capacity)
        .and_then(|size| Layout::from_size_align(size, element.align()).ok())
        .unwrap_or_else(|| panic!("layout overflow for {capacity} elements"))
}

impl Drop for IndexedMemory {
    fn drop(&mut self) {
        if self.capacity > 0 && self.layout.size() > 0 {
            // SAFETY: base was allocated with this layout in `with_capacity`.
            unsafe { alloc::dealloc(self.base.as_ptr(), array_layout(self.layout, self.capacity)) }
        }
    }
}

// SAFETY: the block owns its allocation. Pools only store `Component` values, which are Send and
// Sync.
unsafe impl Send for IndexedMemory {}
unsafe impl Sync for IndexedMemory {}
