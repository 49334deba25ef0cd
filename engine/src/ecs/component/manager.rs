use std::{
    alloc::Layout,
    any::{self, TypeId as StdTypeId},
    mem,
    ptr::{self, NonNull},
};

use crate::ecs::component::{Component, Id};

/// Type-erased operations for one component type.
///
/// Built once per type by [`Manager::new`], which picks a monomorphized function for each
/// operation. Pools only ever touch component memory through these functions (or through typed
/// accessors that check the stored [`StdTypeId`] first).
#[derive(Debug, Clone, Copy)]
pub struct Manager {
    /// The registry-assigned component id.
    id: Id,

    /// The Rust TypeId, used to validate typed access.
    type_id: StdTypeId,

    /// The type name, for diagnostics.
    name: &'static str,

    /// The memory layout of one value.
    layout: Layout,

    /// Move one value from `src` to uninitialized `dst`.
    move_one: unsafe fn(NonNull<u8>, NonNull<u8>),

    /// Move `count` contiguous values from `src` to uninitialized, non-overlapping `dst`.
    move_many: unsafe fn(NonNull<u8>, NonNull<u8>, usize),

    /// Drop `count` contiguous values in place. A no-op for types without drop glue.
    drop_many: unsafe fn(NonNull<u8>, usize),

    /// Swap two initialized values in place.
    swap: unsafe fn(NonNull<u8>, NonNull<u8>),
}

impl Manager {
    /// Construct the manager for component type `C`.
    pub fn new<C: Component>(id: Id) -> Self {
        let drop_many = if mem::needs_drop::<C>() {
            Self::drop_many_impl::<C>
        } else {
            Self::drop_noop
        };
        Self {
            id,
            type_id: StdTypeId::of::<C>(),
            name: any::type_name::<C>(),
            layout: Layout::new::<C>(),
            move_one: Self::move_one_impl::<C>,
            move_many: Self::move_many_impl::<C>,
            drop_many,
            swap: Self::swap_impl::<C>,
        }
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn type_id(&self) -> StdTypeId {
        self.type_id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Determine if `C` is the type this manager was built for.
    #[inline]
    pub fn is<C: 'static>(&self) -> bool {
        self.type_id == StdTypeId::of::<C>()
    }

    /// # Safety
    /// `src` must hold an initialized value of this type, which is logically moved out.
    /// `dst` must be valid for writes and hold no live value.
    #[inline]
    pub unsafe fn move_one(&self, src: NonNull<u8>, dst: NonNull<u8>) {
        unsafe { (self.move_one)(src, dst) }
    }

    /// # Safety
    /// `src` must hold `count` initialized values which are logically moved out. `dst` must be
    /// valid for `count` writes and must not overlap `src`.
    #[inline]
    pub unsafe fn move_many(&self, src: NonNull<u8>, dst: NonNull<u8>, count: usize) {
        unsafe { (self.move_many)(src, dst, count) }
    }

    /// # Safety
    /// `ptr` must hold `count` initialized values, which are left uninitialized.
    #[inline]
    pub unsafe fn drop_many(&self, ptr: NonNull<u8>, count: usize) {
        unsafe { (self.drop_many)(ptr, count) }
    }

    /// # Safety
    /// Both pointers must hold initialized values of this type.
    #[inline]
    pub unsafe fn swap(&self, a: NonNull<u8>, b: NonNull<u8>) {
        unsafe { (self.swap)(a, b) }
    }

    unsafe fn move_one_impl<C>(src: NonNull<u8>, dst: NonNull<u8>) {
        unsafe {
            let value = ptr::read(src.as_ptr() as *const C);
            ptr::write(dst.as_ptr() as *mut C, value);
        }
    }

    unsafe fn move_many_impl<C>(src: NonNull<u8>, dst: NonNull<u8>, count: usize) {
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr() as *const C, dst.as_ptr() as *mut C, count);
        }
    }

    unsafe fn drop_many_impl<C>(ptr: NonNull<u8>, count: usize) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr.as_ptr() as *mut C, count));
        }
    }

    unsafe fn drop_noop(_ptr: NonNull<u8>, _count: usize) {}

    unsafe fn swap_impl<C>(a: NonNull<u8>, b: NonNull<u8>) {
        // ptr::swap tolerates a == b.
        unsafe { ptr::swap(a.as_ptr() as *mut C, b.as_ptr() as *mut C) }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    struct DropTracker(Arc<AtomicUsize>);

    impl Drop for DropTracker {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl Component for DropTracker {}

    fn ptr_of<T>(value: &mut T) -> NonNull<u8> {
        NonNull::from(value).cast()
    }

    #[test]
    fn manager_basic_properties() {
        // When
        let manager = Manager::new::<u64>(Id::new(42));

        // Then
        assert_eq!(manager.id(), Id::new(42));
        assert!(manager.is::<u64>());
        assert!(!manager.is::<u32>());
        assert_eq!(manager.layout(), Layout::new::<u64>());
        assert_eq!(manager.name(), "u64");
    }

    #[test]
    fn move_one_relocates_value() {
        // Given
        let manager = Manager::new::<String>(Id::new(0));
        let mut src = mem::ManuallyDrop::new(String::from("moved"));
        let mut dst = mem::MaybeUninit::<String>::uninit();

        // When
        unsafe { manager.move_one(ptr_of(&mut *src), NonNull::from(&mut dst).cast()) };

        // Then
        let dst = unsafe { dst.assume_init() };
        assert_eq!(dst, "moved");
    }

    #[test]
    fn move_many_relocates_values() {
        // Given
        let manager = Manager::new::<u32>(Id::new(0));
        let mut src = [1u32, 2, 3];
        let mut dst = [0u32; 3];

        // When
        unsafe { manager.move_many(ptr_of(&mut src), ptr_of(&mut dst), 3) };

        // Then
        assert_eq!(dst, [1, 2, 3]);
    }

    #[test]
    fn swap_exchanges_values() {
        // Given
        let manager = Manager::new::<String>(Id::new(0));
        let mut a = String::from("a");
        let mut b = String::from("b");

        // When
        unsafe { manager.swap(ptr_of(&mut a), ptr_of(&mut b)) };

        // Then
        assert_eq!(a, "b");
        assert_eq!(b, "a");
    }

    #[test]
    fn drop_many_runs_destructors() {
        // Given
        let drops = Arc::new(AtomicUsize::new(0));
        let manager = Manager::new::<DropTracker>(Id::new(0));
        let mut values = mem::ManuallyDrop::new([
            DropTracker(drops.clone()),
            DropTracker(drops.clone()),
        ]);

        // When
        unsafe { manager.drop_many(ptr_of(&mut *values), 2) };

        // Then
        assert_eq!(drops.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn drop_many_noop_for_plain_data() {
        // Given
        let manager = Manager::new::<f32>(Id::new(0));
        let mut values = [1.0f32, 2.0];

        // When
        unsafe { manager.drop_many(ptr_of(&mut values), 2) };

        // Then - plain data is untouched
        assert_eq!(values, [1.0, 2.0]);
    }
}
