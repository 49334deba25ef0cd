//! Component types and their type-erased descriptions.
//!
//! Components are the plain data records attached to entities. Each component type gets:
//!
//! - an [`Id`]: a small integer assigned on first registration with a [`TypeRegistry`], used to
//!   index pools and signature bits
//! - a [`Manager`]: a record of monomorphized functions that move, swap and drop values of the
//!   type through raw byte pointers, letting pools store any component type in untyped buffers
//!
//! The [`Signature`] of an entity records which component ids it currently has.
//!
//! ## Usage
//!
//! ```ignore
//! use rusty_ecs::ecs::component::{Component, TypeRegistry};
//!
//! #[derive(Component)]
//! struct Position { x: f32, y: f32 }
//!
//! let types = TypeRegistry::new();
//! let pos_id = types.register::<Position>();
//! ```

mod manager;
mod registry;
mod signature;

pub use manager::Manager;
pub use registry::TypeRegistry;
pub use signature::Signature;

/// The maximum number of component types a registry can hold.
pub const MAX_COMPONENTS: usize = 255;

/// A component type identifier, unique within a [`TypeRegistry`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Construct a new component Id from a raw u32 value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the index of this component in indexable storage (pool slots, signature bits).
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<usize> for Id {
    #[inline]
    fn from(value: usize) -> Self {
        Self::new(value as u32)
    }
}

/// A trait representing a component: any owned, thread-transferable data type.
///
/// Use `#[derive(Component)]` for your own types. Primitive types implement it directly.
pub trait Component: 'static + Sized + Send + Sync {}

macro_rules! primitive_components {
    ($($ty: ty),*) => {
        $(impl Component for $ty {})*
    };
}

primitive_components!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String
);
