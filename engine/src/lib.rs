//! A sparse-set entity component store with owning groups.
//!
//! Entities are plain ids, components live in one packed pool per type, and views iterate the
//! entities holding a fixed combination of component types. Owning groups keep their matching
//! entities in a contiguous prefix of every owned pool so the hot iteration path never checks a
//! signature.
//!
//! ```rust,ignore
//! use rusty_ecs::ecs::{Owned, Partial, Registry};
//!
//! let mut registry = Registry::new();
//! let entity = registry.create();
//! registry.add_component(entity, Position { x: 0.0, y: 0.0 });
//! registry.add_component(entity, Velocity { dx: 1.0, dy: 0.0 });
//!
//! registry
//!     .create_view::<(Owned<Position>, Partial<Velocity>)>()
//!     .for_each_mut(|mut element| {
//!         let dx = element.get::<Velocity>().dx;
//!         element.get_mut::<Position>().x += dx;
//!     });
//! ```

// Allow the derive macros to resolve `::rusty_ecs` from inside this crate.
extern crate self as rusty_ecs;

pub mod ecs;
pub mod log;
