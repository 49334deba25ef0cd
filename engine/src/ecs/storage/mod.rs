//! Type-erased sparse-set storage for components.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Registry                                                       │
//! │  - One Pool per component id                                    │
//! │  - Groups reorder the dense prefix of the pools they own        │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │
//! ┌────────────────────────────▼────────────────────────────────────┐
//! │  Pool (sparse set)                                              │
//! │  - Entity id → dense index through a PagedArray                 │
//! │  - Swap-pop removal keeps the dense side packed                 │
//! └────────┬───────────────────────────────────────┬────────────────┘
//!          │                                       │
//! ┌────────▼─────────┐                    ┌────────▼─────────┐
//! │  PagedArray      │                    │  IndexedMemory   │
//! │  - Lazy pages    │                    │  - Raw unsafe    │
//! │  - Default slots │                    │  - Type-erased   │
//! └──────────────────┘                    └──────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! ## Sparse Sets
//!
//! Each pool keeps its values packed in a dense buffer, with a parallel array naming the entity
//! that owns each value. A paged sparse array maps an entity id to its dense index, so lookups,
//! insertions and removals are all O(1) while iteration walks contiguous memory.
//!
//! ## Type Erasure
//!
//! Pools store raw bytes. Moving, swapping and dropping values goes through the component's
//! [`Manager`](crate::ecs::component::Manager), a table of functions monomorphized once per type.
//! Typed accessors compare the requested type with the manager's before casting.

mod mem;
mod paged;
mod pool;

pub use mem::{GrowthStrategy, IndexedMemory};
pub use paged::PagedArray;
pub use pool::{DEAD, Ownership, Pool};
