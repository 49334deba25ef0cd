//! Benchmark support for `rusty_ecs`.
//!
//! The criterion benches under `benches/` measure registry operations in isolation:
//!
//! - **Lifecycle**: entity creation, component add/remove, entity free
//! - **Views**: owning group iteration against filtered (non-owning) iteration
//! - **Churn**: random add/remove traffic while an owning group is live
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench -p rusty_ecs_bench
//!
//! # Run a single group
//! cargo bench -p rusty_ecs_bench -- view
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports.

pub mod components;
pub mod populate;
