//! Derive macros for `rusty_ecs`.

mod component;

use proc_macro::TokenStream;

/// Marks a type as storable in a component pool.
///
/// ```ignore
/// #[derive(Component)]
/// struct Position { x: f32, y: f32 }
/// ```
#[proc_macro_derive(Component)]
pub fn derive_component(item: TokenStream) -> TokenStream {
    component::derive_component(item)
}
