use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

/// Expands to an empty `Component` impl for the annotated type.
///
/// The path is absolute so the expansion resolves both in downstream crates and inside
/// `rusty_ecs` itself, which aliases itself with `extern crate self as rusty_ecs`.
pub fn derive_component(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let name = &ast.ident;
    let (impl_generics, type_generics, where_clause) = ast.generics.split_for_impl();

    TokenStream::from(quote! {
        impl #impl_generics ::rusty_ecs::ecs::Component for #name #type_generics #where_clause {}
    })
}
