/// Invoke `$m` once per arity, peeling the head type off the list each step.
///
/// `tuple_arities!(m !! A, B, C)` expands to `m!(A, B, C); m!(B, C); m!(C);`.
#[macro_export]
#[doc(hidden)]
macro_rules! tuple_arities {
    ($m:ident !! $last:ident) => {
        $m!($last);
    };
    ($m:ident !! $head:ident, $($tail:ident),*) => {
        $m!($head, $($tail),*);
        $crate::tuple_arities!($m !! $($tail),*);
    };
}

/// Implement a tuple macro for every tuple from 1 to 12 elements.
///
/// Twelve matches the largest tuple arity the standard library implements its traits for.
#[macro_export]
#[doc(hidden)]
macro_rules! impl_for_tuples {
    ($m:ident) => {
        $crate::tuple_arities!($m !! A, B, C, D, E, F, G, H, I, J, K, L);
    };
}
