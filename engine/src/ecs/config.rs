//! Registry tuning knobs.
use crate::ecs::storage::GrowthStrategy;

/// What happens to an identifier slot's version when its entity is freed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Recycle {
    /// The version is left untouched, so a recycled identifier yields a handle equal to the one
    /// that was freed.
    #[default]
    KeepVersion,
    /// The version is bumped (wrapping at 12 bits), so stale handles fail `is_alive`.
    BumpVersion,
}

/// Configuration for a [`Registry`](crate::ecs::Registry).
///
/// ```rust,ignore
/// let config = Config::new()
///     .with_sparse_page_size(1024)
///     .with_recycle(Recycle::BumpVersion);
/// let registry = Registry::with_config(config);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Page size of every pool's identifier to dense index map.
    pub sparse_page_size: usize,
    /// Page size of the per entity signature table.
    pub signature_page_size: usize,
    /// How pool dense buffers grow when full.
    pub growth: GrowthStrategy,
    /// Version policy for recycled identifiers.
    pub recycle: Recycle,
}

impl Config {
    pub const DEFAULT_SPARSE_PAGE_SIZE: usize = 4096;
    pub const DEFAULT_SIGNATURE_PAGE_SIZE: usize = 1024;

    pub const fn new() -> Self {
        Self {
            sparse_page_size: Self::DEFAULT_SPARSE_PAGE_SIZE,
            signature_page_size: Self::DEFAULT_SIGNATURE_PAGE_SIZE,
            growth: GrowthStrategy::Multiply(2),
            recycle: Recycle::KeepVersion,
        }
    }

    /// # Panics
    ///
    /// Debug builds panic if `page_size` is 0.
    pub const fn with_sparse_page_size(mut self, page_size: usize) -> Self {
        debug_assert!(page_size > 0, "page_size must be greater than 0");
        self.sparse_page_size = page_size;
        self
    }

    /// # Panics
    ///
    /// Debug builds panic if `page_size` is 0.
    pub const fn with_signature_page_size(mut self, page_size: usize) -> Self {
        debug_assert!(page_size > 0, "page_size must be greater than 0");
        self.signature_page_size = page_size;
        self
    }

    pub const fn with_growth(mut self, growth: GrowthStrategy) -> Self {
        self.growth = growth;
        self
    }

    pub const fn with_recycle(mut self, recycle: Recycle) -> Self {
        self.recycle = recycle;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
