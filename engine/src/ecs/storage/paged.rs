/// A page-allocated sparse array from a dense integer key to `T`.
///
/// The key space is divided into fixed-size pages, and memory is only allocated for pages that
/// have been written through [`PagedArray::index`]. Reads through [`PagedArray::get`] never
/// allocate: slots in untouched pages read as the array's default value.
///
/// # Design Rationale
///
/// Entity identifiers span a large space (about 10^6) but live entities tend to cluster:
/// - **Sequential allocation**: identifiers 0, 1, 2... as entities are created
/// - **Recycling**: freed identifiers are reused before new ones are minted
///
/// Paging gives O(1) random access without paying for the whole identifier space up front, and
/// without the hashing overhead of a map.
///
/// | Operation | Time | Memory |
/// |-----------|------|--------|
/// | `index()` | O(1) | Allocates and default-fills a page on first touch |
/// | `get()` | O(1) | No allocation |
///
/// # Example
///
/// ```ignore
/// let mut sparse = PagedArray::with_page_size(u32::MAX, 256);
///
/// *sparse.index(0) = 0;
/// *sparse.index(1000) = 1; // allocates page 3 only
///
/// assert_eq!(*sparse.get(1000), 1);
/// assert_eq!(*sparse.get(500), u32::MAX); // page 1 never allocated
/// ```
#[derive(Debug, Clone)]
pub struct PagedArray<T: Clone> {
    /// The number of slots per page.
    page_size: usize,

    /// Outer Vec is indexed by `key / page_size`, inner slice by `key % page_size`.
    pages: Vec<Option<Box<[T]>>>,

    /// Value of every untouched slot.
    default: T,
}

impl<T: Clone> PagedArray<T> {
    /// Default page size balances memory usage and access speed for typical entity patterns.
    pub const DEFAULT_PAGE_SIZE: usize = 4096;

    /// The largest key any paged array accepts: one past the largest entity identifier.
    pub const CAPACITY: usize = 1 << 20;

    /// Create an empty paged array with the default page size.
    #[inline]
    pub fn new(default: T) -> Self {
        Self::with_page_size(default, Self::DEFAULT_PAGE_SIZE)
    }

    /// Create an empty paged array with a custom page size.
    ///
    /// # Panics
    ///
    /// Debug builds panic if `page_size` is 0.
    #[inline]
    pub fn with_page_size(default: T, page_size: usize) -> Self {
        debug_assert!(page_size > 0, "page_size must be greater than 0");
        Self {
            page_size,
            pages: Vec::new(),
            default,
        }
    }

    /// Calculate the page and within-page indices for a key.
    #[inline]
    fn indices(&self, key: usize) -> (usize, usize) {
        debug_assert!(
            key < Self::CAPACITY,
            "key {} out of bounds (capacity: {})",
            key,
            Self::CAPACITY
        );
        (key / self.page_size, key % self.page_size)
    }

    /// Get a mutable reference to the slot for `key`, allocating its page on first touch.
    pub fn index(&mut self, key: usize) -> &mut T {
        let (page_index, slot_index) = self.indices(key);

        // Ensure the pages vector reaches this page
        if page_index >= self.pages.len() {
            self.pages.resize_with(page_index + 1, || None);
        }

        let page_size = self.page_size;
        let default = &self.default;
        let page = self.pages[page_index]
            .get_or_insert_with(|| vec![default.clone(); page_size].into_boxed_slice());
        &mut page[slot_index]
    }

    /// Get the slot for `key`, or the default value when its page was never allocated.
    #[inline]
    pub fn get(&self, key: usize) -> &T {
        let (page_index, slot_index) = self.indices(key);
        match self.pages.get(page_index) {
            Some(Some(page)) => &page[slot_index],
            _ => &self.default,
        }
    }

    /// Reset every allocated slot to the default value, keeping the pages.
    pub fn reset(&mut self) {
        for page in self.pages.iter_mut().flatten() {
            page.fill(self.default.clone());
        }
    }

    /// The value of untouched slots.
    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Get the number of page slots (including unallocated ones).
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of addressable slots in the page slots reserved so far.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.pages.len() * self.page_size
    }

    /// Get the number of pages that have been allocated.
    pub fn allocated_page_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }
}
