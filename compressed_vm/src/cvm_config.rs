/// Number of virtual pages of an address space if nothing else is configured
pub const DEFAULT_NUM_VIRTUAL_PAGES: usize = 256;

/// Configuration of an address space, fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CVMConfig {
    /// Size of one page in bytes
    pub page_size: usize,

    /// Total number of physical pages (both zones)
    pub num_phys_pages: usize,

    /// First physical page of the compressed zone.
    /// Pages `[0, compress_start)` are the uncompressed zone.
    pub compress_start: usize,

    /// Number of pages that are evicted and compressed together
    pub group_size: usize,

    /// Number of entries of the translation table
    pub num_virtual_pages: usize,
}

impl CVMConfig {
    pub fn new(
        page_size: usize,
        num_phys_pages: usize,
        compress_start: usize,
        group_size: usize,
    ) -> Self {
        Self {
            page_size,
            num_phys_pages,
            compress_start,
            group_size,
            num_virtual_pages: DEFAULT_NUM_VIRTUAL_PAGES,
        }
    }

    /// Splits physical memory with a ratio of `uncompressed : compressed = 1 : ratio`
    pub fn with_divide_ratio(
        page_size: usize,
        num_phys_pages: usize,
        ratio: usize,
        group_size: usize,
    ) -> Self {
        let uncompressed_pages = num_phys_pages / (ratio + 1);
        Self::new(page_size, num_phys_pages, uncompressed_pages, group_size)
    }

    pub fn validate(&self) -> Result<(), ()> {
        if self.page_size == 0 || self.group_size == 0 || self.num_virtual_pages == 0 {
            return Err(());
        }

        // both zones need at least one page
        if self.compress_start == 0 || self.compress_start >= self.num_phys_pages {
            return Err(());
        }

        // a group has to fit into the uncompressed zone to be paged in again
        if self.group_size > self.compress_start {
            return Err(());
        }

        // all addresses have to be representable
        self.page_size.checked_mul(self.num_phys_pages).ok_or(())?;
        self.page_size.checked_mul(self.num_virtual_pages).ok_or(())?;

        Ok(())
    }

    pub fn uncompressed_pages(&self) -> usize {
        self.compress_start
    }

    pub fn compressed_pages(&self) -> usize {
        self.num_phys_pages - self.compress_start
    }

    /// Size of physical memory in bytes
    pub fn physical_memory_size(&self) -> usize {
        self.page_size * self.num_phys_pages
    }

    /// First address that is not part of the virtual address space anymore
    pub fn max_virtual_address(&self) -> usize {
        self.page_size * self.num_virtual_pages
    }

    #[inline]
    pub fn page_from_address(&self, address: usize) -> usize {
        address / self.page_size
    }

    #[inline]
    pub fn offset_from_address(&self, address: usize) -> usize {
        address % self.page_size
    }

    #[inline]
    pub fn make_address(&self, page: usize, offset: usize) -> usize {
        debug_assert!(offset < self.page_size);
        page * self.page_size + offset
    }
}

impl Default for CVMConfig {
    fn default() -> Self {
        Self::with_divide_ratio(1024, 64, 1, 4)
    }
}
