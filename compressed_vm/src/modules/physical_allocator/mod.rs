mod bitmap;

pub use bitmap::BitmapPhysicalAllocator;

/// Keeps track of which physical pages are in use.
///
/// Physical memory is split at `compress_start` into two zones:
/// `[0, compress_start)` holds uncompressed (resident) pages and
/// `[compress_start, num_phys_pages)` holds compressed blocks.
///
/// All `allocate_*` functions mark the returned pages as used.
/// An allocator does not do any reference counting, callers have to make sure
/// that they own a page before calling [`PhysicalAllocatorModule::mark_free`].
pub trait PhysicalAllocatorModule {
    /// Creates a new allocator module object.
    ///
    /// **Note**: It first will be initialized before it will be used
    fn new() -> Self;

    /// Initializes the allocator with `num_phys_pages` free pages, where the
    /// compressed zone starts at page `compress_start`.
    fn init(&mut self, num_phys_pages: usize, compress_start: usize) -> Result<(), ()>;

    /// Total number of physical pages
    fn num_phys_pages(&self) -> usize;

    /// First page of the compressed zone
    fn compress_start(&self) -> usize;

    /// Allocates the first free page of the uncompressed zone
    fn allocate_one_page_uncompressed(&mut self) -> Option<usize>;

    /// Allocates `n` free pages of the uncompressed zone.
    /// The pages do not have to be contiguous.
    ///
    /// If less than `n` pages are free, nothing is allocated and `None` is returned.
    fn allocate_free_run_uncompressed(&mut self, n: usize) -> Option<Vec<usize>>;

    /// Allocates `n` physically contiguous pages inside of the compressed zone
    /// and returns the first page of that run.
    ///
    /// If there is no such run, the bitmap stays untouched and `None` is returned.
    fn allocate_contiguous_run_compressed(&mut self, n: usize) -> Option<usize>;

    /// Returns up to `limit` free pages of the uncompressed zone **without** allocating them
    fn free_uncompressed_pages(&self, limit: usize) -> Vec<usize>;

    /// Marks `ppn` as used. Calling this on a used page has no effect.
    fn mark_used(&mut self, ppn: usize);

    /// Marks `ppn` as free. Calling this on a free page has no effect.
    fn mark_free(&mut self, ppn: usize);

    fn is_used(&self, ppn: usize) -> bool;

    /// Marks the pages `[start, start + n)` as free
    fn release_run(&mut self, start: usize, n: usize) {
        for ppn in start..start + n {
            self.mark_free(ppn);
        }
    }

    fn count_free_uncompressed(&self) -> usize {
        (0..self.compress_start())
            .filter(|ppn| !self.is_used(*ppn))
            .count()
    }

    fn count_free_compressed(&self) -> usize {
        (self.compress_start()..self.num_phys_pages())
            .filter(|ppn| !self.is_used(*ppn))
            .count()
    }

    /// Length of the biggest run of free pages inside of the compressed zone
    fn largest_free_compressed_run(&self) -> usize {
        let mut largest = 0;
        let mut curr = 0;
        for ppn in self.compress_start()..self.num_phys_pages() {
            if self.is_used(ppn) {
                curr = 0;
            } else {
                curr += 1;
                largest = largest.max(curr);
            }
        }

        largest
    }
}
