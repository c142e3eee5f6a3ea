/// Counters of an address space, only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CVMStatistics {
    /// faults that had to map or page in a page
    pub page_faults: u64,

    /// faults of pages that were never accessed before
    pub zero_fill_faults: u64,

    /// compressed blocks that were paged in
    pub swap_ins: u64,

    /// compressed blocks that were created by evicting pages
    pub swap_outs: u64,

    pub pages_compressed: u64,
    pub pages_decompressed: u64,

    pub bytes_before_compression: u64,
    pub bytes_after_compression: u64,

    /// evictions where the policy returned less victims than requested
    pub victim_shortfalls: u64,
}

impl CVMStatistics {
    /// `compressed / uncompressed` over all blocks ever created
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.bytes_before_compression == 0 {
            return None;
        }

        Some(self.bytes_after_compression as f64 / self.bytes_before_compression as f64)
    }

    pub(crate) fn record_compression(&mut self, pages: usize, before: usize, after: usize) {
        self.pages_compressed += pages as u64;
        self.bytes_before_compression += before as u64;
        self.bytes_after_compression += after as u64;
    }
}
