use crate::{
    cvm_address_space::CVMAddressSpace,
    cvm_config::CVMConfig,
    modules::{
        compression::{CompressionModule, Lz4CompressionModule},
        physical_allocator::BitmapPhysicalAllocator,
        physical_memory::BufferPhysicalMemory,
        victim_selection::{RoundRobinVictimSelectionModule, VictimSelectionModule},
    },
    page_table::PageTable,
};

mod corruption;
mod scenario;

/// Wraps another policy and returns at most `limit` victims per call
pub(crate) struct LimitedVictimSelection<V: VictimSelectionModule> {
    inner: V,
    pub(crate) limit: Option<usize>,
}

impl<V: VictimSelectionModule> VictimSelectionModule for LimitedVictimSelection<V> {
    fn new() -> Self {
        Self {
            inner: V::new(),
            limit: None,
        }
    }

    fn select_victims(&mut self, count: usize, page_table: &mut PageTable) -> Vec<usize> {
        let count = self.limit.map_or(count, |limit| count.min(limit));
        self.inner.select_victims(count, page_table)
    }
}

pub(crate) type TestAddressSpaceWith<C> = CVMAddressSpace<
    BitmapPhysicalAllocator,
    C,
    LimitedVictimSelection<RoundRobinVictimSelectionModule>,
    BufferPhysicalMemory,
>;

pub(crate) type TestAddressSpace = TestAddressSpaceWith<Lz4CompressionModule>;

pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Address space with deterministic round robin eviction
pub(crate) fn get_test_space(config: CVMConfig) -> TestAddressSpace {
    get_test_space_with(config)
}

pub(crate) fn get_test_space_with<C: CompressionModule>(
    config: CVMConfig,
) -> TestAddressSpaceWith<C> {
    init_test_logging();

    CVMAddressSpace::new(
        config,
        BufferPhysicalMemory::with_pages(config.page_size, config.num_phys_pages),
        LimitedVictimSelection::new(),
    )
    .unwrap()
}

/// Page filled with `value`
pub(crate) fn uniform_page(page_size: usize, value: u8) -> Vec<u8> {
    vec![value; page_size]
}
