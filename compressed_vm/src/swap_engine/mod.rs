mod swap_in;
mod swap_out;

use log::{debug, trace, warn};

use crate::{
    cvm_address_space::CVMAddressSpace,
    modules::{
        compression::CompressionModule, physical_allocator::PhysicalAllocatorModule,
        physical_memory::PhysicalMemoryModule, victim_selection::VictimSelectionModule,
    },
    page_table::TranslationEntry,
    util::fatal,
};

/// State of a virtual page at the time it is accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FaultCause {
    /// never accessed before
    Unallocated,
    /// data lives inside of a compressed block
    Compressed,
    /// page is resident, nothing to do
    Resident,
}

impl<
        A: PhysicalAllocatorModule,
        C: CompressionModule,
        V: VictimSelectionModule,
        P: PhysicalMemoryModule,
    > CVMAddressSpace<A, C, V, P>
{
    /// Resolves a page fault at `vaddr` and returns the physical page that now backs it.
    ///
    /// Returns `Err` if `vaddr` is not part of the virtual address space.
    pub fn handle_page_fault(&mut self, vaddr: usize) -> Result<usize, ()> {
        let vpn = self.config.page_from_address(vaddr);
        if vpn >= self.page_table.len() {
            warn!("Page fault at {:#x} outside of the address space", vaddr);
            return Err(());
        }

        Ok(self.resolve_fault(vpn))
    }

    pub(crate) fn fault_cause(&self, vpn: usize) -> FaultCause {
        match self.page_table.get(vpn) {
            None => FaultCause::Unallocated,
            Some(entry) if entry.compressed => FaultCause::Compressed,
            Some(_) => FaultCause::Resident,
        }
    }

    /// Makes `vpn` resident and returns its physical page.
    /// `vpn` has to be inside of the page table.
    pub(crate) fn resolve_fault(&mut self, vpn: usize) -> usize {
        let cause = self.fault_cause(vpn);
        if cause != FaultCause::Resident {
            trace!("Page fault for vpn {} ({:?})", vpn, cause);
            self.statistics.page_faults += 1;
        }

        match cause {
            FaultCause::Unallocated => {
                self.statistics.zero_fill_faults += 1;
                self.map_zeroed_page(vpn)
            }
            FaultCause::Compressed => {
                let handle = self.page_table.get(vpn).and_then(|entry| entry.compress_block);
                match handle {
                    Some(handle) => self.swap_in(handle),
                    None => fatal!("Compressed vpn {} has no block", vpn),
                }

                match self.page_table.get(vpn).and_then(|entry| entry.ppn()) {
                    Some(ppn) => ppn,
                    None => fatal!("vpn {} is not resident after swap in", vpn),
                }
            }
            FaultCause::Resident => match self.page_table.get(vpn).and_then(|entry| entry.ppn()) {
                Some(ppn) => ppn,
                None => fatal!("vpn {} is neither resident nor compressed", vpn),
            },
        }
    }

    /// Maps a new zeroed page to the unmapped `vpn`
    pub(crate) fn map_zeroed_page(&mut self, vpn: usize) -> usize {
        debug_assert!(self.page_table.get(vpn).is_none());

        let ppn = match self.allocator.allocate_one_page_uncompressed() {
            Some(ppn) => ppn,
            None => self.evict_for_one_page(vpn),
        };

        self.zero_page(ppn);
        self.page_table.insert(TranslationEntry::resident(vpn, ppn, false));

        trace!("Mapped vpn {} to ppn {}", vpn, ppn);
        ppn
    }

    /// Evicts one group of pages and returns one of the freed physical pages.
    /// The other freed pages are released.
    fn evict_for_one_page(&mut self, vpn: usize) -> usize {
        let requested = self.config.group_size;
        let victims = self.select_victims(requested);

        if victims.is_empty() {
            fatal!("Out of memory: no free page and no victim for vpn {}", vpn);
        }

        let freed = match self.compress_victims(&victims) {
            Ok((_, freed)) => freed,
            Err(()) => fatal!(
                "Out of memory: no compressed space to evict {:?} for vpn {}",
                victims,
                vpn
            ),
        };

        let (ppn, rest) = freed
            .split_first()
            .map(|(ppn, rest)| (*ppn, rest.to_vec()))
            .unwrap_or_else(|| fatal!("Eviction for vpn {} freed no page", vpn));

        for ppn in rest {
            self.allocator.mark_free(ppn);
        }

        ppn
    }

    /// Asks the victim selection module for up to `count` victims and validates its answer
    pub(crate) fn select_victims(&mut self, count: usize) -> Vec<usize> {
        let victims = self.victim_selection.select_victims(count, &mut self.page_table);

        if victims.len() > count {
            fatal!(
                "Victim selection returned {} pages, only {} were requested",
                victims.len(),
                count
            );
        }

        for (i, vpn) in victims.iter().enumerate() {
            if !self.page_table.is_resident(*vpn) {
                fatal!("Victim selection returned vpn {} which is not resident", vpn);
            }
            if victims[i + 1..].contains(vpn) {
                fatal!("Victim selection returned vpn {} twice", vpn);
            }
        }

        debug!("Selected victims {:?} ({} requested)", victims, count);

        if victims.len() < count {
            warn!("Victim selection returned {} of {} requested pages", victims.len(), count);
            self.statistics.victim_shortfalls += 1;
        }

        victims
    }
}
