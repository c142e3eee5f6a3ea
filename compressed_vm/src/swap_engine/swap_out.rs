use log::{debug, warn};

use crate::{
    compressed_block::BlockHandle,
    cvm_address_space::CVMAddressSpace,
    modules::{
        compression::CompressionModule, physical_allocator::PhysicalAllocatorModule,
        physical_memory::PhysicalMemoryModule, victim_selection::VictimSelectionModule,
    },
};

impl<
        A: PhysicalAllocatorModule,
        C: CompressionModule,
        V: VictimSelectionModule,
        P: PhysicalMemoryModule,
    > CVMAddressSpace<A, C, V, P>
{
    /// Compresses the resident pages `vpns` into one new block and frees their physical pages.
    ///
    /// Fails without changing anything if one of the pages is not resident, a page is listed
    /// twice or the compressed zone has no contiguous run that is large enough.
    pub fn swap_out(&mut self, vpns: &[usize]) -> Result<BlockHandle, ()> {
        let (handle, freed) = self.compress_victims(vpns)?;

        for ppn in freed {
            self.allocator.mark_free(ppn);
        }

        Ok(handle)
    }

    /// Compresses `victims` in the given order into one block.
    ///
    /// Returns the new block and the physical pages the victims occupied before.
    /// These pages are still marked as used, it is up to the caller to reuse or free them.
    pub(crate) fn compress_victims(
        &mut self,
        victims: &[usize],
    ) -> Result<(BlockHandle, Vec<usize>), ()> {
        if victims.is_empty() {
            return Err(());
        }

        let mut ppns = Vec::with_capacity(victims.len());
        for (i, vpn) in victims.iter().enumerate() {
            if victims[..i].contains(vpn) {
                warn!("vpn {} is listed twice for swap out", vpn);
                return Err(());
            }

            match self.page_table.get(*vpn).and_then(|entry| entry.ppn()) {
                Some(ppn) => ppns.push(ppn),
                None => {
                    warn!("vpn {} is not resident and can not be swapped out", vpn);
                    return Err(());
                }
            }
        }

        let page_size = self.config.page_size;
        let mut buffer = vec![0u8; victims.len() * page_size];
        for (ppn, page) in ppns.iter().zip(buffer.chunks_mut(page_size)) {
            self.read_physical(self.config.make_address(*ppn, 0), page);
        }

        let handle = match self.store_compressed(&buffer, victims) {
            Some(handle) => handle,
            None => {
                warn!(
                    "No compressed run for {} pages (largest free run: {} pages)",
                    victims.len(),
                    self.allocator.largest_free_compressed_run()
                );
                return Err(());
            }
        };

        for (offset, vpn) in victims.iter().enumerate() {
            if let Some(entry) = self.page_table.get_mut(*vpn) {
                entry.mark_compressed(handle, offset);
            }
        }

        self.record_block_statistics(handle);
        self.statistics.swap_outs += 1;
        debug!("Swapped out vpns {:?} from ppns {:?} into {:?}", victims, ppns, handle);

        Ok((handle, ppns))
    }
}
