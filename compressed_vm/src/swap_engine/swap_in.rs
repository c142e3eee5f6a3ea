/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use log::{debug, trace};

use crate::{
    compressed_block::BlockHandle,
    cvm_address_space::CVMAddressSpace,
    modules::{
        compression::CompressionModule, physical_allocator::PhysicalAllocatorModule,
        physical_memory::PhysicalMemoryModule, victim_selection::VictimSelectionModule,
    },
    util::{fatal, round_up_to_nearest},
};

impl<
        A: PhysicalAllocatorModule,
        C: CompressionModule,
        V: VictimSelectionModule,
        P: PhysicalMemoryModule,
    > CVMAddressSpace<A, C, V, P>
{
    /// Decompresses all pages of `handle` back into the uncompressed zone.
    ///
    /// The block is dropped afterwards and its pages in the compressed zone are released
    /// before any victim is compressed, so victims may reuse that space.
    pub(crate) fn swap_in(&mut self, handle: BlockHandle) {
        let page_size = self.config.page_size;

        let block = match self.blocks.remove(handle) {
            Some(block) => block,
            None => fatal!("Block {:?} does not exist", handle),
        };

        let needed = block.uncompressed_page_count(page_size);
        if !block.is_vpn_list_set(page_size) {
            fatal!(
                "Descriptor mismatch for {:?}: {} vpns for {} pages",
                handle,
                block.vpn_list().len(),
                needed
            );
        }

        let mut compressed = vec![0u8; block.compressed_byte_length()];
        self.read_physical(self.config.make_address(block.start_ppn(), 0), &mut compressed);
        self.allocator
            .release_run(block.start_ppn(), block.compressed_page_count(page_size));

        let data = match self.compression.decompress(&compressed, needed * page_size) {
            Ok(data) => data,
            Err(err) => fatal!("Could not decompress block {:?}: {:?}", handle, err),
        };
        if data.len() != block.uncompressed_byte_length() {
            fatal!(
                "Block {:?} decompressed to {} bytes instead of {}",
                handle,
                data.len(),
                block.uncompressed_byte_length()
            );
        }

        let slots = match self.allocator.allocate_free_run_uncompressed(needed) {
            Some(slots) => slots,
            None => self.collect_swap_in_slots(needed),
        };

        for ((vpn, ppn), page) in block
            .vpn_list()
            .iter()
            .zip(slots.iter())
            .zip(data.chunks(page_size))
        {
            self.zero_page(*ppn);
            self.write_physical(self.config.make_address(*ppn, 0), page);

            match self.page_table.get_mut(*vpn) {
                Some(entry) => entry.mark_resident(*ppn),
                None => fatal!("vpn {} of block {:?} is not mapped", vpn, handle),
            }
            trace!("Paged in vpn {} to ppn {}", vpn, ppn);
        }

        self.statistics.swap_ins += 1;
        self.statistics.pages_decompressed += needed as u64;
        debug!(
            "Swapped in {:?}: vpns {:?} to ppns {:?}",
            handle,
            block.vpn_list(),
            slots
        );
    }

    /// Makes room for `needed` pages by evicting victims and returns the pages to use.
    ///
    /// Pages freed by victims are used first, then the remaining free pages.
    /// All returned pages are marked as used.
    fn collect_swap_in_slots(&mut self, needed: usize) -> Vec<usize> {
        let free = self.allocator.free_uncompressed_pages(needed);
        let shortfall = needed - free.len();
        let requested = needed.min(round_up_to_nearest(shortfall, self.config.group_size));

        let victims = self.select_victims(requested);
        if victims.len() + free.len() < needed {
            fatal!(
                "Out of memory: {} pages needed for swap in, {} free and {} victims",
                needed,
                free.len(),
                victims.len()
            );
        }

        let mut slots = if victims.is_empty() {
            Vec::new()
        } else {
            match self.compress_victims(&victims) {
                Ok((_, freed)) => freed,
                Err(()) => fatal!(
                    "Out of memory: no contiguous space in the compressed zone to evict {:?}",
                    victims
                ),
            }
        };

        // victims may free more pages than needed
        for ppn in slots.iter().skip(needed) {
            self.allocator.mark_free(*ppn);
        }
        slots.truncate(needed);

        for ppn in free.into_iter().take(needed - slots.len()) {
            self.allocator.mark_used(ppn);
            slots.push(ppn);
        }

        slots
    }
}
