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

use log::{debug, info};

use crate::{
    compressed_block::{BlockHandle, CompressedBlock, CompressedBlockStore},
    cvm_config::CVMConfig,
    modules::{
        compression::{CompressionModule, Lz4CompressionModule},
        physical_allocator::{BitmapPhysicalAllocator, PhysicalAllocatorModule},
        physical_memory::{BufferPhysicalMemory, PhysicalMemoryModule},
        victim_selection::{ClockVictimSelectionModule, VictimSelectionModule},
    },
    page_table::{PageTable, TranslationEntry},
    statistics::CVMStatistics,
    util::{ceil_div, fatal},
};

/// Address space with the default modules: bitmap allocator, lz4, clock eviction
/// and physical memory inside of a heap buffer.
pub type DefaultCVMAddressSpace = CVMAddressSpace<
    BitmapPhysicalAllocator,
    Lz4CompressionModule,
    ClockVictimSelectionModule,
    BufferPhysicalMemory,
>;

/// Virtual memory of one process.
///
/// Physical memory is split into an uncompressed zone, which holds all resident pages,
/// and a compressed zone. If the uncompressed zone runs full, groups of resident pages
/// are compressed into the compressed zone and paged in again on their next access.
pub struct CVMAddressSpace<
    A: PhysicalAllocatorModule,
    C: CompressionModule,
    V: VictimSelectionModule,
    P: PhysicalMemoryModule,
> {
    pub(crate) config: CVMConfig,
    pub(crate) page_table: PageTable,
    pub(crate) allocator: A,
    pub(crate) compression: C,
    pub(crate) victim_selection: V,
    pub(crate) memory: P,
    pub(crate) blocks: CompressedBlockStore,
    pub(crate) statistics: CVMStatistics,
}

impl DefaultCVMAddressSpace {
    /// Creates an address space with the default modules and enough physical memory for `config`
    pub fn with_config(config: CVMConfig) -> Result<Self, ()> {
        Self::new(
            config,
            BufferPhysicalMemory::with_pages(config.page_size, config.num_phys_pages),
            ClockVictimSelectionModule::new(),
        )
    }
}

impl<
        A: PhysicalAllocatorModule,
        C: CompressionModule,
        V: VictimSelectionModule,
        P: PhysicalMemoryModule,
    > CVMAddressSpace<A, C, V, P>
{
    pub fn new(config: CVMConfig, memory: P, victim_selection: V) -> Result<Self, ()> {
        config.validate()?;

        if memory.get_max_size() < config.physical_memory_size() {
            return Err(());
        }

        let mut allocator = A::new();
        allocator.init(config.num_phys_pages, config.compress_start)?;

        info!(
            "Created address space: uncompressed={}, compressed={}, page_size={}, group_size={}",
            config.uncompressed_pages(),
            config.compressed_pages(),
            config.page_size,
            config.group_size
        );

        Ok(Self {
            config,
            page_table: PageTable::new(config.num_virtual_pages),
            allocator,
            compression: C::new(),
            victim_selection,
            memory,
            blocks: CompressedBlockStore::new(),
            statistics: CVMStatistics::default(),
        })
    }

    pub fn config(&self) -> &CVMConfig {
        &self.config
    }

    pub fn entry(&self, vpn: usize) -> Option<&TranslationEntry> {
        self.page_table.get(vpn)
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn block(&self, handle: BlockHandle) -> Option<&CompressedBlock> {
        self.blocks.get(handle)
    }

    pub fn blocks(&self) -> &CompressedBlockStore {
        &self.blocks
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn statistics(&self) -> &CVMStatistics {
        &self.statistics
    }

    pub fn victim_selection_mut(&mut self) -> &mut V {
        &mut self.victim_selection
    }

    /// Maps `vpn` and copies `contents` to the beginning of the page, the rest of it is zeroed.
    ///
    /// This is the entry point for the program loader. If the uncompressed zone is full,
    /// other pages get evicted just like for a normal page fault.
    pub fn load_page(&mut self, vpn: usize, contents: &[u8], read_only: bool) -> Result<usize, ()> {
        if vpn >= self.page_table.len()
            || self.page_table.get(vpn).is_some()
            || contents.len() > self.config.page_size
        {
            return Err(());
        }

        let ppn = self.map_zeroed_page(vpn);
        self.write_physical(self.config.make_address(ppn, 0), contents);

        let entry = self.page_table.get_mut(vpn).expect("page was mapped just now");
        entry.read_only = read_only;

        Ok(ppn)
    }

    /// Loads `contents` to the pages starting at `first_vpn` directly into the compressed zone.
    ///
    /// Every `group_size` pages form one compressed block, the last block may hold less pages.
    /// Returns the number of created blocks.
    /// On failure, none of the pages is mapped.
    pub fn load_pages_compressed(
        &mut self,
        first_vpn: usize,
        contents: &[u8],
        read_only: bool,
    ) -> Result<usize, ()> {
        let page_size = self.config.page_size;
        let page_count = ceil_div(contents.len(), page_size);

        let end_vpn = first_vpn.checked_add(page_count).ok_or(())?;
        if end_vpn > self.page_table.len() {
            return Err(());
        }
        if (first_vpn..end_vpn).any(|vpn| self.page_table.get(vpn).is_some()) {
            return Err(());
        }

        let mut created = Vec::new();
        for (group_index, chunk) in contents.chunks(self.config.group_size * page_size).enumerate()
        {
            let mut buffer = chunk.to_vec();
            buffer.resize(ceil_div(chunk.len(), page_size) * page_size, 0);

            let group_first_vpn = first_vpn + group_index * self.config.group_size;
            let vpns: Vec<usize> =
                (group_first_vpn..group_first_vpn + buffer.len() / page_size).collect();

            match self.store_compressed(&buffer, &vpns) {
                Some(handle) => {
                    for (offset, vpn) in vpns.iter().enumerate() {
                        self.page_table.insert(TranslationEntry::compressed(
                            *vpn, handle, offset, read_only,
                        ));
                    }
                    created.push(handle);
                }
                None => {
                    debug!(
                        "No space to load vpn {}..{} compressed, rolling back {} blocks",
                        first_vpn,
                        end_vpn,
                        created.len()
                    );

                    for handle in created {
                        self.discard_block(handle);
                    }
                    return Err(());
                }
            }
        }

        for handle in created.iter() {
            self.record_block_statistics(*handle);
        }

        Ok(created.len())
    }

    /// Releases all physical pages and compressed blocks of this address space.
    pub fn unload(&mut self) {
        let page_size = self.config.page_size;

        for entry in self.page_table.iter() {
            if entry.valid {
                self.allocator.mark_free(entry.ppn);
            }
        }

        for (_, block) in self.blocks.iter() {
            self.allocator
                .release_run(block.start_ppn(), block.compressed_page_count(page_size));
        }

        debug!(
            "Unloaded address space: {} resident pages, {} compressed blocks",
            self.page_table.resident_count(),
            self.blocks.len()
        );

        self.blocks.clear();
        self.page_table.clear();
    }

    /// Compresses `data` and stores it in a new block inside of the compressed zone.
    /// The translation entries of `vpns` are not touched.
    ///
    /// Returns `None` if there is no contiguous run of free pages in the compressed zone.
    /// Statistics are not updated, see [`Self::record_block_statistics`].
    pub(crate) fn store_compressed(&mut self, data: &[u8], vpns: &[usize]) -> Option<BlockHandle> {
        let page_size = self.config.page_size;
        if vpns.len() != ceil_div(data.len(), page_size) {
            fatal!(
                "Descriptor mismatch: {} vpns for {} uncompressed bytes",
                vpns.len(),
                data.len()
            );
        }

        let compressed = self.compression.compress(data);
        let page_count = ceil_div(compressed.len(), page_size).max(1);
        let start_ppn = self.allocator.allocate_contiguous_run_compressed(page_count)?;

        let mut block = CompressedBlock::new(start_ppn, compressed.len(), data.len());
        for vpn in vpns {
            block.push_vpn(*vpn);
        }
        debug_assert!(block.is_vpn_list_set(page_size));

        self.write_physical(self.config.make_address(start_ppn, 0), &compressed);

        debug!(
            "Compressed vpns {:?}: {} -> {} bytes at ppn {} ({} pages)",
            vpns,
            data.len(),
            compressed.len(),
            start_ppn,
            page_count
        );

        Some(self.blocks.insert(block))
    }

    /// Counts a block that stays in the compressed zone
    pub(crate) fn record_block_statistics(&mut self, handle: BlockHandle) {
        if let Some(block) = self.blocks.get(handle) {
            self.statistics.record_compression(
                block.vpn_list().len(),
                block.uncompressed_byte_length(),
                block.compressed_byte_length(),
            );
        }
    }

    /// Drops a block together with all of its pages without paging them in
    fn discard_block(&mut self, handle: BlockHandle) {
        if let Some(block) = self.blocks.remove(handle) {
            self.allocator.release_run(
                block.start_ppn(),
                block.compressed_page_count(self.config.page_size),
            );
            for vpn in block.vpn_list() {
                self.page_table.remove(*vpn);
            }
        }
    }

    pub(crate) fn read_physical(&mut self, offset: usize, dest: &mut [u8]) {
        if self.memory.read(offset, dest).is_err() {
            fatal!(
                "Physical memory read of {} bytes at {} failed",
                dest.len(),
                offset
            );
        }
    }

    pub(crate) fn write_physical(&mut self, offset: usize, src: &[u8]) {
        if self.memory.write(offset, src).is_err() {
            fatal!(
                "Physical memory write of {} bytes at {} failed",
                src.len(),
                offset
            );
        }
    }

    pub(crate) fn zero_page(&mut self, ppn: usize) {
        let offset = self.config.make_address(ppn, 0);
        if self.memory.fill(offset, self.config.page_size, 0).is_err() {
            fatal!("Could not zero physical page {}", ppn);
        }
    }

    /// Checks that the translation table, the bitmap and the compressed blocks agree.
    ///
    /// Panics on the first violation.
    pub fn check_integrity(&self) {
        let page_size = self.config.page_size;
        let compress_start = self.config.compress_start;

        // who claims which physical page
        let mut claimed: Vec<Option<usize>> = vec![None; self.config.num_phys_pages];

        for (vpn, entry) in self.page_table.iter().map(|entry| (entry.vpn, entry)) {
            assert!(
                entry.valid != entry.compressed,
                "vpn {}: valid={} compressed={}",
                vpn,
                entry.valid,
                entry.compressed
            );

            if entry.valid {
                let ppn = entry.ppn;
                assert!(
                    ppn < compress_start,
                    "vpn {} is resident in compressed zone ({})",
                    vpn,
                    ppn
                );
                assert!(self.allocator.is_used(ppn), "ppn {} of vpn {} is marked free", ppn, vpn);
                assert!(
                    claimed[ppn].is_none(),
                    "ppn {} is claimed by vpn {} and {:?}",
                    ppn,
                    vpn,
                    claimed[ppn]
                );
                claimed[ppn] = Some(vpn);
                assert!(entry.compress_block.is_none() && entry.compress_offset.is_none());
            } else {
                let handle = entry
                    .compress_block
                    .unwrap_or_else(|| panic!("compressed vpn {} has no block", vpn));
                let offset = entry
                    .compress_offset
                    .unwrap_or_else(|| panic!("compressed vpn {} has no offset", vpn));
                let block = self
                    .blocks
                    .get(handle)
                    .unwrap_or_else(|| panic!("block {:?} of vpn {} does not exist", handle, vpn));
                assert_eq!(
                    block.vpn(offset),
                    Some(vpn),
                    "block {:?} does not back vpn {}",
                    handle,
                    vpn
                );
            }
        }

        for (handle, block) in self.blocks.iter() {
            assert!(block.is_vpn_list_set(page_size), "vpn list of block {:?} is not set", handle);

            for (offset, vpn) in block.vpn_list().iter().enumerate() {
                let entry = self
                    .page_table
                    .get(*vpn)
                    .unwrap_or_else(|| panic!("vpn {} of block {:?} is not mapped", vpn, handle));
                assert_eq!(entry.compress_block, Some(handle));
                assert_eq!(entry.compress_offset, Some(offset));
            }

            let start = block.start_ppn();
            for ppn in start..start + block.compressed_page_count(page_size) {
                assert!(ppn >= compress_start && ppn < self.config.num_phys_pages);
                assert!(
                    self.allocator.is_used(ppn),
                    "ppn {} of block {:?} is marked free",
                    ppn,
                    handle
                );
                assert!(claimed[ppn].is_none(), "ppn {} is claimed twice", ppn);
                claimed[ppn] = Some(usize::MAX);
            }
        }

        // no page leaked
        for ppn in 0..self.config.num_phys_pages {
            assert_eq!(
                self.allocator.is_used(ppn),
                claimed[ppn].is_some(),
                "bitmap and mappings disagree for ppn {}",
                ppn
            );
        }
    }
}
