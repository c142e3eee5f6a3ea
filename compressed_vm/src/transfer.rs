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

use log::warn;

#[cfg(feature = "transfer_trace_prints")]
use log::trace;

use crate::{
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
    /// Returns the physical page backing `vpn` and faults it in if necessary.
    ///
    /// Returns `None` for pages outside of the address space and for writes to read only pages.
    /// In the latter case, a compressed page stays compressed.
    fn translate(&mut self, vpn: usize, is_write: bool) -> Option<usize> {
        if vpn >= self.page_table.len() {
            return None;
        }

        if is_write && self.page_table.get(vpn).is_some_and(|entry| entry.read_only) {
            warn!("Write to read only vpn {} denied", vpn);
            return None;
        }

        let ppn = self.resolve_fault(vpn);

        let entry = self.page_table.get_mut(vpn)?;
        entry.used = true;
        if is_write {
            entry.dirty = true;
        }

        Some(ppn)
    }

    /// Copies virtual memory starting at `vaddr` into `data`.
    /// Returns the number of copied bytes.
    pub fn read_virtual_memory(&mut self, vaddr: usize, data: &mut [u8]) -> usize {
        let len = data.len();
        self.read_virtual_memory_range(vaddr, data, 0, len)
    }

    /// Copies `length` bytes of virtual memory starting at `vaddr` into `data[offset..]`.
    ///
    /// Stops at the first page that can not be translated and returns the number of bytes
    /// copied until then.
    pub fn read_virtual_memory_range(
        &mut self,
        vaddr: usize,
        data: &mut [u8],
        offset: usize,
        length: usize,
    ) -> usize {
        assert!(offset + length <= data.len());

        self.transfer(vaddr, length, false, |space, phys_addr, done, amount| {
            space.read_physical(phys_addr, &mut data[offset + done..offset + done + amount]);
        })
    }

    /// Copies `data` into virtual memory starting at `vaddr`.
    /// Returns the number of copied bytes.
    pub fn write_virtual_memory(&mut self, vaddr: usize, data: &[u8]) -> usize {
        self.write_virtual_memory_range(vaddr, data, 0, data.len())
    }

    /// Copies `data[offset..offset + length]` into virtual memory starting at `vaddr`.
    ///
    /// Stops at the first page that can not be translated (or is read only) and returns
    /// the number of bytes copied until then.
    pub fn write_virtual_memory_range(
        &mut self,
        vaddr: usize,
        data: &[u8],
        offset: usize,
        length: usize,
    ) -> usize {
        assert!(offset + length <= data.len());

        self.transfer(vaddr, length, true, |space, phys_addr, done, amount| {
            space.write_physical(phys_addr, &data[offset + done..offset + done + amount]);
        })
    }

    /// Reads a NUL terminated string of at most `max_length` bytes (without the terminator).
    ///
    /// Returns `None` if no terminator was found or the bytes are not valid UTF-8.
    pub fn read_virtual_memory_string(
        &mut self,
        vaddr: usize,
        max_length: usize,
    ) -> Option<String> {
        // nothing beyond the end of the address space can be read anyway
        let available = self.config.max_virtual_address().saturating_sub(vaddr);
        let mut bytes = vec![0u8; max_length.saturating_add(1).min(available)];
        let read = self.read_virtual_memory(vaddr, &mut bytes);

        let end = bytes[..read].iter().position(|b| *b == 0)?;
        bytes.truncate(end);

        String::from_utf8(bytes).ok()
    }

    /// Walks over all pages of `vaddr..vaddr + length` and calls `copy` with
    /// the physical address, the bytes done so far and the amount for the current page.
    fn transfer<F: FnMut(&mut Self, usize, usize, usize)>(
        &mut self,
        vaddr: usize,
        length: usize,
        is_write: bool,
        mut copy: F,
    ) -> usize {
        let page_size = self.config.page_size;
        let mut done = 0;

        while done < length {
            let addr = match vaddr.checked_add(done) {
                Some(addr) => addr,
                None => break,
            };

            let vpn = self.config.page_from_address(addr);
            let page_offset = self.config.offset_from_address(addr);
            let amount = (page_size - page_offset).min(length - done);

            let ppn = match self.translate(vpn, is_write) {
                Some(ppn) => ppn,
                None => break,
            };

            #[cfg(feature = "transfer_trace_prints")]
            trace!(
                "{} {} bytes at vpn {} (ppn {}) offset {}",
                if is_write { "write" } else { "read" },
                amount,
                vpn,
                ppn,
                page_offset
            );

            let phys_addr = self.config.make_address(ppn, page_offset);
            copy(self, phys_addr, done, amount);
            done += amount;
        }

        if done < length {
            warn!(
                "Transfer at {:#x} stopped after {} of {} bytes",
                vaddr, done, length
            );
        }

        done
    }
}
