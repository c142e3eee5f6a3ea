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

use log::trace;

use super::PhysicalAllocatorModule;
use crate::util::bit_array::BitArray;

/// Simple first-fit allocator, that keeps one bit per physical page.
///
/// Every allocation is a linear scan over the zone in question.
pub struct BitmapPhysicalAllocator {
    bit_list: BitArray,
    compress_start: usize,
}

impl PhysicalAllocatorModule for BitmapPhysicalAllocator {
    fn new() -> Self {
        Self {
            bit_list: BitArray::new(0),
            compress_start: 0,
        }
    }

    fn init(&mut self, num_phys_pages: usize, compress_start: usize) -> Result<(), ()> {
        if compress_start > num_phys_pages {
            return Err(());
        }

        self.bit_list = BitArray::new(num_phys_pages);
        self.compress_start = compress_start;

        Ok(())
    }

    fn num_phys_pages(&self) -> usize {
        self.bit_list.len()
    }

    fn compress_start(&self) -> usize {
        self.compress_start
    }

    fn allocate_one_page_uncompressed(&mut self) -> Option<usize> {
        let ppn = (0..self.compress_start).find(|ppn| !self.bit_list.is_set(*ppn))?;
        self.bit_list.set(true, ppn);

        Some(ppn)
    }

    fn allocate_free_run_uncompressed(&mut self, n: usize) -> Option<Vec<usize>> {
        let pages = self.free_uncompressed_pages(n);
        if pages.len() != n {
            return None;
        }

        for ppn in pages.iter() {
            self.bit_list.set(true, *ppn);
        }

        Some(pages)
    }

    fn allocate_contiguous_run_compressed(&mut self, n: usize) -> Option<usize> {
        debug_assert!(n > 0, "cannot allocate an empty run");
        if n == 0 {
            return None;
        }

        let mut matched_page_cnt = 0;
        let mut start_page = None;

        for ppn in self.compress_start..self.bit_list.len() {
            if self.bit_list.is_set(ppn) {
                matched_page_cnt = 0;
                continue;
            }

            matched_page_cnt += 1;
            if matched_page_cnt == n {
                // enough pages were found
                start_page = Some(ppn + 1 - n);
                break;
            }
        }

        let start_page = start_page?;

        // mark the whole range that was found previously as used
        for ppn in start_page..start_page + n {
            self.bit_list.set(true, ppn);
        }

        trace!("Allocated compressed run [{}, {})", start_page, start_page + n);
        Some(start_page)
    }

    fn free_uncompressed_pages(&self, limit: usize) -> Vec<usize> {
        (0..self.compress_start)
            .filter(|ppn| !self.bit_list.is_set(*ppn))
            .take(limit)
            .collect()
    }

    fn mark_used(&mut self, ppn: usize) {
        self.bit_list.set(true, ppn);
    }

    fn mark_free(&mut self, ppn: usize) {
        self.bit_list.set(false, ppn);
    }

    fn is_used(&self, ppn: usize) -> bool {
        self.bit_list.is_set(ppn)
    }
}
