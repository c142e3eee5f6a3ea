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

use crate::compressed_block::BlockHandle;

/// Maps one virtual page either to a resident physical page or into a compressed block.
///
/// Exactly one of `valid` and `compressed` is set for every existing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationEntry {
    pub(crate) vpn: usize,
    pub(crate) ppn: usize,
    pub(crate) valid: bool,
    pub(crate) read_only: bool,
    pub(crate) used: bool,
    pub(crate) dirty: bool,
    pub(crate) compressed: bool,
    pub(crate) compress_offset: Option<usize>,
    pub(crate) compress_block: Option<BlockHandle>,
}

impl TranslationEntry {
    /// Creates an entry for a page that is resident at `ppn`
    pub(crate) fn resident(vpn: usize, ppn: usize, read_only: bool) -> Self {
        Self {
            vpn,
            ppn,
            valid: true,
            read_only,
            used: false,
            dirty: false,
            compressed: false,
            compress_offset: None,
            compress_block: None,
        }
    }

    /// Creates an entry for a page that is stored at position `offset` of `block`
    pub(crate) fn compressed(
        vpn: usize,
        block: BlockHandle,
        offset: usize,
        read_only: bool,
    ) -> Self {
        let mut entry = Self::resident(vpn, 0, read_only);
        entry.mark_compressed(block, offset);
        entry
    }

    /// Page was evicted into `block`
    pub(crate) fn mark_compressed(&mut self, block: BlockHandle, offset: usize) {
        self.valid = false;
        self.compressed = true;
        self.compress_block = Some(block);
        self.compress_offset = Some(offset);
    }

    /// Page was paged in again. Access bits are reset as the page was not accessed since.
    pub(crate) fn mark_resident(&mut self, ppn: usize) {
        self.ppn = ppn;
        self.valid = true;
        self.compressed = false;
        self.compress_block = None;
        self.compress_offset = None;
        self.used = false;
        self.dirty = false;
    }

    pub fn vpn(&self) -> usize {
        self.vpn
    }

    /// Physical page of this entry, only available if the page is resident
    pub fn ppn(&self) -> Option<usize> {
        if self.valid {
            Some(self.ppn)
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_used(&self) -> bool {
        self.used
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn compress_offset(&self) -> Option<usize> {
        self.compress_offset
    }

    pub fn compress_block(&self) -> Option<BlockHandle> {
        self.compress_block
    }

    /// Used by eviction policies to give a page a second chance
    pub fn clear_used(&mut self) {
        self.used = false;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Per process translation table, indexed by vpn.
///
/// Pages that were never touched don't have an entry.
#[derive(Debug)]
pub struct PageTable {
    entries: Vec<Option<TranslationEntry>>,
}

impl PageTable {
    pub fn new(num_virtual_pages: usize) -> Self {
        Self {
            entries: vec![None; num_virtual_pages],
        }
    }

    /// Number of virtual pages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, vpn: usize) -> Option<&TranslationEntry> {
        self.entries.get(vpn)?.as_ref()
    }

    pub fn get_mut(&mut self, vpn: usize) -> Option<&mut TranslationEntry> {
        self.entries.get_mut(vpn)?.as_mut()
    }

    pub fn is_resident(&self, vpn: usize) -> bool {
        self.get(vpn).map_or(false, |entry| entry.valid)
    }

    pub(crate) fn insert(&mut self, entry: TranslationEntry) {
        let vpn = entry.vpn;
        self.entries[vpn] = Some(entry);
    }

    pub(crate) fn remove(&mut self, vpn: usize) -> Option<TranslationEntry> {
        self.entries.get_mut(vpn)?.take()
    }

    /// Iterates over all existing entries, ordered by vpn
    pub fn iter(&self) -> impl Iterator<Item = &TranslationEntry> {
        self.entries.iter().filter_map(|entry| entry.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TranslationEntry> {
        self.entries.iter_mut().filter_map(|entry| entry.as_mut())
    }

    pub fn resident_count(&self) -> usize {
        self.iter().filter(|entry| entry.valid).count()
    }

    pub fn compressed_count(&self) -> usize {
        self.iter().filter(|entry| entry.compressed).count()
    }

    pub(crate) fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = None;
        }
    }
}
