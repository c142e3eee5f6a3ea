use crate::util::ceil_div;

/// Stable handle of a [`CompressedBlock`] inside of a [`CompressedBlockStore`].
///
/// Every translation entry of a page that lives inside of a block stores the
/// handle of that block instead of a reference to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(usize);

impl BlockHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Describes one compressed run of physical pages and the virtual pages it backs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBlock {
    /// first physical page of the compressed byte stream
    start_ppn: usize,

    /// actual length of the compressed stream
    compressed_byte_length: usize,

    /// length of the page run before compression
    uncompressed_byte_length: usize,

    /// vpn of each page in this block, in the order they were compressed
    vpn_list: Vec<usize>,
}

impl CompressedBlock {
    pub(crate) fn new(
        start_ppn: usize,
        compressed_byte_length: usize,
        uncompressed_byte_length: usize,
    ) -> Self {
        Self {
            start_ppn,
            compressed_byte_length,
            uncompressed_byte_length,
            vpn_list: Vec::new(),
        }
    }

    pub fn start_ppn(&self) -> usize {
        self.start_ppn
    }

    pub fn compressed_byte_length(&self) -> usize {
        self.compressed_byte_length
    }

    pub fn uncompressed_byte_length(&self) -> usize {
        self.uncompressed_byte_length
    }

    pub fn vpn_list(&self) -> &[usize] {
        &self.vpn_list
    }

    /// Returns the vpn that is stored at position `offset` of this block
    pub fn vpn(&self, offset: usize) -> Option<usize> {
        self.vpn_list.get(offset).copied()
    }

    pub(crate) fn push_vpn(&mut self, vpn: usize) {
        self.vpn_list.push(vpn);
    }

    /// Number of pages needed to hold the uncompressed data again
    pub fn uncompressed_page_count(&self, page_size: usize) -> usize {
        ceil_div(self.uncompressed_byte_length, page_size)
    }

    /// Number of physical pages the compressed stream occupies
    pub fn compressed_page_count(&self, page_size: usize) -> usize {
        ceil_div(self.compressed_byte_length, page_size).max(1)
    }

    /// A block is only usable if there is exactly one vpn for every uncompressed page
    pub fn is_vpn_list_set(&self, page_size: usize) -> bool {
        self.vpn_list.len() == self.uncompressed_page_count(page_size)
    }
}

/// Arena of compressed blocks. Freed slots are reused by later insertions.
#[derive(Debug, Default)]
pub struct CompressedBlockStore {
    slots: Vec<Option<CompressedBlock>>,
    free_slots: Vec<usize>,
    len: usize,
}

impl CompressedBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, block: CompressedBlock) -> BlockHandle {
        self.len += 1;

        if let Some(index) = self.free_slots.pop() {
            debug_assert!(self.slots[index].is_none());
            self.slots[index] = Some(block);
            return BlockHandle(index);
        }

        self.slots.push(Some(block));
        BlockHandle(self.slots.len() - 1)
    }

    pub fn get(&self, handle: BlockHandle) -> Option<&CompressedBlock> {
        self.slots.get(handle.0)?.as_ref()
    }

    /// Removes the block, its handle becomes invalid and may be handed out again
    pub(crate) fn remove(&mut self, handle: BlockHandle) -> Option<CompressedBlock> {
        let block = self.slots.get_mut(handle.0)?.take()?;
        self.free_slots.push(handle.0);
        self.len -= 1;

        Some(block)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockHandle, &CompressedBlock)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|block| (BlockHandle(index), block)))
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_slots.clear();
        self.len = 0;
    }
}

#[cfg(test)]
mod test {
    use super::{CompressedBlock, CompressedBlockStore};

    #[test]
    fn test_compressed_block_page_counts() {
        let mut block = CompressedBlock::new(12, 13, 8);
        assert_eq!(block.compressed_page_count(4), 4);
        assert_eq!(block.uncompressed_page_count(4), 2);
        assert!(!block.is_vpn_list_set(4));

        block.push_vpn(7);
        assert!(!block.is_vpn_list_set(4));
        block.push_vpn(3);
        assert!(block.is_vpn_list_set(4));

        assert_eq!(block.vpn_list(), &[7, 3]);
        assert_eq!(block.vpn(1), Some(3));
        assert_eq!(block.vpn(2), None);

        // uncompressed data that does not fill the last page completely
        let block = CompressedBlock::new(0, 0, 9);
        assert_eq!(block.uncompressed_page_count(4), 3);
        assert_eq!(block.compressed_page_count(4), 1);
    }

    #[test]
    fn test_compressed_block_store_reuses_slots() {
        let mut store = CompressedBlockStore::new();
        assert!(store.is_empty());

        let a = store.insert(CompressedBlock::new(1, 10, 16));
        let b = store.insert(CompressedBlock::new(2, 10, 16));
        let c = store.insert(CompressedBlock::new(3, 10, 16));
        assert_eq!(store.len(), 3);
        assert_ne!(a, b);
        assert_ne!(b, c);

        let removed = store.remove(b).unwrap();
        assert_eq!(removed.start_ppn(), 2);
        assert!(store.get(b).is_none());
        assert!(store.remove(b).is_none());
        assert_eq!(store.len(), 2);

        let d = store.insert(CompressedBlock::new(4, 10, 16));
        assert_eq!(d, b, "free slot should be reused");
        assert_eq!(store.get(d).unwrap().start_ppn(), 4);
        assert_eq!(store.get(a).unwrap().start_ppn(), 1);

        let starts: Vec<usize> = store.iter().map(|(_, block)| block.start_ppn()).collect();
        assert_eq!(starts, vec![1, 4, 3]);

        store.clear();
        assert!(store.is_empty());
        assert!(store.get(a).is_none());
    }
}
