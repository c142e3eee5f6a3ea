mod buffer;

pub use buffer::BufferPhysicalMemory;

/// Raw physical memory, addressed by byte offsets.
///
/// The offset of a byte inside of physical page `ppn` is `ppn * page_size + page_offset`.
/// Compressed blocks are read and written through this interface directly,
/// without any address translation.
pub trait PhysicalMemoryModule {
    /// Reads the region `[offset, offset + dest.len())` into `dest`.
    ///
    /// If this call fails, nothing was written to `dest`.
    fn read(&mut self, offset: usize, dest: &mut [u8]) -> Result<(), ()>;

    /// Writes the region `src` to `[offset, offset + src.len())`
    fn write(&mut self, offset: usize, src: &[u8]) -> Result<(), ()>;

    /// Returns the size in bytes of this memory
    fn get_max_size(&self) -> usize;

    /// Sets the region `[offset, offset + len)` to `value`
    fn fill(&mut self, offset: usize, len: usize, value: u8) -> Result<(), ()> {
        let buffer = vec![value; len];
        self.write(offset, &buffer)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::PhysicalMemoryModule;

    fn gen_number(i: usize) -> u8 {
        (i * 3 + (i % 3) * 7 + (i % 11) * 51) as u8
    }

    pub(super) const PHYSICAL_MEMORY_NORMAL_TEST_SIZE: usize = 4096;

    /// test if write saves all data and read restores all of it
    pub(super) fn test_physical_memory_normal<T: PhysicalMemoryModule>(mut module: T) {
        const SUB_TEST_SIZE: usize = PHYSICAL_MEMORY_NORMAL_TEST_SIZE / 32;

        let mut source_slice = [0u8; PHYSICAL_MEMORY_NORMAL_TEST_SIZE];
        for i in 0..PHYSICAL_MEMORY_NORMAL_TEST_SIZE {
            source_slice[i] = gen_number(i);
        }

        for i in 0..PHYSICAL_MEMORY_NORMAL_TEST_SIZE / SUB_TEST_SIZE {
            let offset = i * SUB_TEST_SIZE;
            module
                .write(offset, &source_slice[offset..offset + SUB_TEST_SIZE])
                .unwrap();
        }

        let mut test_slice = [0u8; SUB_TEST_SIZE];
        for i in 0..PHYSICAL_MEMORY_NORMAL_TEST_SIZE / SUB_TEST_SIZE {
            let offset = i * SUB_TEST_SIZE;
            module.read(offset, &mut test_slice).unwrap();

            for x in 0..SUB_TEST_SIZE {
                assert_eq!(test_slice[x], source_slice[offset + x]);
            }
        }
    }

    /// accesses that cross the end of the memory have to fail without touching anything
    pub(super) fn test_physical_memory_bounds<T: PhysicalMemoryModule>(mut module: T) {
        let size = module.get_max_size();
        module.fill(0, size, 7).unwrap();

        assert!(module.write(size - 2, &[1, 2, 3]).is_err());
        assert!(module.fill(size, 1, 0).is_err());

        let mut dest = [0u8; 3];
        assert!(module.read(size - 2, &mut dest).is_err());
        assert_eq!(dest, [0, 0, 0]);

        module.read(size - 3, &mut dest).unwrap();
        assert_eq!(dest, [7, 7, 7]);

        // empty accesses at the border are fine
        module.read(size, &mut []).unwrap();
        module.write(size, &[]).unwrap();
    }
}
