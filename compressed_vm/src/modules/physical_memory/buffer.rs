use super::PhysicalMemoryModule;

/// Physical memory that lives inside of a heap allocated buffer
pub struct BufferPhysicalMemory {
    memory: Vec<u8>,
}

impl BufferPhysicalMemory {
    /// Creates a new zeroed memory of `size` bytes
    pub fn new(size: usize) -> Self {
        Self {
            memory: vec![0; size],
        }
    }

    /// Creates a memory that is big enough for `num_phys_pages` pages of `page_size` bytes
    pub fn with_pages(page_size: usize, num_phys_pages: usize) -> Self {
        Self::new(page_size * num_phys_pages)
    }

    fn range(&self, offset: usize, len: usize) -> Result<std::ops::Range<usize>, ()> {
        let end = offset.checked_add(len).ok_or(())?;
        if end > self.memory.len() {
            return Err(());
        }

        Ok(offset..end)
    }
}

impl PhysicalMemoryModule for BufferPhysicalMemory {
    fn read(&mut self, offset: usize, dest: &mut [u8]) -> Result<(), ()> {
        let range = self.range(offset, dest.len())?;
        dest.copy_from_slice(&self.memory[range]);

        Ok(())
    }

    fn write(&mut self, offset: usize, src: &[u8]) -> Result<(), ()> {
        let range = self.range(offset, src.len())?;
        self.memory[range].copy_from_slice(src);

        Ok(())
    }

    fn get_max_size(&self) -> usize {
        self.memory.len()
    }

    fn fill(&mut self, offset: usize, len: usize, value: u8) -> Result<(), ()> {
        let range = self.range(offset, len)?;
        self.memory[range].fill(value);

        Ok(())
    }
}
