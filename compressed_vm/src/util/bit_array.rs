use std::fmt::Debug;

use super::ceil_div;

pub(crate) struct BitArray {
    arr: Vec<u8>,
    len: usize,
}

impl BitArray {
    /// Creates a new bit array with `len` bits, all unset
    pub(crate) fn new(len: usize) -> Self {
        BitArray {
            arr: vec![0; ceil_div(len, 8)],
            len,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn set(&mut self, value: bool, index: usize) {
        assert!(index < self.len, "bit index {} out of range ({})", index, self.len);

        let arr_index = index / 8;
        let internal_index = index % 8;

        let item = &mut self.arr[arr_index];
        if value {
            // set bit
            *item |= 1u8 << internal_index;
        } else {
            // unset bit
            *item &= !(1u8 << internal_index);
        }
    }

    pub(crate) fn is_set(&self, index: usize) -> bool {
        assert!(index < self.len, "bit index {} out of range ({})", index, self.len);

        let arr_index = index / 8;
        let internal_index = index % 8;

        let item = self.arr[arr_index];
        (item & (1u8 << internal_index)) != 0
    }
}

impl Debug for BitArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.len {
            write!(f, "{}", if self.is_set(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}
