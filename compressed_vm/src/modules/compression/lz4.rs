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

use core::mem::size_of;

use static_assertions::const_assert_eq;

use super::{CodecError, CompressionModule};

/// Length of the little endian size header that precedes every lz4 block
const SIZE_PREFIX_LEN: usize = 4;
const_assert_eq!(SIZE_PREFIX_LEN, size_of::<u32>());

/// LZ4 block compression, the uncompressed length is prepended to every block.
pub struct Lz4CompressionModule;

impl CompressionModule for Lz4CompressionModule {
    fn new() -> Self {
        Self
    }

    fn compress(&mut self, src: &[u8]) -> Vec<u8> {
        lz4_flex::compress_prepend_size(src)
    }

    fn decompress(&mut self, src: &[u8], expected_max_len: usize) -> Result<Vec<u8>, CodecError> {
        if src.len() < SIZE_PREFIX_LEN {
            return Err(CodecError::Malformed);
        }

        let mut header = [0u8; SIZE_PREFIX_LEN];
        header.copy_from_slice(&src[..SIZE_PREFIX_LEN]);
        let expected = u32::from_le_bytes(header) as usize;

        // check before decoding, the header decides how much memory gets reserved
        if expected > expected_max_len {
            return Err(CodecError::LengthMismatch {
                expected: expected_max_len,
                actual: expected,
            });
        }

        let data = lz4_flex::decompress_size_prepended(src).map_err(|_| CodecError::Malformed)?;
        if data.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(data)
    }
}
