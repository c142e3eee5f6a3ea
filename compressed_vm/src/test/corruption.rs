use crate::{
    cvm_config::CVMConfig,
    modules::compression::{CodecError, CompressionModule, Lz4CompressionModule},
};

use super::{get_test_space, get_test_space_with, uniform_page, TestAddressSpaceWith};

/// Stores data uncompressed but loses the last byte when decoding
struct LossyCompressionModule;

impl CompressionModule for LossyCompressionModule {
    fn new() -> Self {
        Self
    }

    fn compress(&mut self, src: &[u8]) -> Vec<u8> {
        src.to_vec()
    }

    fn decompress(&mut self, src: &[u8], expected_max_len: usize) -> Result<Vec<u8>, CodecError> {
        assert!(src.len() <= expected_max_len);
        Ok(src[..src.len().saturating_sub(1)].to_vec())
    }
}

const PAGE_SIZE: usize = 64;

/// Writes vpn 0 and 1 and compresses both into one block
fn space_with_block<C: CompressionModule>() -> TestAddressSpaceWith<C> {
    let mut space = get_test_space_with(CVMConfig::new(PAGE_SIZE, 16, 8, 2));

    for vpn in 0..2 {
        let page = uniform_page(PAGE_SIZE, vpn as u8 + 1);
        assert_eq!(space.write_virtual_memory(vpn * PAGE_SIZE, &page), PAGE_SIZE);
    }
    space.swap_out(&[0, 1]).unwrap();
    space.check_integrity();

    space
}

#[test]
#[should_panic(expected = "Could not decompress block")]
fn test_corrupted_compressed_zone() {
    let mut space = space_with_block::<Lz4CompressionModule>();
    let handle = space.entry(0).unwrap().compress_block().unwrap();
    let start_ppn = space.block(handle).unwrap().start_ppn();

    // size header now claims far more bytes than the block can hold
    let offset = space.config().make_address(start_ppn, 0);
    space.write_physical(offset, &[0xFF; 4]);

    let mut buffer = [0u8; 1];
    space.read_virtual_memory(0, &mut buffer);
}

#[test]
#[should_panic(expected = "decompressed to 127 bytes instead of 128")]
fn test_decompressed_length_mismatch() {
    let mut space = space_with_block::<LossyCompressionModule>();

    let mut buffer = [0u8; 1];
    space.read_virtual_memory(PAGE_SIZE, &mut buffer);
}

#[test]
#[should_panic(expected = "Descriptor mismatch for")]
fn test_vpn_list_does_not_match_block() {
    let mut space = space_with_block::<Lz4CompressionModule>();
    let handle = space.entry(0).unwrap().compress_block().unwrap();

    let mut block = space.blocks.remove(handle).unwrap();
    block.push_vpn(7);
    assert_eq!(space.blocks.insert(block), handle);

    let mut buffer = [0u8; 1];
    space.read_virtual_memory(0, &mut buffer);
}

#[test]
#[should_panic(expected = "Descriptor mismatch: 2 vpns for 192 uncompressed bytes")]
fn test_store_with_wrong_vpn_count() {
    let mut space = get_test_space(CVMConfig::new(PAGE_SIZE, 16, 8, 2));
    space.store_compressed(&[0u8; 3 * PAGE_SIZE], &[0, 1]);
}
