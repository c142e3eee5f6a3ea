use crate::{
    cvm_config::CVMConfig,
    modules::physical_allocator::PhysicalAllocatorModule,
};

use super::{get_test_space, uniform_page, TestAddressSpace};

const PAGE_CONTENTS: [[u8; 4]; 5] = [
    [1, 2, 3, 4],
    [5, 6, 7, 8],
    [9, 10, 11, 12],
    [13, 14, 15, 16],
    [17, 18, 19, 20],
];

/// page size 4, uncompressed zone 0..4, compressed zone 4..8, groups of 2 pages
fn tiny_space() -> TestAddressSpace {
    get_test_space(CVMConfig::new(4, 8, 4, 2))
}

/// Touches vpn 0 to 3 and then vpn 4, which has to evict vpn 0 and 1
fn fill_and_evict(space: &mut TestAddressSpace) {
    for (vpn, contents) in PAGE_CONTENTS.iter().enumerate().take(4) {
        assert_eq!(space.write_virtual_memory(vpn * 4, contents), 4);
        assert_eq!(space.entry(vpn).unwrap().ppn(), Some(vpn));
    }
    assert_eq!(space.allocator().count_free_uncompressed(), 0);

    assert_eq!(space.write_virtual_memory(16, &PAGE_CONTENTS[4]), 4);
}

#[test]
fn test_first_fault_gets_first_page() {
    let mut space = tiny_space();

    assert_eq!(space.handle_page_fault(0), Ok(0));

    let entry = space.entry(0).unwrap();
    assert!(entry.is_valid());
    assert!(!entry.is_compressed());
    assert_eq!(entry.ppn(), Some(0));
    assert_eq!(space.statistics().zero_fill_faults, 1);

    space.check_integrity();
}

#[test]
fn test_eviction_on_full_uncompressed_zone() {
    let mut space = tiny_space();
    fill_and_evict(&mut space);

    let vpn0 = space.entry(0).unwrap();
    assert!(vpn0.is_compressed());
    assert!(!vpn0.is_valid());
    assert_eq!(vpn0.compress_offset(), Some(0));

    let handle = vpn0.compress_block().unwrap();
    let block = space.block(handle).unwrap();
    assert_eq!(block.vpn_list(), &[0, 1]);
    assert_eq!(block.uncompressed_byte_length(), 8);
    assert_eq!(block.start_ppn(), 4);

    let vpn1 = space.entry(1).unwrap();
    assert_eq!(vpn1.compress_block(), Some(handle));
    assert_eq!(vpn1.compress_offset(), Some(1));

    let vpn4 = space.entry(4).unwrap();
    assert!(vpn4.is_valid());
    assert_eq!(vpn4.ppn(), Some(0));

    // second page of the group is not needed
    assert!(!space.allocator().is_used(1));
    assert_eq!(space.statistics().swap_outs, 1);
    assert_eq!(space.statistics().pages_compressed, 2);

    space.check_integrity();
}

#[test]
fn test_swap_in_restores_whole_group() {
    let mut space = tiny_space();
    fill_and_evict(&mut space);

    let mut buffer = [0u8; 4];
    assert_eq!(space.read_virtual_memory(4, &mut buffer), 4);
    assert_eq!(buffer, PAGE_CONTENTS[1]);

    // victims are used before the free page 1
    assert_eq!(space.entry(0).unwrap().ppn(), Some(2));
    assert_eq!(space.entry(1).unwrap().ppn(), Some(3));
    assert!(!space.allocator().is_used(1));

    // vpn 2 and 3 went to the space the old block occupied
    let handle = space.entry(2).unwrap().compress_block().unwrap();
    let block = space.block(handle).unwrap();
    assert_eq!(block.vpn_list(), &[2, 3]);
    assert_eq!(block.start_ppn(), 4);
    assert_eq!(space.blocks().len(), 1);

    // only the pages of the new block are left in the compressed zone
    assert_eq!(
        space.allocator().count_free_compressed(),
        4 - block.compressed_page_count(4)
    );

    assert_eq!(space.statistics().swap_ins, 1);
    assert_eq!(space.statistics().pages_decompressed, 2);

    space.check_integrity();

    for (vpn, contents) in PAGE_CONTENTS.iter().enumerate() {
        assert_eq!(space.read_virtual_memory(vpn * 4, &mut buffer), 4);
        assert_eq!(&buffer, contents, "content of vpn {} changed", vpn);
        space.check_integrity();
    }
}

#[test]
fn test_swap_in_clears_access_bits() {
    let mut space = tiny_space();
    fill_and_evict(&mut space);

    assert_eq!(space.handle_page_fault(0), Ok(2));

    for vpn in [0, 1] {
        let entry = space.entry(vpn).unwrap();
        assert!(!entry.is_used());
        assert!(!entry.is_dirty());
    }
}

#[test]
fn test_victim_shortfall_uses_free_pages() {
    let mut space = get_test_space(CVMConfig::new(64, 8, 4, 2));

    for vpn in 0..5 {
        let page = uniform_page(64, vpn as u8 + 1);
        assert_eq!(space.write_virtual_memory(vpn * 64, &page), 64);
    }
    assert!(space.entry(0).unwrap().is_compressed());
    assert!(!space.allocator().is_used(1));

    space.victim_selection_mut().limit = Some(1);

    let mut buffer = [0u8; 64];
    assert_eq!(space.read_virtual_memory(0, &mut buffer), 64);
    assert_eq!(buffer.to_vec(), uniform_page(64, 1));

    // one victim, then the free page
    assert_eq!(space.entry(0).unwrap().ppn(), Some(2));
    assert_eq!(space.entry(1).unwrap().ppn(), Some(1));
    assert!(space.entry(2).unwrap().is_compressed());
    assert_eq!(space.statistics().victim_shortfalls, 1);

    space.check_integrity();

    space.victim_selection_mut().limit = None;
    for vpn in 0..5 {
        assert_eq!(space.read_virtual_memory(vpn * 64, &mut buffer), 64);
        assert_eq!(buffer.to_vec(), uniform_page(64, vpn as u8 + 1));
    }
    space.check_integrity();
}

#[test]
#[should_panic(expected = "Out of memory")]
fn test_out_of_memory_without_victims() {
    let mut space = tiny_space();

    for vpn in 0..4 {
        space.handle_page_fault(vpn * 4).unwrap();
    }

    space.victim_selection_mut().limit = Some(0);
    let _ = space.handle_page_fault(16);
}

#[test]
#[should_panic(expected = "Out of memory")]
fn test_out_of_memory_on_swap_in() {
    let mut space = get_test_space(CVMConfig::new(64, 8, 4, 2));

    for vpn in 0..5 {
        let page = uniform_page(64, vpn as u8);
        space.write_virtual_memory(vpn * 64, &page);
    }

    // one free page but two are needed
    space.victim_selection_mut().limit = Some(0);
    let _ = space.handle_page_fault(0);
}
