mod compressed_block;
mod cvm_address_space;
mod cvm_config;
mod page_table;
mod statistics;
mod swap_engine;
mod transfer;
mod util;

#[cfg(test)]
mod test;

pub use crate::compressed_block::{BlockHandle, CompressedBlock, CompressedBlockStore};
pub use crate::cvm_address_space::{CVMAddressSpace, DefaultCVMAddressSpace};
pub use crate::page_table::{PageTable, TranslationEntry};
pub use crate::statistics::CVMStatistics;
pub use cvm_config::{CVMConfig, DEFAULT_NUM_VIRTUAL_PAGES};
pub mod modules;
