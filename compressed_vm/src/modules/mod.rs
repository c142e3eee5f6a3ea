pub mod compression;
pub mod physical_allocator;
pub mod physical_memory;
pub mod victim_selection;
