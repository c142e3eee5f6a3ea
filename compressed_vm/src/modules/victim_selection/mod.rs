mod clock;
mod round_robin;

pub use clock::ClockVictimSelectionModule;
pub use round_robin::RoundRobinVictimSelectionModule;

use crate::page_table::PageTable;

/// Decides which resident pages are evicted if the uncompressed zone is full.
pub trait VictimSelectionModule {
    fn new() -> Self;

    /// Returns up to `count` distinct vpns of resident pages in the order they should be evicted.
    ///
    /// Returning less than `count` pages is allowed,
    /// e.g. if there are not enough resident pages left.
    fn select_victims(&mut self, count: usize, page_table: &mut PageTable) -> Vec<usize>;
}
