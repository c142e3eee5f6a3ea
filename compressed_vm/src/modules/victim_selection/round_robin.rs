use super::VictimSelectionModule;
use crate::page_table::PageTable;

/// Evicts resident pages in ascending vpn order, ignoring access bits.
/// Continues where the last call stopped.
pub struct RoundRobinVictimSelectionModule {
    next_vpn: usize,
}

impl VictimSelectionModule for RoundRobinVictimSelectionModule {
    fn new() -> Self {
        Self { next_vpn: 0 }
    }

    fn select_victims(&mut self, count: usize, page_table: &mut PageTable) -> Vec<usize> {
        let len = page_table.len();
        let mut victims = Vec::with_capacity(count);

        for _ in 0..len {
            if victims.len() == count {
                break;
            }

            let vpn = self.next_vpn % len;
            self.next_vpn = (vpn + 1) % len;

            if page_table.is_resident(vpn) {
                victims.push(vpn);
            }
        }

        victims
    }
}
