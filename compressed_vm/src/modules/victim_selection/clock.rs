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

use super::VictimSelectionModule;
use crate::page_table::PageTable;

/// Second chance algorithm over the `used` bits of the resident pages.
///
/// A page with a set `used` bit loses this bit instead of being selected.
/// The clock hand keeps its position between calls.
pub struct ClockVictimSelectionModule {
    hand: usize,
}

impl VictimSelectionModule for ClockVictimSelectionModule {
    fn new() -> Self {
        Self { hand: 0 }
    }

    fn select_victims(&mut self, count: usize, page_table: &mut PageTable) -> Vec<usize> {
        let len = page_table.len();
        let mut victims = Vec::with_capacity(count);
        if len == 0 {
            return victims;
        }

        // two rounds are enough: the first one clears all used bits
        for _ in 0..2 * len {
            if victims.len() == count {
                break;
            }

            let vpn = self.hand % len;
            self.hand = (vpn + 1) % len;

            let entry = match page_table.get_mut(vpn) {
                Some(entry) if entry.is_valid() => entry,
                _ => continue,
            };

            if victims.contains(&vpn) {
                continue;
            }

            if entry.is_used() {
                // page was accessed, give it another chance
                entry.clear_used();
            } else {
                victims.push(vpn);
            }
        }

        victims
    }
}
