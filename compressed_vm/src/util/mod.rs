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

pub(crate) mod bit_array;

/// Logs `error` and aborts the current operation.
///
/// Used for conditions after which the page tables, the bitmap and the
/// compressed block descriptors can no longer be kept consistent.
macro_rules! fatal {
    ($($arg:tt)+) => {{
        log::error!($($arg)+);
        panic!($($arg)+)
    }};
}

pub(crate) use fatal;

/// efficient way to calculate: ceil(x / y)
pub(crate) const fn ceil_div(x: usize, y: usize) -> usize {
    (x + y - 1) / y
}

/// rounds `x` up to the next multiple of `multiple`
pub(crate) const fn round_up_to_nearest(x: usize, multiple: usize) -> usize {
    ceil_div(x, multiple) * multiple
}
