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

use compressed_vm::{CVMConfig, DefaultCVMAddressSpace};
use env_logger::{Builder, Env};
use log::info;
use rand::{rngs::SmallRng, Rng, RngCore, SeedableRng};

const TOUCHED_PAGES: usize = 96;
const ACCESSES: usize = 10_000;

/// Page made out of runs of the same byte
fn compressible_page(rand: &mut SmallRng, page_size: usize) -> Vec<u8> {
    let mut page = Vec::with_capacity(page_size);
    while page.len() < page_size {
        let value = rand.next_u32() as u8;
        let run = rand.gen_range(16..=256).min(page_size - page.len());
        page.extend(std::iter::repeat(value).take(run));
    }
    page
}

fn main() {
    Builder::from_env(Env::default())
        .filter_level(log::LevelFilter::Info)
        .format_module_path(false)
        .init();

    let config = CVMConfig::default();
    let mut space = DefaultCVMAddressSpace::with_config(config).unwrap();
    let mut rand = SmallRng::seed_from_u64(1234567890);

    let mut pages: Vec<Vec<u8>> = (0..TOUCHED_PAGES)
        .map(|_| compressible_page(&mut rand, config.page_size))
        .collect();

    for (vpn, page) in pages.iter().enumerate() {
        let written = space.write_virtual_memory(config.make_address(vpn, 0), page);
        assert_eq!(written, page.len());
    }
    info!("Wrote {} pages", TOUCHED_PAGES);

    for _ in 0..ACCESSES {
        let vpn = rand.gen_range(0..TOUCHED_PAGES);
        let offset = rand.gen_range(0..config.page_size);

        if rand.gen_bool(0.2) {
            let value = rand.next_u32() as u8;
            pages[vpn][offset] = value;
            space.write_virtual_memory(config.make_address(vpn, offset), &[value]);
        } else {
            let mut value = [0u8];
            space.read_virtual_memory(config.make_address(vpn, offset), &mut value);
            assert_eq!(value[0], pages[vpn][offset], "vpn {} offset {}", vpn, offset);
        }
    }

    space.check_integrity();

    let statistics = space.statistics();
    println!("page faults:        {}", statistics.page_faults);
    println!("zero fill faults:   {}", statistics.zero_fill_faults);
    println!("swap outs:          {}", statistics.swap_outs);
    println!("swap ins:           {}", statistics.swap_ins);
    println!("pages compressed:   {}", statistics.pages_compressed);
    println!("pages decompressed: {}", statistics.pages_decompressed);
    println!("victim shortfalls:  {}", statistics.victim_shortfalls);
    if let Some(ratio) = statistics.compression_ratio() {
        println!("compression ratio:  {:.3}", ratio);
    }
}
