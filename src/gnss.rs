// nmea-sim - a customizable marine NMEA 0183 / AIS traffic generator
// Copyright (C) 2024  The nmea-sim Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Fabricates a plausible GPS constellation each tick (spec.md §3's
//! `GNSSSnapshot`). Transient — never persisted across ticks.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{GnssSnapshot, SatelliteInfo};

pub fn generate(rng: &mut impl Rng) -> GnssSnapshot {
    let sats_in_view = rng.gen_range(8..=14);

    let mut prns: Vec<u8> = (1..=32).collect();
    prns.shuffle(rng);
    prns.truncate(sats_in_view);

    let sats_used = rng.gen_range(6..=12).min(sats_in_view);

    let satellites = prns
        .iter()
        .enumerate()
        .map(|(i, &prn)| SatelliteInfo {
            prn,
            elevation_deg: rng.gen_range(5..=85),
            azimuth_deg: rng.gen_range(0..=359),
            snr_db: rng.gen_range(20..=48),
            used: i < sats_used,
        })
        .collect();

    GnssSnapshot {
        satellites,
        sats_used,
        pdop: rng.gen_range(1.3..=3.5),
        hdop: rng.gen_range(0.7..=2.5),
        vdop: rng.gen_range(1.0..=3.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn snapshot_respects_bounds() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let snap = generate(&mut rng);
            assert!((8..=14).contains(&snap.sats_in_view()));
            assert!(snap.sats_used >= 6 && snap.sats_used <= snap.sats_in_view());
            assert!((1.3..=3.5).contains(&snap.pdop));
            assert!((0.7..=2.5).contains(&snap.hdop));
            assert!((1.0..=3.0).contains(&snap.vdop));
            for sat in &snap.satellites {
                assert!((1..=32).contains(&sat.prn));
                assert!((5..=85).contains(&sat.elevation_deg));
                assert!((0..=359).contains(&sat.azimuth_deg));
                assert!((20..=48).contains(&sat.snr_db));
            }
        }
    }
}
