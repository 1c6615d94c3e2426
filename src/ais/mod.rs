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

//! AIS Class B target fleet: initialisation, per-tick evolution (free or
//! GPX-shadowing), and the Type 24/Type 18 emission schedule (spec.md §4.4).

pub mod encode;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::gpx;
use crate::types::{AisTarget, GpxOffset, GpxTrack};

const FIRST_NAMES: [&str; 15] = [
    "Alex", "Sam", "Jamie", "Chris", "Taylor", "Jordan", "Casey", "Riley", "Avery", "Morgan",
    "Charlie", "Rowan", "Quinn", "Dakota", "Skyler",
];

const LAST_NAMES: [&str; 15] = [
    "Smith",
    "Johnson",
    "Williams",
    "Brown",
    "Jones",
    "Miller",
    "Davis",
    "Garcia",
    "Rodriguez",
    "Martinez",
    "Hernandez",
    "Lopez",
    "Gonzalez",
    "Wilson",
    "Anderson",
];

fn vessel_name(idx: usize, skipper_names: &[String], rng: &mut impl Rng) -> String {
    if !skipper_names.is_empty() {
        let i = rng.gen_range(0..skipper_names.len());
        return skipper_names[i].clone();
    }
    let fn_ = FIRST_NAMES[(idx * 7 + 3) % FIRST_NAMES.len()];
    let ln = LAST_NAMES[(idx * 11 + 5) % LAST_NAMES.len()];
    format!("{fn_} {ln}")
}

/// Owns the simulated fleet and the last UTC minute a static report batch
/// was emitted on, so the minute boundary is detected exactly once.
pub struct AisFleet {
    pub targets: Vec<AisTarget>,
    last_static_minute: Option<i64>,
}

#[allow(clippy::too_many_arguments)]
pub fn init_fleet(
    num_targets: usize,
    own_lat: f64,
    own_lon: f64,
    own_sog: f64,
    own_cog: f64,
    max_sog_offset: f64,
    max_cog_offset: f64,
    distribution_radius_nm: f64,
    gpx_track: Option<&GpxTrack>,
    skipper_names: &[String],
    rng: &mut impl Rng,
) -> AisFleet {
    let mut targets = Vec::with_capacity(num_targets);

    for i in 0..num_targets {
        let r = rng.gen::<f64>().sqrt() * distribution_radius_nm;
        let theta = rng.gen_range(0.0..std::f64::consts::TAU);
        let dx_nm = r * theta.cos();
        let dy_nm = r * theta.sin();

        let sog = (own_sog + rng.gen_range(-max_sog_offset..=max_sog_offset)).max(0.0);
        let cog = (own_cog + rng.gen_range(-max_cog_offset..=max_cog_offset)).rem_euclid(360.0);

        let gpx_offset = gpx_track.map(|track| {
            if track.has_time() {
                let total_s = track.duration_seconds().unwrap_or(1).max(1);
                let max_off = (total_s / 20).clamp(30, 300);
                GpxOffset::TimeSeconds(rng.gen_range(-max_off..=max_off))
            } else {
                GpxOffset::Index(rng.gen_range(-50..=50))
            }
        });

        targets.push(AisTarget {
            mmsi: 999_000_001 + i as u32,
            lat: own_lat,
            lon: own_lon,
            sog,
            cog,
            heading: cog,
            name: vessel_name(i, skipper_names, rng),
            dx_nm,
            dy_nm,
            gpx_offset,
        });
    }

    AisFleet {
        targets,
        last_static_minute: None,
    }
}

/// Converts a static north/east nm offset into a lat/lon displacement from
/// `base_lat`/`base_lon`, guarding the longitude scale factor near the pole.
fn offset_to_latlon(base_lat: f64, base_lon: f64, dy_nm: f64, dx_nm: f64) -> (f64, f64) {
    let out_lat = base_lat + dy_nm / 60.0;
    let cos_lat = base_lat.clamp(-89.99, 89.99).to_radians().cos();
    let cos_lat = if cos_lat == 0.0 { 1e-6 } else { cos_lat };
    let out_lon = base_lon + dx_nm / (60.0 * cos_lat);
    (out_lat, out_lon)
}

#[allow(clippy::too_many_arguments)]
pub fn update_fleet(
    fleet: &mut AisFleet,
    own_lat: f64,
    own_lon: f64,
    own_sog: f64,
    own_cog: f64,
    max_sog_offset: f64,
    max_cog_offset: f64,
    dt_seconds: f64,
    gpx_track: Option<&GpxTrack>,
    gpx_cursor_index: usize,
    sim_time: DateTime<Utc>,
    rng: &mut impl Rng,
) {
    let dt_hours = dt_seconds / 3600.0;

    match gpx_track {
        Some(track) => {
            for t in &mut fleet.targets {
                let (base_lat, base_lon, base_sog, base_cog) = match t.gpx_offset {
                    Some(GpxOffset::TimeSeconds(off)) => {
                        let at = sim_time + chrono::Duration::seconds(off);
                        gpx::sample_time_indexed(track, at)
                    }
                    Some(GpxOffset::Index(off)) => {
                        let idx = (gpx_cursor_index as i64 + off).max(0);
                        gpx::sample_at_index(track, idx, dt_seconds)
                    }
                    None => (own_lat, own_lon, own_sog, own_cog),
                };

                let (lat, lon) = offset_to_latlon(base_lat, base_lon, t.dy_nm, t.dx_nm);
                t.lat = lat;
                t.lon = lon;
                t.sog = (base_sog + rng.gen_range(-max_sog_offset..=max_sog_offset)).max(0.0);
                t.cog = (base_cog + rng.gen_range(-max_cog_offset..=max_cog_offset)).rem_euclid(360.0);
                t.heading = t.cog;
            }
        }
        None => {
            for t in &mut fleet.targets {
                let desired_cog =
                    (own_cog + rng.gen_range(-max_cog_offset..=max_cog_offset)).rem_euclid(360.0);
                t.cog = (0.8 * t.cog + 0.2 * desired_cog).rem_euclid(360.0);

                let desired_sog = (own_sog + rng.gen_range(-max_sog_offset..=max_sog_offset)).max(0.0);
                t.sog = (0.8 * t.sog + 0.2 * desired_sog).max(0.0);
                t.heading = t.cog;

                let dist_nm = t.sog * dt_hours;
                let rad_cog = t.cog.to_radians();
                t.lat += (dist_nm / 60.0) * rad_cog.cos();
                let lat_for_lon = t.lat.clamp(-89.99, 89.99);
                t.lon += (dist_nm / (60.0 * lat_for_lon.to_radians().cos())) * rad_cog.sin();
                t.lon = crate::kinematics::wrap_lon(t.lon);
            }
        }
    }
}

/// Composes the AIS portion of a tick's packet: Type 24 (if the UTC minute
/// just changed) followed by Type 18 for every target. Returns the empty
/// string when the fleet is empty, matching the rest of the tick's
/// sentence-by-sentence composition.
pub fn compose_sentences(fleet: &mut AisFleet, sim_time: DateTime<Utc>) -> String {
    if fleet.targets.is_empty() {
        return String::new();
    }

    let ts = sim_time.timestamp().rem_euclid(60) as u32;
    let minute_key = sim_time.timestamp().div_euclid(60);

    let mut out = String::new();

    if fleet.last_static_minute != Some(minute_key) {
        fleet.last_static_minute = Some(minute_key);
        for t in &fleet.targets {
            let name24 = encode::static_report_name(&t.name, t.sog, t.cog);
            out.push_str(&encode::type24_part_a(t.mmsi, &name24));
        }
    }

    for t in &fleet.targets {
        out.push_str(&encode::type18(t.mmsi, t.lat, t.lon, t.sog, t.cog, t.heading, ts));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn init_fleet_respects_mmsi_sequence_and_offsets() {
        let mut rng = SmallRng::seed_from_u64(3);
        let fleet = init_fleet(5, 10.0, 20.0, 5.0, 90.0, 2.0, 20.0, 1.0, None, &[], &mut rng);
        assert_eq!(fleet.targets.len(), 5);
        for (i, t) in fleet.targets.iter().enumerate() {
            assert_eq!(t.mmsi, 999_000_001 + i as u32);
            assert!(t.sog >= 0.0);
            assert!((0.0..360.0).contains(&t.cog));
            assert!(!t.name.is_empty());
        }
    }

    #[test]
    fn vessel_name_matches_deterministic_pool_formula() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(vessel_name(0, &[], &mut rng), "Chris Miller");
        assert_eq!(vessel_name(1, &[], &mut rng), "Charlie Johnson");
    }

    #[test]
    fn static_report_emitted_once_per_minute() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut fleet = init_fleet(2, 0.0, 0.0, 5.0, 90.0, 1.0, 5.0, 1.0, None, &[], &mut rng);

        let t0 = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 10).unwrap();
        let first = compose_sentences(&mut fleet, t0);
        assert!(first.contains("!AIVDM"));
        let type24_count = first.matches(",,A,").count();
        // Each target contributes a Type 24 AND a Type 18 line this minute.
        assert_eq!(type24_count, 4);

        let t1 = t0 + chrono::Duration::seconds(20);
        let second = compose_sentences(&mut fleet, t1);
        // Still inside the same minute: only Type 18 lines (one per target).
        assert_eq!(second.matches(",,A,").count(), 2);
    }

    #[test]
    fn free_mode_update_moves_targets_towards_own_ship() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut fleet = init_fleet(3, 0.0, 0.0, 5.0, 90.0, 0.0, 0.0, 0.5, None, &[], &mut rng);
        update_fleet(&mut fleet, 0.0, 0.0, 5.0, 90.0, 0.0, 0.0, 60.0, None, 0, chrono::Utc::now(), &mut rng);
        for t in &fleet.targets {
            assert!(t.lon > 0.0);
        }
    }
}
