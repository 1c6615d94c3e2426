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

//! Pure position/wind kinematics (spec.md §4.2). No I/O, no randomness
//! source of its own — callers supply an `Rng` so tests can be deterministic.

use rand::Rng;

use crate::types::OwnShipState;

/// Poleward latitude beyond which the longitude step is skipped but the
/// wrap is still applied (an intentionally preserved quirk, see
/// SPEC_FULL.md §9 / DESIGN.md).
const POLE_GUARD_DEG: f64 = 89.99;

/// Advances `lat`/`lon` by `sog`/`cog` over `dt_seconds`, in place (I1).
pub fn advance_position(lat: &mut f64, lon: &mut f64, sog_kn: f64, cog_deg: f64, dt_seconds: f64) {
    let hours = dt_seconds / 3600.0;
    let distance_nm = sog_kn * hours;
    let cog_rad = cog_deg.to_radians();

    *lat += (distance_nm / 60.0) * cog_rad.cos();
    if lat.abs() > 90.0 {
        *lat = 90.0_f64.copysign(*lat);
    }

    if lat.abs() < POLE_GUARD_DEG {
        *lon += (distance_nm / (60.0 * lat.to_radians().cos())) * cog_rad.sin();
    }
    *lon = wrap_lon(*lon);
}

/// Wraps a longitude into `(-180, 180]`.
pub fn wrap_lon(mut lon: f64) -> f64 {
    if lon > 180.0 {
        lon -= 360.0;
    }
    if lon <= -180.0 {
        lon += 360.0;
    }
    lon
}

/// Applies the random-walk perturbation to own-ship SOG/COG in place.
/// Only used in free-drift mode: a GPX track determines SOG/COG directly.
pub fn random_walk_sog_cog(state: &mut OwnShipState, rng: &mut impl Rng) {
    state.sog = (state.sog + rng.gen_range(-0.2..0.2)).clamp(0.0, OwnShipState::MAX_SOG_KN);
    state.cog = (state.cog + rng.gen_range(-2.0..2.0)).rem_euclid(360.0);
}

/// Applies the random-walk perturbation to own-ship TWS/TWD in place.
/// Applied every tick regardless of own-ship kinematics mode (spec.md §4.2).
pub fn random_walk_wind(state: &mut OwnShipState, rng: &mut impl Rng) {
    state.tws = (state.tws + rng.gen_range(-0.3..0.3)).clamp(0.0, OwnShipState::MAX_TWS_KN);
    state.twd = (state.twd + rng.gen_range(-3.0..3.0)).rem_euclid(360.0);
}

/// Derived course/wind quantities computed fresh every tick.
pub struct DerivedWind {
    pub cog_magnetic: f64,
    pub twd_magnetic: f64,
    pub sog_kmh: f64,
    pub tws_mps: f64,
    /// True wind angle relative to the bow, in `(-180, 180]`.
    pub twa: f64,
    pub awa: f64,
    pub aws: f64,
}

/// Normalises an angle difference into `(-180, 180]`.
pub fn normalize_signed_180(mut deg: f64) -> f64 {
    deg %= 360.0;
    if deg > 180.0 {
        deg -= 360.0;
    }
    if deg <= -180.0 {
        deg += 360.0;
    }
    deg
}

pub fn derive_wind(state: &OwnShipState, magvar_deg: f64, rng: &mut impl Rng) -> DerivedWind {
    let cog_magnetic = (state.cog - magvar_deg + 360.0).rem_euclid(360.0);
    let twd_magnetic = (state.twd - magvar_deg + 360.0).rem_euclid(360.0);
    let sog_kmh = state.sog * 1.852;
    let tws_mps = state.tws * 0.514444;
    let twa = normalize_signed_180(state.twd - state.cog);

    let (awa, aws) = if state.sog < 1.0 {
        (twa, state.tws)
    } else {
        (twa * rng.gen_range(0.8..1.1), state.tws * rng.gen_range(0.9..1.5))
    };

    DerivedWind {
        cog_magnetic,
        twd_magnetic,
        sog_kmh,
        tws_mps,
        twa,
        awa,
        aws,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn advance_position_matches_known_step() {
        // S4
        let mut lat = 0.0;
        let mut lon = 0.0;
        advance_position(&mut lat, &mut lon, 60.0, 90.0, 3600.0);
        assert!((lat - 0.0).abs() < 1e-9);
        assert!((lon - 1.0).abs() < 1e-9);
    }

    #[test]
    fn latitude_clamps_at_pole() {
        let mut lat = 89.999;
        let mut lon = 0.0;
        advance_position(&mut lat, &mut lon, 1000.0, 0.0, 3600.0);
        assert_eq!(lat, 90.0);
    }

    #[test]
    fn longitude_wraps_into_range() {
        assert_eq!(wrap_lon(190.0), -170.0);
        assert_eq!(wrap_lon(-180.0), 180.0);
        assert_eq!(wrap_lon(180.0), 180.0);
    }

    #[test]
    fn random_walk_keeps_state_in_bounds() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut state = OwnShipState {
            lat: 0.0,
            lon: 0.0,
            sog: 0.05,
            cog: 359.0,
            tws: 0.1,
            twd: 1.0,
            sim_time: None,
        };
        for _ in 0..1000 {
            random_walk_sog_cog(&mut state, &mut rng);
            random_walk_wind(&mut state, &mut rng);
            assert!((0.0..=OwnShipState::MAX_SOG_KN).contains(&state.sog));
            assert!((0.0..360.0).contains(&state.cog));
            assert!((0.0..=OwnShipState::MAX_TWS_KN).contains(&state.tws));
            assert!((0.0..360.0).contains(&state.twd));
        }
    }

    #[test]
    fn docked_wind_uses_true_values_directly() {
        let mut rng = SmallRng::seed_from_u64(1);
        let state = OwnShipState {
            lat: 0.0,
            lon: 0.0,
            sog: 0.5,
            cog: 90.0,
            tws: 12.0,
            twd: 100.0,
            sim_time: None,
        };
        let wind = derive_wind(&state, 0.0, &mut rng);
        assert_eq!(wind.awa, wind.twa);
        assert_eq!(wind.aws, state.tws);
    }
}
