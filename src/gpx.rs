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

//! GPX track replay (spec.md §4.3): time-indexed interpolation and
//! index-stepped cursor advance, plus the haversine/bearing helpers both
//! modes need.

use chrono::{DateTime, Utc};

use crate::types::{GpxPoint, GpxTrack};

const EARTH_RADIUS_KM: f64 = 6371.0;
const KM_TO_NM: f64 = 0.539957;

/// Great-circle distance between two points, in nautical miles.
pub fn haversine_nm(a: GpxPoint, b: GpxPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_KM * c * KM_TO_NM
}

/// Initial bearing from `a` to `b`, normalised to `[0, 360)`.
pub fn initial_bearing_deg(a: GpxPoint, b: GpxPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Sample a time-indexed track at a given instant. Returns
/// `(lat, lon, sog_kn, cog_deg)`.
///
/// Holds at the first/last point (sog = 0) before the start / after the end.
pub fn sample_time_indexed(track: &GpxTrack, at: DateTime<Utc>) -> (f64, f64, f64, f64) {
    let points = &track.points;
    debug_assert!(points.len() >= 2);

    let start = points.first().unwrap();
    let end = points.last().unwrap();

    if at <= start.time.unwrap() {
        return (start.lat, start.lon, 0.0, fallback_bearing(points, 0));
    }
    if at >= end.time.unwrap() {
        return (end.lat, end.lon, 0.0, fallback_bearing(points, points.len() - 2));
    }

    let idx = points
        .windows(2)
        .position(|w| w[0].time.unwrap() <= at && at < w[1].time.unwrap())
        .unwrap_or(points.len() - 2);

    let (p0, p1) = (points[idx], points[idx + 1]);
    let span = (p1.time.unwrap() - p0.time.unwrap()).num_milliseconds() as f64 / 1000.0;
    let frac = if span > 0.0 {
        ((at - p0.time.unwrap()).num_milliseconds() as f64 / 1000.0 / span).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let lat = p0.lat + (p1.lat - p0.lat) * frac;
    let lon = p0.lon + (p1.lon - p0.lon) * frac;
    let sog = if span > 0.0 {
        haversine_nm(p0, p1) / (span / 3600.0)
    } else {
        0.0
    };
    let cog = initial_bearing_deg(p0, p1);

    (lat, lon, sog, cog)
}

fn fallback_bearing(points: &[GpxPoint], seg_start: usize) -> f64 {
    if seg_start + 1 < points.len() {
        initial_bearing_deg(points[seg_start], points[seg_start + 1])
    } else {
        0.0
    }
}

/// Sample an index-stepped track at a (clamped) fractional index, returning
/// `(lat, lon, sog, cog)` using the enclosing segment. Used by AIS targets
/// shadowing a non-timestamped track at an index offset; the own-ship cursor
/// itself is advanced by `IndexCursor`.
pub fn sample_at_index(track: &GpxTrack, index: i64, interval_seconds: f64) -> (f64, f64, f64, f64) {
    let n = track.points.len();
    debug_assert!(n >= 2);
    let i0 = index.clamp(0, n as i64 - 2) as usize;
    let (p0, p1) = (track.points[i0], track.points[i0 + 1]);
    let seg_nm = haversine_nm(p0, p1);
    let sog = if interval_seconds > 0.0 {
        seg_nm / (interval_seconds / 3600.0)
    } else {
        0.0
    };
    let cog = initial_bearing_deg(p0, p1);
    (p0.lat, p0.lon, sog, cog)
}

/// Own-ship's position within an index-stepped (non-timestamped) track.
/// Owned exclusively by the own-ship replay path (spec.md §9's
/// "two-ownership" note) — AIS targets read the cursor but never move it.
#[derive(Debug, Clone, Copy)]
pub struct IndexCursor {
    pub index: usize,
}

impl IndexCursor {
    pub fn from_fraction(track: &GpxTrack, fraction: f64) -> Self {
        let n = track.points.len();
        let idx = (fraction.clamp(0.0, 1.0) * (n as f64 - 1.0)).round() as usize;
        IndexCursor {
            index: idx.min(n.saturating_sub(2)),
        }
    }

    pub fn fraction(&self, track: &GpxTrack) -> f64 {
        let total = (track.points.len().saturating_sub(1)).max(1);
        (self.index as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Advances the cursor towards `track[index+1]` by `sog_kn * dt`,
    /// snapping to the waypoint (and advancing the cursor) once within
    /// `step_nm` of it, per spec.md §4.3.
    pub fn advance(
        &mut self,
        track: &GpxTrack,
        lat: &mut f64,
        lon: &mut f64,
        sog_kn: f64,
        dt_seconds: f64,
    ) -> f64 {
        let n = track.points.len();
        let target = track.points[(self.index + 1).min(n - 1)];
        let here = GpxPoint { lat: *lat, lon: *lon, time: None };
        let dist_to_target = haversine_nm(here, target);
        let step_nm = sog_kn.max(0.0) * (dt_seconds / 3600.0);

        if dist_to_target <= 1e-3 || step_nm >= dist_to_target {
            *lat = target.lat;
            *lon = target.lon;
            self.index = (self.index + 1).min(n.saturating_sub(2));
            let next = track.points[(self.index + 1).min(n - 1)];
            initial_bearing_deg(target, next)
        } else {
            let bearing = initial_bearing_deg(here, target).to_radians();
            *lat += (step_nm / 60.0) * bearing.cos();
            *lon += (step_nm / (60.0 * lat.to_radians().cos().max(1e-6))) * bearing.sin();
            bearing.to_degrees().rem_euclid(360.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pt(lat: f64, lon: f64, t: Option<DateTime<Utc>>) -> GpxPoint {
        GpxPoint { lat, lon, time: t }
    }

    #[test]
    fn haversine_known_distances() {
        // S6
        let a = pt(0.0, 0.0, None);
        let b = pt(0.0, 1.0, None);
        let c = pt(1.0, 0.0, None);
        assert!((haversine_nm(a, b) - 60.04).abs() < 0.1);
        assert!((haversine_nm(a, c) - 60.04).abs() < 0.1);
    }

    #[test]
    fn time_indexed_holds_before_and_after() {
        // P7
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        let track = GpxTrack::new(vec![pt(0.0, 0.0, Some(t0)), pt(1.0, 1.0, Some(t1))]);

        let before = sample_time_indexed(&track, t0 - chrono::Duration::seconds(10));
        assert_eq!((before.0, before.1, before.2), (0.0, 0.0, 0.0));

        let after = sample_time_indexed(&track, t1 + chrono::Duration::seconds(10));
        assert_eq!((after.0, after.1, after.2), (1.0, 1.0, 0.0));

        let mid = sample_time_indexed(&track, t0 + chrono::Duration::minutes(30));
        assert!((mid.0 - 0.5).abs() < 1e-9);
        assert!((mid.1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn index_cursor_snaps_and_advances() {
        let track = GpxTrack::new(vec![
            pt(0.0, 0.0, None),
            pt(0.0, 1.0, None),
            pt(0.0, 2.0, None),
        ]);
        let mut cursor = IndexCursor { index: 0 };
        let mut lat = 0.0;
        let mut lon = 0.0;
        // A huge step should snap directly to the first waypoint and advance.
        cursor.advance(&track, &mut lat, &mut lon, 1_000_000.0, 3600.0);
        assert_eq!(cursor.index, 1);
        assert!((lon - 1.0).abs() < 1e-9);
    }
}
