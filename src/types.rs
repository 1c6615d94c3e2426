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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Own-ship kinematic state, mutated exclusively by the tick engine (I5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OwnShipState {
    pub lat: f64,
    pub lon: f64,
    pub sog: f64,
    pub cog: f64,
    pub tws: f64,
    pub twd: f64,
    pub sim_time: Option<DateTime<Utc>>,
}

impl OwnShipState {
    pub const MAX_SOG_KN: f64 = 15.0;
    pub const MAX_TWS_KN: f64 = 30.0;
}

/// A single simulated AIS Class B target.
#[derive(Debug, Clone, PartialEq)]
pub struct AisTarget {
    pub mmsi: u32,
    pub lat: f64,
    pub lon: f64,
    pub sog: f64,
    pub cog: f64,
    pub heading: f64,
    pub name: String,
    /// Static lateral offset from the shadowed base track, in nautical miles.
    pub dy_nm: f64,
    pub dx_nm: f64,
    pub gpx_offset: Option<GpxOffset>,
}

/// A target's along-track offset when shadowing the own-ship GPX track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpxOffset {
    TimeSeconds(i64),
    Index(i64),
}

/// A single GPX track point; `time` is `None` for non-timestamped tracks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpxPoint {
    pub lat: f64,
    pub lon: f64,
    pub time: Option<DateTime<Utc>>,
}

/// An ordered polyline of at least 2 points. Time-indexed if every point
/// carries a timestamp and the sequence is monotonically increasing;
/// index-indexed otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpxTrack {
    pub points: Vec<GpxPoint>,
}

impl GpxTrack {
    pub fn new(mut points: Vec<GpxPoint>) -> Self {
        if Self::is_time_indexed(&points) {
            points.sort_by_key(|p| p.time);
        }
        GpxTrack { points }
    }

    pub fn is_time_indexed(points: &[GpxPoint]) -> bool {
        !points.is_empty() && points.iter().all(|p| p.time.is_some())
    }

    pub fn has_time(&self) -> bool {
        Self::is_time_indexed(&self.points)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.points.first().and_then(|p| p.time)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.points.last().and_then(|p| p.time)
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.start_time(), self.end_time()) {
            (Some(s), Some(e)) => Some((e - s).num_seconds().max(0)),
            _ => None,
        }
    }
}

/// A single tracked GPS satellite, regenerated fresh each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SatelliteInfo {
    pub prn: u8,
    pub elevation_deg: i32,
    pub azimuth_deg: i32,
    pub snr_db: i32,
    pub used: bool,
}

/// Per-tick, non-persistent snapshot of the simulated GNSS receiver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GnssSnapshot {
    pub satellites: Vec<SatelliteInfo>,
    pub sats_used: usize,
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
}

impl GnssSnapshot {
    pub fn used_prns(&self) -> Vec<u8> {
        self.satellites
            .iter()
            .filter(|s| s.used)
            .map(|s| s.prn)
            .collect()
    }

    pub fn sats_in_view(&self) -> usize {
        self.satellites.len()
    }
}

/// Public view of one AIS target, for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct AisTargetSummary {
    pub mmsi: u32,
    pub lat: f64,
    pub lon: f64,
    pub sog: f64,
    pub cog: f64,
    pub name: String,
    pub display_name: String,
}

impl From<&AisTarget> for AisTargetSummary {
    fn from(t: &AisTarget) -> Self {
        AisTargetSummary {
            mmsi: t.mmsi,
            lat: t.lat,
            lon: t.lon,
            sog: t.sog,
            cog: t.cog,
            name: t.name.clone(),
            display_name: format!(
                "{} (SOG {:.1} kn, COG {:03}°)",
                t.name,
                t.sog,
                (t.cog.round() as i64).rem_euclid(360)
            ),
        }
    }
}

/// GPX progress, reported as one of two shapes depending on track type.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GpxProgress {
    Time {
        offset_s: i64,
        sim_time: DateTime<Utc>,
    },
    Index {
        index: usize,
        fraction: f64,
    },
}

/// Track metadata plus live progress, included in the status snapshot
/// whenever a GPX track is attached.
#[derive(Debug, Clone, Serialize)]
pub struct GpxTrackInfo {
    pub points: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_s: Option<i64>,
    pub has_time: bool,
    pub progress: GpxProgress,
}

/// A connected TCP fan-out peer, for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TcpPeerSummary {
    pub address: String,
    pub connected_at: DateTime<Utc>,
}

/// A thread-safe, point-in-time snapshot of the whole simulator.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub udp_host: String,
    pub udp_port: u16,
    pub tcp_host: String,
    pub tcp_port: Option<u16>,
    pub interval_seconds: f64,
    pub wind_enabled: bool,
    pub lat: f64,
    pub lon: f64,
    pub sog: f64,
    pub cog: f64,
    pub tws: f64,
    pub twd: f64,
    pub magvar: f64,
    pub sim_time: Option<DateTime<Utc>>,
    pub gnss: Option<GnssSnapshot>,
    pub ais_targets: Vec<AisTargetSummary>,
    pub stream_size: usize,
    pub tcp_peers: Vec<TcpPeerSummary>,
    pub gpx_track_info: Option<GpxTrackInfo>,
}
