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

use crate::error::{Result, SimError};
use crate::types::GpxTrack;

pub const DEFAULT_UDP_PORT: u16 = 10110;
pub const DEFAULT_TCP_PORT: u16 = 10111;

// Defaults mirror original_source/nmea_simulator.py's module constants.
const DEFAULT_LAT: f64 = 42.715769349296004;
const DEFAULT_LON: f64 = 16.23217374761267;
const DEFAULT_SOG: f64 = 5.0;
const DEFAULT_COG: f64 = 185.0;
const DEFAULT_TWS: f64 = 10.0;
const DEFAULT_TWD: f64 = 270.0;
const DEFAULT_MAGVAR: f64 = -2.5;

/// Immutable simulator configuration. Replacing it requires a full
/// stop + start (see `Simulator::restart`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub udp_host: String,
    pub udp_port: u16,
    pub tcp_host: String,
    pub tcp_port: Option<u16>,
    pub interval_seconds: f64,
    pub wind_enabled: bool,
    pub initial_lat: f64,
    pub initial_lon: f64,
    pub initial_sog: f64,
    pub initial_cog: f64,
    pub initial_tws: f64,
    pub initial_twd: f64,
    pub magnetic_variation_deg: f64,
    pub start_datetime: Option<DateTime<Utc>>,
    pub ais_num_targets: u32,
    pub ais_max_cog_offset_deg: f64,
    pub ais_max_sog_offset_kn: f64,
    pub ais_distribution_radius_nm: f64,
    pub gpx_track: Option<GpxTrack>,
    pub gpx_start_fraction: Option<f64>,
    pub skipper_names: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            udp_host: "127.0.0.1".to_string(),
            udp_port: DEFAULT_UDP_PORT,
            tcp_host: "0.0.0.0".to_string(),
            tcp_port: Some(DEFAULT_TCP_PORT),
            interval_seconds: 1.0,
            wind_enabled: true,
            initial_lat: DEFAULT_LAT,
            initial_lon: DEFAULT_LON,
            initial_sog: DEFAULT_SOG,
            initial_cog: DEFAULT_COG,
            initial_tws: DEFAULT_TWS,
            initial_twd: DEFAULT_TWD,
            magnetic_variation_deg: DEFAULT_MAGVAR,
            start_datetime: None,
            ais_num_targets: 0,
            ais_max_cog_offset_deg: 20.0,
            ais_max_sog_offset_kn: 2.0,
            ais_distribution_radius_nm: 1.0,
            gpx_track: None,
            gpx_start_fraction: None,
            skipper_names: Vec::new(),
        }
    }
}

/// Hosts the spec treats as "broadcast to everyone on this box" — not a
/// routable UDP destination. We rewrite rather than reject, since the
/// obvious intent of configuring one of these is "localhost".
const UNROUTABLE_UDP_HOSTS: [&str; 4] = ["0.0.0.0", "", "any", "all"];

impl Config {
    /// Validates the configuration and normalises the UDP destination host,
    /// per spec.md §4.6. Called once by `Simulator::new`.
    pub fn validate(mut self) -> Result<Self> {
        if self.interval_seconds <= 0.0 {
            return Err(SimError::Config(format!(
                "interval_seconds must be positive, got {}",
                self.interval_seconds
            )));
        }

        if self.udp_host.trim().is_empty() {
            return Err(SimError::Config("udp_host must not be empty".to_string()));
        }

        if UNROUTABLE_UDP_HOSTS.contains(&self.udp_host.to_ascii_lowercase().as_str()) {
            log::warn!(
                "udp_host {:?} is not a usable destination, rewriting to 127.0.0.1",
                self.udp_host
            );
            self.udp_host = "127.0.0.1".to_string();
        }

        if let Some(track) = &self.gpx_track {
            if track.points.len() < 2 {
                return Err(SimError::Config(
                    "gpx_track must contain at least 2 points".to_string(),
                ));
            }
        }

        if let Some(f) = self.gpx_start_fraction {
            if !(0.0..=1.0).contains(&f) {
                return Err(SimError::Config(format!(
                    "gpx_start_fraction must be in [0, 1], got {f}"
                )));
            }
        }

        Ok(self)
    }
}
