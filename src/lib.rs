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

//! A customizable marine NMEA 0183 / AIS traffic generator.
//!
//! Simulates a single own-ship and a fleet of AIS Class B targets, emitting
//! NMEA 0183 and AIVDM sentences over UDP and (optionally) TCP at a fixed
//! tick rate. Own-ship kinematics are either randomly perturbed or driven
//! by an uploaded GPX track; AIS targets either drift freely around the
//! own-ship or shadow the same track with small per-target offsets.

pub mod ais;
pub mod config;
pub mod engine;
pub mod error;
pub mod gnss;
pub mod gpx;
pub mod kinematics;
pub mod nmea;
pub mod transport;
pub mod types;

pub use config::Config;
pub use engine::Simulator;
pub use error::{Result, SimError};
pub use types::StatusSnapshot;
