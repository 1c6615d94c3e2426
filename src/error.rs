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

use std::io;

use thiserror::Error;

/// Errors surfaced synchronously by the control plane (`start`/`stop`/`restart`).
///
/// Transient per-tick I/O failures (a dropped UDP send, a failed TCP write)
/// never reach this type — they are logged and counted inside the tick loop,
/// per the "best-effort emitter" design.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to bind socket: {0}")]
    Bind(#[source] io::Error),

    #[error("simulator is already running")]
    AlreadyRunning,

    #[error("simulator is not running")]
    NotRunning,
}

pub type Result<T> = std::result::Result<T, SimError>;
