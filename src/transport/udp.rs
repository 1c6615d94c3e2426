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

//! Single unconnected datagram socket, bound once at worker start and
//! reused for every tick (spec.md §4.6).

use std::net::UdpSocket;

use crate::error::{Result, SimError};

pub fn bind() -> Result<UdpSocket> {
    UdpSocket::bind("0.0.0.0:0").map_err(SimError::Bind)
}

/// Sends one composed packet, logging (not propagating) a failed send —
/// the emitter is best-effort, per spec.md §7's TransientIOError policy.
pub fn send(socket: &UdpSocket, host: &str, port: u16, packet: &[u8]) {
    match socket.send_to(packet, (host, port)) {
        Ok(_) => {}
        Err(e) => log::error!("UDP send to {host}:{port} failed: {e}"),
    }
}
