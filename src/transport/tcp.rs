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

//! Optional broadcast listener: accepts non-blocking, writes every tick's
//! packet to every connected peer, drops any peer whose write fails
//! (spec.md §4.7). No per-peer buffering or retry.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use chrono::{DateTime, Utc};
use socket2::{Domain, Socket, Type};

use crate::error::{Result, SimError};

pub struct Peer {
    pub stream: TcpStream,
    pub address: String,
    pub connected_at: DateTime<Utc>,
}

/// Binds with `SO_REUSEADDR` set, so restarting the simulator shortly after
/// a previous run doesn't fail to rebind while the old socket lingers in
/// `TIME_WAIT` (spec.md §4.7).
pub fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let addr: SocketAddr = (host, port)
        .to_socket_addrs()
        .map_err(SimError::Bind)?
        .next()
        .ok_or_else(|| SimError::Bind(std::io::Error::other(format!("no address for {host}:{port}"))))?;

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None).map_err(SimError::Bind)?;
    socket.set_reuse_address(true).map_err(SimError::Bind)?;
    socket.bind(&addr.into()).map_err(SimError::Bind)?;
    socket.listen(128).map_err(SimError::Bind)?;

    let listener: TcpListener = socket.into();
    listener.set_nonblocking(true).map_err(SimError::Bind)?;
    Ok(listener)
}

/// Drains every pending connection, non-blocking (spec.md §4.5 step 1).
pub fn accept_pending(listener: &TcpListener, peers: &mut Vec<Peer>) {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(e) = stream.set_nonblocking(true) {
                    log::error!("failed to configure accepted peer {addr}: {e}");
                    continue;
                }
                log::info!("TCP client connected: {addr}");
                peers.push(Peer {
                    stream,
                    address: addr.to_string(),
                    connected_at: Utc::now(),
                });
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) => {
                log::error!("TCP accept failed: {e}");
                break;
            }
        }
    }
}

/// Writes `packet` to every peer, dropping (and logging) any that fails.
pub fn broadcast(peers: &mut Vec<Peer>, packet: &[u8]) {
    peers.retain_mut(|peer| match peer.stream.write_all(packet) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("dropping TCP peer {}: {e}", peer.address);
            false
        }
    });
}
