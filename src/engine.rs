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

//! The tick engine (spec.md §4.5) and the control plane wired around it
//! (start/stop/restart/status/stream, spec.md §5-§6).

use std::collections::VecDeque;
use std::net::UdpSocket;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::ais::{self, AisFleet};
use crate::config::Config;
use crate::error::{Result, SimError};
use crate::gnss;
use crate::gpx::{self, IndexCursor};
use crate::kinematics;
use crate::nmea;
use crate::transport::tcp::{self, Peer};
use crate::transport::udp;
use crate::types::{
    AisTargetSummary, GpxProgress, GpxTrackInfo, OwnShipState, StatusSnapshot, TcpPeerSummary,
};

const RING_BUFFER_CAPACITY: usize = 200;
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

struct SharedState {
    own: OwnShipState,
    ais: AisFleet,
    gnss: Option<crate::types::GnssSnapshot>,
    gpx_cursor: Option<IndexCursor>,
    ring: VecDeque<String>,
    tcp_peers: Vec<Peer>,
    stop: bool,
    running: bool,
}

struct Worker {
    handle: JoinHandle<()>,
    done_rx: Receiver<()>,
}

/// Owns one simulation run. Configuration is immutable for the lifetime of
/// a `Simulator`; `restart` tears down and rebuilds it (spec.md §3's
/// ownership note).
pub struct Simulator {
    config: Config,
    state: Arc<Mutex<SharedState>>,
    worker: Mutex<Option<Worker>>,
}

impl Simulator {
    pub fn new(config: Config) -> Result<Self> {
        let config = config.validate()?;
        let own = OwnShipState {
            lat: config.initial_lat,
            lon: config.initial_lon,
            sog: config.initial_sog,
            cog: config.initial_cog,
            tws: config.initial_tws,
            twd: config.initial_twd,
            sim_time: config.start_datetime,
        };

        let mut seed_rng = SmallRng::from_entropy();
        let ais = ais::init_fleet(
            config.ais_num_targets as usize,
            own.lat,
            own.lon,
            own.sog,
            own.cog,
            config.ais_max_sog_offset_kn,
            config.ais_max_cog_offset_deg,
            config.ais_distribution_radius_nm,
            config.gpx_track.as_ref(),
            &config.skipper_names,
            &mut seed_rng,
        );

        let gpx_cursor = match &config.gpx_track {
            Some(track) if !track.has_time() => Some(IndexCursor::from_fraction(
                track,
                config.gpx_start_fraction.unwrap_or(0.0),
            )),
            _ => None,
        };

        let state = SharedState {
            own,
            ais,
            gnss: None,
            gpx_cursor,
            ring: VecDeque::with_capacity(RING_BUFFER_CAPACITY),
            tcp_peers: Vec::new(),
            stop: false,
            running: false,
        };

        Ok(Simulator {
            config,
            state: Arc::new(Mutex::new(state)),
            worker: Mutex::new(None),
        })
    }

    /// Binds the sockets and spawns the worker thread. Leaves no background
    /// worker running if binding fails (spec.md §7's BindError contract).
    pub fn start(&self) -> Result<()> {
        let mut worker_slot = self.worker.lock().unwrap();
        if worker_slot.is_some() {
            return Err(SimError::AlreadyRunning);
        }

        let udp_socket = udp::bind()?;
        let tcp_listener = match self.config.tcp_port {
            Some(port) => {
                let listener = tcp::bind(&self.config.tcp_host, port)?;
                log::info!("TCP server listening on {}:{port}", self.config.tcp_host);
                Some(listener)
            }
            None => None,
        };

        {
            let mut st = self.state.lock().unwrap();
            st.stop = false;
            st.running = true;
        }

        log::info!(
            "NMEA simulator started, sending to {}:{} every {}s",
            self.config.udp_host,
            self.config.udp_port,
            self.config.interval_seconds
        );

        let (done_tx, done_rx) = mpsc::channel();
        let config = self.config.clone();
        let state = Arc::clone(&self.state);
        let handle = thread::spawn(move || {
            run_tick_loop(&config, &state, udp_socket, tcp_listener);
            state.lock().unwrap().running = false;
            let _ = done_tx.send(());
        });

        *worker_slot = Some(Worker { handle, done_rx });
        Ok(())
    }

    /// Signals the worker to stop and joins it with a bounded timeout,
    /// per spec.md §5's cancellation semantics.
    pub fn stop(&self) -> Result<()> {
        let mut worker_slot = self.worker.lock().unwrap();
        let worker = worker_slot.take().ok_or(SimError::NotRunning)?;

        {
            let mut st = self.state.lock().unwrap();
            st.stop = true;
        }

        if worker.done_rx.recv_timeout(STOP_JOIN_TIMEOUT).is_err() {
            log::warn!("worker did not acknowledge stop within {STOP_JOIN_TIMEOUT:?}");
        }
        let _ = worker.handle.join();

        let mut st = self.state.lock().unwrap();
        st.running = false;
        st.tcp_peers.clear();
        Ok(())
    }

    /// Stops (if running) and starts again with a new configuration.
    pub fn restart(self, config: Config) -> Result<Simulator> {
        if self.worker.lock().unwrap().is_some() {
            self.stop()?;
        }
        let restarted = Simulator::new(config)?;
        restarted.start()?;
        Ok(restarted)
    }

    pub fn status(&self) -> StatusSnapshot {
        let st = self.state.lock().unwrap();

        let gpx_track_info = self.config.gpx_track.as_ref().map(|track| {
            let progress = if track.has_time() {
                let sim_time = st.own.sim_time.unwrap_or_else(Utc::now);
                let start = track.start_time().unwrap_or(sim_time);
                let offset_s = (sim_time - start).num_seconds().max(0);
                let bounded = match track.duration_seconds() {
                    Some(d) => offset_s.min(d),
                    None => offset_s,
                };
                GpxProgress::Time {
                    offset_s: bounded,
                    sim_time,
                }
            } else {
                let index = st.gpx_cursor.map(|c| c.index).unwrap_or(0);
                GpxProgress::Index {
                    index,
                    fraction: st.gpx_cursor.map(|c| c.fraction(track)).unwrap_or(0.0),
                }
            };

            GpxTrackInfo {
                points: track.points.len(),
                start_time: track.start_time(),
                end_time: track.end_time(),
                duration_s: track.duration_seconds(),
                has_time: track.has_time(),
                progress,
            }
        });

        StatusSnapshot {
            running: st.running,
            udp_host: self.config.udp_host.clone(),
            udp_port: self.config.udp_port,
            tcp_host: self.config.tcp_host.clone(),
            tcp_port: self.config.tcp_port,
            interval_seconds: self.config.interval_seconds,
            wind_enabled: self.config.wind_enabled,
            lat: st.own.lat,
            lon: st.own.lon,
            sog: st.own.sog,
            cog: st.own.cog,
            tws: st.own.tws,
            twd: st.own.twd,
            magvar: self.config.magnetic_variation_deg,
            sim_time: st.own.sim_time,
            gnss: st.gnss.clone(),
            ais_targets: st.ais.targets.iter().map(AisTargetSummary::from).collect(),
            stream_size: st.ring.len(),
            tcp_peers: st
                .tcp_peers
                .iter()
                .map(|p| TcpPeerSummary {
                    address: p.address.clone(),
                    connected_at: p.connected_at,
                })
                .collect(),
            gpx_track_info,
        }
    }

    /// Returns up to `limit` of the most recent lines (bounded to the ring
    /// buffer's own 200-line capacity), oldest first.
    pub fn stream(&self, limit: usize) -> Vec<String> {
        let st = self.state.lock().unwrap();
        let limit = limit.min(st.ring.len());
        st.ring.iter().rev().take(limit).rev().cloned().collect()
    }
}

fn run_tick_loop(
    config: &Config,
    state: &Arc<Mutex<SharedState>>,
    udp_socket: UdpSocket,
    tcp_listener: Option<std::net::TcpListener>,
) {
    let mut rng = SmallRng::from_entropy();
    let interval = Duration::from_secs_f64(config.interval_seconds.max(0.0));

    loop {
        let loop_start = Instant::now();

        let packet = {
            let mut st = state.lock().unwrap();
            if st.stop {
                break;
            }

            if let Some(listener) = &tcp_listener {
                tcp::accept_pending(listener, &mut st.tcp_peers);
            }

            let current_utc = match st.own.sim_time {
                Some(t) => {
                    st.own.sim_time = Some(
                        t + chrono::Duration::milliseconds(
                            (config.interval_seconds * 1000.0).round() as i64,
                        ),
                    );
                    t
                }
                None => Utc::now(),
            };

            advance_own_ship(config, &mut st, current_utc, &mut rng);
            kinematics::random_walk_wind(&mut st.own, &mut rng);

            let wind = kinematics::derive_wind(&st.own, config.magnetic_variation_deg, &mut rng);

            let gnss_snapshot = gnss::generate(&mut rng);

            let gpx_cursor_index = st.gpx_cursor.map(|c| c.index).unwrap_or(0);
            ais::update_fleet(
                &mut st.ais,
                st.own.lat,
                st.own.lon,
                st.own.sog,
                st.own.cog,
                config.ais_max_sog_offset_kn,
                config.ais_max_cog_offset_deg,
                config.interval_seconds,
                config.gpx_track.as_ref(),
                gpx_cursor_index,
                current_utc,
                &mut rng,
            );
            let ais_text = ais::compose_sentences(&mut st.ais, current_utc);

            let sats_used_prns = gnss_snapshot.used_prns();
            let mut packet = String::new();
            packet.push_str(&nmea::gprmc(
                current_utc,
                st.own.lat,
                st.own.lon,
                st.own.sog,
                st.own.cog,
                config.magnetic_variation_deg,
            ));
            packet.push_str(&nmea::gpgga(
                current_utc,
                st.own.lat,
                st.own.lon,
                gnss_snapshot.sats_used,
                gnss_snapshot.hdop,
                0.0,
            ));
            packet.push_str(&nmea::gpvtg(
                st.own.cog,
                Some(wind.cog_magnetic),
                st.own.sog,
                wind.sog_kmh,
            ));
            packet.push_str(&nmea::gpgsa(
                'A',
                3,
                &sats_used_prns,
                gnss_snapshot.pdop,
                gnss_snapshot.hdop,
                gnss_snapshot.vdop,
            ));
            for sentence in nmea::gpgsv(&gnss_snapshot.satellites) {
                packet.push_str(&sentence);
            }
            packet.push_str(&ais_text);
            if config.wind_enabled {
                packet.push_str(&nmea::wimwd(st.own.twd, wind.twd_magnetic, st.own.tws, wind.tws_mps));
                packet.push_str(&nmea::wimwv_true(wind.twa, st.own.tws));
                packet.push_str(&nmea::wimwv_apparent(wind.awa, wind.aws));
            }

            st.gnss = Some(gnss_snapshot);

            for line in packet.split("\r\n") {
                if line.is_empty() {
                    continue;
                }
                if st.ring.len() >= RING_BUFFER_CAPACITY {
                    st.ring.pop_front();
                }
                st.ring.push_back(line.to_string());
            }

            let console_line = format!(
                "Sent at {}: Lat={:.4}, Lon={:.4}, SOG={:.1}kn, COG={:.0}\u{b0}, {}",
                current_utc.format("%H:%M:%S"),
                st.own.lat,
                st.own.lon,
                st.own.sog,
                st.own.cog,
                if config.wind_enabled {
                    format!(
                        "TWS={:.1}kn, TWD={:.0}\u{b0}, TWA={:.0}\u{b0}",
                        st.own.tws, st.own.twd, wind.twa
                    )
                } else {
                    "TWS=---, TWD=---, TWA=---".to_string()
                }
            );
            println!("{console_line}");
            log::info!("{console_line}");

            packet
        };

        udp::send(&udp_socket, &config.udp_host, config.udp_port, packet.as_bytes());

        if tcp_listener.is_some() {
            let mut peers = {
                let mut st = state.lock().unwrap();
                std::mem::take(&mut st.tcp_peers)
            };
            tcp::broadcast(&mut peers, packet.as_bytes());
            let mut st = state.lock().unwrap();
            st.tcp_peers.extend(peers);
        }

        let elapsed = loop_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        } else {
            log::warn!("tick loop fell behind its {interval:?} interval (took {elapsed:?})");
        }
    }
}

/// Advances own-ship position/SOG/COG via free-drift kinematics or GPX
/// replay (spec.md §4.2/§4.3). TWS/TWD are handled by the caller.
fn advance_own_ship(
    config: &Config,
    st: &mut SharedState,
    current_utc: chrono::DateTime<Utc>,
    rng: &mut impl rand::Rng,
) {
    match &config.gpx_track {
        Some(track) if track.has_time() => {
            let (lat, lon, sog, cog) = gpx::sample_time_indexed(track, current_utc);
            st.own.lat = lat;
            st.own.lon = lon;
            st.own.sog = sog;
            st.own.cog = cog;
        }
        Some(track) => {
            let cursor = st
                .gpx_cursor
                .get_or_insert_with(|| IndexCursor::from_fraction(track, 0.0));
            let mut lat = st.own.lat;
            let mut lon = st.own.lon;
            let cog = cursor.advance(track, &mut lat, &mut lon, st.own.sog, config.interval_seconds);
            st.own.lat = lat;
            st.own.lon = lon;
            st.own.cog = cog;
        }
        None => {
            kinematics::advance_position(
                &mut st.own.lat,
                &mut st.own.lon,
                st.own.sog,
                st.own.cog,
                config.interval_seconds,
            );
            kinematics::random_walk_sog_cog(&mut st.own, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_caps_at_200_lines() {
        let mut ring: VecDeque<String> = VecDeque::new();
        for i in 0..500 {
            if ring.len() >= RING_BUFFER_CAPACITY {
                ring.pop_front();
            }
            ring.push_back(format!("line-{i}"));
        }
        assert_eq!(ring.len(), RING_BUFFER_CAPACITY);
        assert_eq!(ring.front().unwrap(), "line-300");
        assert_eq!(ring.back().unwrap(), "line-499");
    }

    #[test]
    fn simulator_rejects_invalid_config() {
        let mut config = Config::default();
        config.interval_seconds = 0.0;
        assert!(Simulator::new(config).is_err());
    }

    #[test]
    fn double_start_is_rejected() {
        let config = Config {
            tcp_port: None,
            interval_seconds: 0.01,
            ais_num_targets: 0,
            ..Config::default()
        };
        let sim = Simulator::new(config).unwrap();
        sim.start().unwrap();
        assert!(matches!(sim.start(), Err(SimError::AlreadyRunning)));
        sim.stop().unwrap();
    }
}
