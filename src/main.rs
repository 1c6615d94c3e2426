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

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Parser;

use nmea_sim::{Config, SimError, Simulator};

#[derive(Parser)]
#[command(name = "nmea-sim", about = "NMEA 0183 / AIS UDP simulator")]
struct Args {
    /// Target UDP host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Target UDP port
    #[arg(long, default_value_t = nmea_sim::config::DEFAULT_UDP_PORT)]
    port: u16,

    /// TCP fan-out port; pass 0 to disable the TCP listener
    #[arg(long, default_value_t = nmea_sim::config::DEFAULT_TCP_PORT)]
    tcp_port: u16,

    /// Send interval, seconds
    #[arg(long, default_value_t = 1.0)]
    interval: f64,

    /// Enable wind instrument sentences (WIMWD/WIMWV)
    #[arg(long, default_value_t = false)]
    wind: bool,

    /// Starting latitude
    #[arg(long)]
    lat: Option<f64>,

    /// Starting longitude
    #[arg(long)]
    lon: Option<f64>,

    /// Initial SOG (knots)
    #[arg(long)]
    sog: Option<f64>,

    /// Initial COG (degrees true)
    #[arg(long)]
    cog: Option<f64>,

    /// Initial TWS (knots)
    #[arg(long)]
    tws: Option<f64>,

    /// Initial TWD (degrees true)
    #[arg(long)]
    twd: Option<f64>,

    /// Magnetic variation (degrees, E=+ / W=-)
    #[arg(long)]
    magvar: Option<f64>,

    /// Simulated start time, RFC 3339. Falls back to real-time UTC if
    /// omitted or unparsable.
    #[arg(long)]
    start_datetime: Option<String>,

    /// Number of simulated AIS Class B targets
    #[arg(long, default_value_t = 0)]
    ais_targets: u32,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let start_datetime = args.start_datetime.as_deref().and_then(|s| {
        match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(e) => {
                println!("Invalid --start-datetime: {e}. Falling back to real-time UTC.");
                None
            }
        }
    });

    let defaults = Config::default();
    let config = Config {
        udp_host: args.host,
        udp_port: args.port,
        tcp_port: if args.tcp_port == 0 { None } else { Some(args.tcp_port) },
        interval_seconds: args.interval,
        wind_enabled: args.wind,
        initial_lat: args.lat.unwrap_or(defaults.initial_lat),
        initial_lon: args.lon.unwrap_or(defaults.initial_lon),
        initial_sog: args.sog.unwrap_or(defaults.initial_sog),
        initial_cog: args.cog.unwrap_or(defaults.initial_cog),
        initial_tws: args.tws.unwrap_or(defaults.initial_tws),
        initial_twd: args.twd.unwrap_or(defaults.initial_twd),
        magnetic_variation_deg: args.magvar.unwrap_or(defaults.magnetic_variation_deg),
        start_datetime,
        ais_num_targets: args.ais_targets,
        ..defaults
    };

    println!("WIND_INSTRUMENTS_ENABLED = {}", config.wind_enabled);

    let udp_host = config.udp_host.clone();
    let udp_port = config.udp_port;
    let interval = config.interval_seconds;

    let sim = match Simulator::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            println!("**ERR: Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = sim.start() {
        println!("**ERR: Failed to start simulator on {udp_host}:{udp_port}: {e}");
        return ExitCode::FAILURE;
    }

    println!("NMEA Simulator started. Sending data to {udp_host}:{udp_port} every {interval}s.");

    let stopping = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stopping);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    }) {
        log::warn!("failed to install Ctrl-C handler: {e}");
    }

    while !stopping.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    println!("\nSimulator stopped by user.");
    match sim.stop() {
        Ok(()) | Err(SimError::NotRunning) => {}
        Err(e) => println!("**ERR: Simulator error while stopping: {e}"),
    }

    ExitCode::SUCCESS
}
