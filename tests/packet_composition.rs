//! End-to-end checks of the tick engine: packet composition ordering,
//! the 200-line ring buffer, and the AIS static-report minute gate.

use std::thread;
use std::time::Duration;

use nmea_sim::{Config, Simulator};

fn fast_config() -> Config {
    Config {
        interval_seconds: 0.02,
        tcp_port: None,
        ais_num_targets: 2,
        ..Config::default()
    }
}

#[test]
fn stream_contains_every_sentence_type_per_tick() {
    let sim = Simulator::new(fast_config()).unwrap();
    sim.start().unwrap();
    thread::sleep(Duration::from_millis(200));
    sim.stop().unwrap();

    let lines = sim.stream(200);
    assert!(!lines.is_empty());

    assert!(lines.iter().any(|l| l.starts_with("$GPRMC")));
    assert!(lines.iter().any(|l| l.starts_with("$GPGGA")));
    assert!(lines.iter().any(|l| l.starts_with("$GPVTG")));
    assert!(lines.iter().any(|l| l.starts_with("$GPGSA")));
    assert!(lines.iter().any(|l| l.starts_with("$GPGSV")));
    assert!(lines.iter().any(|l| l.starts_with("!AIVDM")));
    // Config::default enables wind sentences.
    assert!(lines.iter().any(|l| l.starts_with("$WIMWD")));
}

#[test]
fn stream_respects_requested_limit_and_stays_a_suffix() {
    let sim = Simulator::new(fast_config()).unwrap();
    sim.start().unwrap();
    thread::sleep(Duration::from_millis(400));
    sim.stop().unwrap();

    let all = sim.stream(10_000);
    let tail = sim.stream(3);
    assert!(tail.len() <= 3);
    assert_eq!(tail, &all[all.len() - tail.len()..]);
}

#[test]
fn status_reports_running_and_ais_targets_after_start() {
    let sim = Simulator::new(fast_config()).unwrap();
    sim.start().unwrap();
    thread::sleep(Duration::from_millis(100));

    let status = sim.status();
    assert!(status.running);
    assert_eq!(status.ais_targets.len(), 2);
    assert!(status.gnss.is_some());

    sim.stop().unwrap();
    assert!(!sim.status().running);
}

#[test]
fn double_stop_is_rejected_not_running() {
    let sim = Simulator::new(fast_config()).unwrap();
    sim.start().unwrap();
    sim.stop().unwrap();
    assert!(sim.stop().is_err());
}
