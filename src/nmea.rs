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

//! NMEA 0183 sentence encoding: checksums, coordinate formatting, and the
//! handful of talker sentences this simulator emits (GPRMC, GPGGA, GPVTG,
//! GPGSA, GPGSV, WIMWD, WIMWV).

use chrono::{DateTime, Utc};

use crate::types::SatelliteInfo;

/// XOR of every byte in `body` (I3), rendered as two uppercase hex digits.
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

/// Wraps a sentence body with its framing character, checksum and CRLF (I4).
pub fn frame(leader: char, body: &str) -> String {
    format!("{leader}{body}*{:02X}\r\n", checksum(body))
}

/// "DDMM.mmmm,H" with H in {N,S}.
pub fn format_lat(lat: f64) -> String {
    let hemi = if lat >= 0.0 { 'N' } else { 'S' };
    let abs = lat.abs();
    let deg = abs.trunc() as u32;
    let min = (abs - deg as f64) * 60.0;
    format!("{deg:02}{min:07.4},{hemi}")
}

/// "DDDMM.mmmm,H" with H in {E,W}.
pub fn format_lon(lon: f64) -> String {
    let hemi = if lon >= 0.0 { 'E' } else { 'W' };
    let abs = lon.abs();
    let deg = abs.trunc() as u32;
    let min = (abs - deg as f64) * 60.0;
    format!("{deg:03}{min:07.4},{hemi}")
}

/// Normalises an angle to `[0, 360)` (I2).
pub fn normalize_360(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

pub fn gprmc(
    utc: DateTime<Utc>,
    lat: f64,
    lon: f64,
    sog_kn: f64,
    cog_deg: f64,
    magvar_deg: f64,
) -> String {
    let time_str = utc.format("%H%M%S%.2f");
    let date_str = utc.format("%d%m%y");
    let mag_var_dir = if magvar_deg >= 0.0 { 'E' } else { 'W' };

    let body = format!(
        "GPRMC,{time_str},A,{},{},{sog_kn:.1},{cog_deg:.1},{date_str},{:.1},{mag_var_dir}",
        format_lat(lat),
        format_lon(lon),
        magvar_deg.abs(),
    );
    frame('$', &body)
}

pub fn gpgga(
    utc: DateTime<Utc>,
    lat: f64,
    lon: f64,
    sats_used: usize,
    hdop: f64,
    altitude_m: f64,
) -> String {
    let time_str = utc.format("%H%M%S%.2f");
    let body = format!(
        "GPGGA,{time_str},{},{},1,{sats_used:02},{hdop:.1},{altitude_m:.1},M,0.0,M,,",
        format_lat(lat),
        format_lon(lon),
    );
    frame('$', &body)
}

pub fn gpvtg(cog_true: f64, cog_mag: Option<f64>, sog_kn: f64, sog_kmh: f64) -> String {
    let cog_mag_str = cog_mag.map(|v| format!("{v:.1}")).unwrap_or_default();
    let body = format!("GPVTG,{cog_true:.1},T,{cog_mag_str},M,{sog_kn:.1},N,{sog_kmh:.1},K,A");
    frame('$', &body)
}

/// `used_prns` is truncated to the first 12 entries; the rest are blank.
pub fn gpgsa(mode: char, fix_type: u8, used_prns: &[u8], pdop: f64, hdop: f64, vdop: f64) -> String {
    let mut fields = String::new();
    for i in 0..12 {
        fields.push(',');
        if let Some(prn) = used_prns.get(i) {
            fields.push_str(&format!("{prn:02}"));
        }
    }
    let body = format!("GPGSA,{mode},{fix_type}{fields},{pdop:.1},{hdop:.1},{vdop:.1}");
    frame('$', &body)
}

/// Splits satellites into groups of 4, one GPGSV sentence per group.
pub fn gpgsv(satellites: &[SatelliteInfo]) -> Vec<String> {
    const PER_MSG: usize = 4;
    let total_sats = satellites.len();
    let total_msgs = total_sats.div_ceil(PER_MSG).max(1);

    (0..total_msgs)
        .map(|i| {
            let chunk = &satellites[i * PER_MSG..(i * PER_MSG + PER_MSG).min(total_sats)];
            let mut body = format!("GPGSV,{total_msgs},{},{total_sats:02}", i + 1);
            for sat in chunk {
                body.push_str(&format!(
                    ",{:02},{},{},{}",
                    sat.prn, sat.elevation_deg, sat.azimuth_deg, sat.snr_db
                ));
            }
            frame('$', &body)
        })
        .collect()
}

pub fn wimwd(twd_true: f64, twd_mag: f64, tws_kn: f64, tws_mps: f64) -> String {
    let body = format!("WIMWD,{twd_true:.1},T,{twd_mag:.1},M,{tws_kn:.1},N,{tws_mps:.1},M");
    frame('$', &body)
}

pub fn wimwv_true(twa_deg: f64, tws_kn: f64) -> String {
    let body = format!("WIMWV,{:.1},T,{tws_kn:.1},N,A", twa_deg.abs());
    frame('$', &body)
}

pub fn wimwv_apparent(awa_deg: f64, aws_kn: f64) -> String {
    let body = format!("WIMWV,{:.1},R,{aws_kn:.1},N,A", awa_deg.abs());
    frame('$', &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_matches_known_sentence() {
        // S1
        let body = "GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W";
        assert_eq!(format!("{:02X}", checksum(body)), "6A");
    }

    #[test]
    fn lat_formatting() {
        // S2
        assert_eq!(format_lat(47.0707), "4704.2420,N");
        assert_eq!(format_lat(-33.8688), "3352.1280,S");
    }

    #[test]
    fn lon_formatting() {
        // S3
        assert_eq!(format_lon(15.4395), "01526.3700,E");
        assert_eq!(format_lon(-118.2437), "11814.6220,W");
    }

    #[test]
    fn every_sentence_is_framed_correctly() {
        let utc = Utc::now();
        for line in [
            gprmc(utc, 10.0, 10.0, 5.0, 90.0, -2.5),
            gpgga(utc, 10.0, 10.0, 8, 1.2, 5.0),
            gpvtg(90.0, Some(92.5), 5.0, 9.26),
            gpgsa('A', 3, &[1, 2, 3], 2.0, 1.0, 1.5),
            wimwd(270.0, 272.5, 10.0, 5.1),
            wimwv_true(45.0, 10.0),
            wimwv_apparent(40.0, 12.0),
        ] {
            assert!(line.starts_with('$'));
            assert!(line.ends_with("\r\n"));
            let star = line.rfind('*').unwrap();
            let body = &line[1..star];
            let cs = &line[star + 1..line.len() - 2];
            assert_eq!(cs, format!("{:02X}", checksum(body)));
        }
    }

    #[test]
    fn gpgsv_splits_into_groups_of_four() {
        let sats: Vec<SatelliteInfo> = (1..=9)
            .map(|prn| SatelliteInfo {
                prn,
                elevation_deg: 10,
                azimuth_deg: 20,
                snr_db: 30,
                used: true,
            })
            .collect();
        let sentences = gpgsv(&sats);
        assert_eq!(sentences.len(), 3);
        assert!(sentences[0].contains("GPGSV,3,1,09"));
        assert!(sentences[2].contains("GPGSV,3,3,09"));
    }

    #[test]
    fn gpgsa_pads_to_twelve_slots() {
        let line = gpgsa('A', 3, &[4, 7], 2.0, 1.0, 1.5);
        // 12 comma-separated slots between fix_type and pdop
        let body_start = line.find("GPGSA").unwrap();
        let body_end = line.rfind('*').unwrap();
        let body = &line[body_start..body_end];
        let fields: Vec<&str> = body.split(',').collect();
        // GPGSA, mode, fix_type, <12 slots>, pdop, hdop, vdop = 18 fields
        assert_eq!(fields.len(), 18);
    }
}
