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

//! AIVDM Type 18 (Class B position report) and Type 24 Part A (static data)
//! binary packers, plus the shared 6-bit ITU-R M.1371 armoring (spec.md §4.1).

use crate::nmea::frame;

/// AIS 6-bit text character set per ITU-R M.1371.
const AIS_CHARSET: &[u8; 64] =
    b"@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_ !\"#$%&'()*+,-./0123456789:;<=>?";

/// Accumulates fields into a bitstring, MSB first, for later 6-bit armoring.
struct BitWriter {
    bits: Vec<bool>,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter { bits: Vec::new() }
    }

    fn push_unsigned(&mut self, value: u64, width: u32) {
        for i in (0..width).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    fn push_signed(&mut self, value: i64, width: u32) {
        let unsigned = if value < 0 {
            ((1i64 << width) + value) as u64
        } else {
            value as u64
        };
        self.push_unsigned(unsigned, width);
    }

    fn push_sixbit_text(&mut self, text: &str, width_chars: usize) {
        let mut chars: Vec<u8> = text
            .to_ascii_uppercase()
            .bytes()
            .map(|b| if AIS_CHARSET.contains(&b) { b } else { b' ' })
            .collect();
        chars.truncate(width_chars);
        while chars.len() < width_chars {
            chars.push(b'@');
        }
        for ch in chars {
            let idx = AIS_CHARSET.iter().position(|&c| c == ch).unwrap_or(0);
            self.push_unsigned(idx as u64, 6);
        }
    }

    /// Right-pads to a multiple of 6 bits and armors into ASCII, returning
    /// `(payload, fill)`.
    fn into_payload(self) -> (String, u8) {
        let fill = ((6 - self.bits.len() % 6) % 6) as u8;
        let mut bits = self.bits;
        bits.resize(bits.len() + fill as usize, false);

        let payload: String = bits
            .chunks(6)
            .map(|chunk| {
                let mut v: u16 = 0;
                for &b in chunk {
                    v = (v << 1) | (b as u16);
                }
                v += 48;
                if v > 87 {
                    v += 8;
                }
                v as u8 as char
            })
            .collect();

        (payload, fill)
    }
}

fn aivdm_line(payload: &str, fill: u8) -> String {
    let body = format!("AIVDM,1,1,,A,{payload},{fill}");
    frame('!', &body)
}

/// Encodes a Class B position report (spec.md §4.1 "Type 18").
pub fn type18(
    mmsi: u32,
    lat: f64,
    lon: f64,
    sog_kn: f64,
    cog_deg: f64,
    heading_deg: f64,
    timestamp_sec: u32,
) -> String {
    let sog = ((sog_kn.clamp(0.0, 102.2)) * 10.0).round() as u32;
    let sog = sog.min(1022);
    let lon_i = (lon * 600_000.0).round() as i64;
    let lat_i = (lat * 600_000.0).round() as i64;
    let mut cog = ((cog_deg.rem_euclid(360.0)) * 10.0).round() as u32;
    if cog == 3600 {
        cog = 0;
    }
    let hdg_raw = heading_deg.rem_euclid(360.0).round() as u32;
    let hdg = if hdg_raw <= 359 { hdg_raw } else { 511 };
    let ts = timestamp_sec.min(59);

    let mut w = BitWriter::new();
    w.push_unsigned(18, 6); // message id
    w.push_unsigned(0, 2); // repeat
    w.push_unsigned(mmsi as u64, 30);
    w.push_unsigned(0, 8); // reserved
    w.push_unsigned(sog as u64, 10);
    w.push_unsigned(0, 1); // position accuracy
    w.push_signed(lon_i, 28);
    w.push_signed(lat_i, 27);
    w.push_unsigned(cog as u64, 12);
    w.push_unsigned(hdg as u64, 9);
    w.push_unsigned(ts as u64, 6);
    w.push_unsigned(0, 2); // reserved
    for _ in 0..7 {
        w.push_unsigned(0, 1); // 7 boolean flags, all zero
    }
    w.push_unsigned(0, 19); // comm state

    let (payload, fill) = w.into_payload();
    aivdm_line(&payload, fill)
}

/// Encodes a Class B static data report, Part A (spec.md §4.1 "Type 24").
pub fn type24_part_a(mmsi: u32, name: &str) -> String {
    let mut w = BitWriter::new();
    w.push_unsigned(24, 6);
    w.push_unsigned(0, 2);
    w.push_unsigned(mmsi as u64, 30);
    w.push_unsigned(0, 2); // part number = A
    w.push_sixbit_text(name, 20);

    let (payload, fill) = w.into_payload();
    aivdm_line(&payload, fill)
}

/// Builds the 20-char static-report name per spec.md §4.4's emission
/// schedule: `TRUNC(base_name, 20 - len(suffix)) + suffix`, where
/// `suffix = " <sog 1dp>/<cog 3dig>"`.
pub fn static_report_name(base_name: &str, sog_kn: f64, cog_deg: f64) -> String {
    let cog = (cog_deg.round() as i64).rem_euclid(360);
    let suffix = format!(" {sog_kn:.1}/{cog:03}");
    let max_len = 20;
    if max_len < suffix.len() + 1 {
        let compact = format!("{sog_kn:.1}/{cog:03}");
        return compact.chars().take(max_len).collect();
    }
    let allowed = max_len - suffix.len();
    let truncated: String = base_name.chars().take(allowed).collect();
    format!("{truncated}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DecodedType18 {
        mmsi: u32,
        sog: u32,
        lon_i: i64,
        lat_i: i64,
        cog: u32,
        heading: u32,
    }

    /// Decodes a Type 18 payload back to its scaled integer fields, for
    /// round-trip testing (P3).
    fn decode_type18(line: &str) -> DecodedType18 {
        let start = line.find(",,A,").unwrap() + 4;
        let rest = &line[start..];
        let comma = rest.find(',').unwrap();
        let payload = &rest[..comma];

        let mut bits = Vec::new();
        for ch in payload.chars() {
            let mut v = ch as u32 - 48;
            if v > 40 {
                v -= 8;
            }
            for i in (0..6).rev() {
                bits.push((v >> i) & 1 == 1);
            }
        }

        let read_unsigned = |start: usize, width: usize| -> u64 {
            let mut v: u64 = 0;
            for &b in &bits[start..start + width] {
                v = (v << 1) | (b as u64);
            }
            v
        };
        let read_signed = |start: usize, width: usize| -> i64 {
            let raw = read_unsigned(start, width);
            let sign_bit = 1u64 << (width - 1);
            if raw & sign_bit != 0 {
                raw as i64 - (1i64 << width)
            } else {
                raw as i64
            }
        };

        DecodedType18 {
            mmsi: read_unsigned(8, 30) as u32,
            sog: read_unsigned(46, 10) as u32,
            lon_i: read_signed(57, 28),
            lat_i: read_signed(85, 27),
            cog: read_unsigned(112, 12) as u32,
            heading: read_unsigned(124, 9) as u32,
        }
    }

    #[test]
    fn type18_round_trips_within_resolution() {
        // S5
        let line = type18(123456789, 0.0, 0.0, 10.0, 90.0, 90.0, 30);
        assert!(line.starts_with('!'));
        assert!(line.ends_with("\r\n"));

        let decoded = decode_type18(&line);
        assert_eq!(decoded.mmsi, 123456789);
        assert_eq!(decoded.lon_i, 0);
        assert_eq!(decoded.lat_i, 0);
        assert_eq!(decoded.sog, 100);
        assert_eq!(decoded.cog, 900);
        assert_eq!(decoded.heading, 90);
    }

    #[test]
    fn type24_name_round_trips_after_trimming_fill() {
        // S7
        let name = static_report_name("ALPHA", 5.3, 47.0);
        assert_eq!(name, "ALPHA 5.3/047");

        let line = type24_part_a(42, &name);
        assert!(line.starts_with('!'));

        // Decode the 120-bit name field back out.
        let start = line.find(",,A,").unwrap() + 4;
        let rest = &line[start..];
        let comma = rest.find(',').unwrap();
        let payload = &rest[..comma];
        let mut bits = Vec::new();
        for ch in payload.chars() {
            let mut v = ch as u32;
            if v >= 88 {
                v -= 8;
            }
            v -= 48;
            for i in (0..6).rev() {
                bits.push((v >> i) & 1 == 1);
            }
        }
        let name_bits = &bits[38..38 + 120];
        let decoded: String = name_bits
            .chunks(6)
            .map(|chunk| {
                let mut v: usize = 0;
                for &b in chunk {
                    v = (v << 1) | (b as usize);
                }
                AIS_CHARSET[v] as char
            })
            .collect();
        assert_eq!(decoded.trim_end_matches('@'), "ALPHA 5.3/047");
        assert!(decoded.len() <= 20);
        assert!(decoded.chars().all(|c| AIS_CHARSET.contains(&(c as u8))));
    }

    #[test]
    fn static_report_name_falls_back_when_suffix_too_long() {
        let name = static_report_name("X", 102.2, 359.0);
        assert!(name.len() <= 20);
    }
}
