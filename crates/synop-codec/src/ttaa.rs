//! FM-35 TTAA upper-air sounding decoding.
//!
//! Decodes the mandatory-surface groups the upper-air analysis consumes
//! (850/700/500/200 hPa). Bulletins are expected in the archive format with
//! a full `YYYYMMDDHHMM` timestamp preceding the `TTAA` indicator.

use crate::DecodeError;
use chart_common::LevelTag;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// One decoded mandatory pressure surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundingLevel {
    pub level: LevelTag,
    pub pressure_hpa: u32,
    pub height: Option<f64>,
    pub temperature: Option<f64>,
    pub dew_point: Option<f64>,
    pub wind_direction: Option<i32>,
    pub wind_speed: Option<f64>,
}

/// A decoded TTAA sounding bulletin.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSounding {
    pub station_id: String,
    pub observation_time: DateTime<Utc>,
    pub levels: Vec<SoundingLevel>,
}

/// Group prefixes that terminate the mandatory-level section.
const TERMINATORS: [&str; 4] = ["88999", "77999", "31313", "51515"];

/// Decode one TTAA bulletin.
pub fn decode_ttaa(report: &str) -> Result<DecodedSounding, DecodeError> {
    let cleaned = report.trim_end_matches('=').replace('\n', " ");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "NIL" {
        return Err(DecodeError::Empty);
    }

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(DecodeError::BadFormat(preview(trimmed)));
    }

    let observation_time = NaiveDateTime::parse_from_str(parts[0], "%Y%m%d%H%M")
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .map_err(|_| DecodeError::BadFormat(format!("timestamp {}", parts[0])))?;

    if parts[1] != "TTAA" {
        return Err(DecodeError::BadFormat(format!(
            "expected TTAA, got {}",
            parts[1]
        )));
    }

    let station_id = parts[3];
    if station_id.len() != 5 || !station_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::BadFormat(format!("station id {}", station_id)));
    }

    let mut decoded = DecodedSounding {
        station_id: station_id.to_string(),
        observation_time,
        levels: Vec::new(),
    };

    let mut i = 4;
    while i < parts.len() {
        let group = parts[i];
        if TERMINATORS.contains(&group) {
            break;
        }

        if group.len() != 5 || !group.bytes().all(|b| b.is_ascii_digit()) {
            i += 1;
            continue;
        }

        let pressure_hpa = if let Some(rest) = group.strip_prefix("99") {
            rest.parse::<u32>().unwrap_or(0)
        } else if group.starts_with("00") {
            1000
        } else {
            group[..2].parse::<u32>().unwrap_or(0) * 10
        };

        let Some(level) = mandatory_level(pressure_hpa) else {
            tracing::debug!(pressure_hpa, "Skipping pressure level outside the analysis set");
            i += 1;
            continue;
        };

        let mut level_data = SoundingLevel {
            level,
            pressure_hpa,
            height: decode_height(group, pressure_hpa),
            temperature: None,
            dew_point: None,
            wind_direction: None,
            wind_speed: None,
        };

        if let Some(temp_group) = parts.get(i + 1).filter(|g| **g != "/////") {
            if temp_group.len() == 5 && temp_group.bytes().all(|b| b.is_ascii_digit()) {
                if let (Ok(temp_raw), Some(sign_digit)) =
                    (temp_group[..3].parse::<i32>(), temp_group.chars().nth(2))
                {
                    let sign = if sign_digit.to_digit(10).map(|d| d % 2 == 1) == Some(true) {
                        -1.0
                    } else {
                        1.0
                    };
                    let temperature = sign * temp_raw as f64 / 10.0;
                    level_data.temperature = Some(temperature);

                    if let Ok(dpd_raw) = temp_group[3..].parse::<i32>() {
                        // depression fold: 50+ encodes whole degrees
                        let dpd = if dpd_raw >= 50 {
                            (dpd_raw - 50) as f64
                        } else {
                            dpd_raw as f64 / 10.0
                        };
                        level_data.dew_point = Some(temperature - dpd);
                    }
                }
            }
        }

        if let Some(wind_group) = parts.get(i + 2).filter(|g| **g != "/////") {
            if wind_group.len() == 5 && wind_group.bytes().all(|b| b.is_ascii_digit()) {
                if let (Ok(dir_raw), Ok(spd_raw)) =
                    (wind_group[..2].parse::<i32>(), wind_group[2..].parse::<i32>())
                {
                    let mut direction = dir_raw * 10;
                    let mut speed = spd_raw;
                    // 500-knot fold carries the units digit of the direction
                    if matches!(wind_group.chars().nth(2), Some('1') | Some('5')) && speed >= 500 {
                        direction = (dir_raw - 50) * 10;
                        speed -= 500;
                    }
                    level_data.wind_direction = Some(direction);
                    level_data.wind_speed = Some(speed as f64);
                }
            }
        }

        decoded.levels.push(level_data);
        i += 3;
    }

    Ok(decoded)
}

fn mandatory_level(pressure_hpa: u32) -> Option<LevelTag> {
    match pressure_hpa {
        850 => Some(LevelTag::Hpa850),
        700 => Some(LevelTag::Hpa700),
        500 => Some(LevelTag::Hpa500),
        200 => Some(LevelTag::Hpa200),
        _ => None,
    }
}

/// Geopotential height from the level group's last three digits.
fn decode_height(group: &str, pressure_hpa: u32) -> Option<f64> {
    if group.starts_with("99") {
        return None;
    }
    let raw = group[2..].parse::<i64>().ok()?;
    let height = if group.starts_with("00") {
        if raw >= 500 {
            -(raw - 500)
        } else {
            raw
        }
    } else if pressure_hpa <= 500 {
        raw * 10
    } else if pressure_hpa <= 850 {
        raw + 1000
    } else {
        raw
    };
    Some(height as f64)
}

fn preview(report: &str) -> String {
    report.chars().take(40).collect()
}
