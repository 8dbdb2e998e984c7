//! FM-12 SYNOP (AAXX) surface report decoding.

use crate::DecodeError;

/// Structured content of one decoded SYNOP report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedSynop {
    pub station_id: String,
    /// Day of month from the YYGGiw group
    pub day: u32,
    /// Observation hour (UTC) from the YYGGiw group
    pub hour: u32,
    pub wind_direction: Option<i32>,
    pub wind_speed: Option<f64>,
    pub temperature: Option<f64>,
    pub dew_point: Option<f64>,
    pub station_pressure: Option<f64>,
    pub sea_level_pressure: Option<f64>,
    pub cloud_cover: Option<i32>,
    pub visibility: Option<f64>,
    pub present_weather: Option<String>,
    pub past_weather: Option<String>,
    pub cloud_low_type: Option<char>,
    pub cloud_mid_type: Option<char>,
    pub cloud_high_type: Option<char>,
    pub pressure_tendency: Option<i32>,
    pub pressure_change: Option<f64>,
    pub max_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub precipitation_24h: Option<f64>,
}

/// Decode an AAXX report body.
///
/// Groups the analysis does not consume are skipped. Implausible pressure
/// and temperature values are dropped from the result, not treated as a
/// decode failure.
pub fn decode_synop(report: &str) -> Result<DecodedSynop, DecodeError> {
    let cleaned = report.trim_end_matches('=').replace('\n', " ");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "NIL" {
        return Err(DecodeError::Empty);
    }

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() < 5 || parts[0] != "AAXX" {
        return Err(DecodeError::BadFormat(preview(trimmed)));
    }

    let datetime_group = parts[1];
    let (day, hour) = match (
        digits(datetime_group.get(0..2)),
        digits(datetime_group.get(2..4)),
    ) {
        (Some(day), Some(hour)) => (day, hour),
        _ => return Err(DecodeError::BadFormat(format!("datetime group {}", datetime_group))),
    };

    let mut decoded = DecodedSynop {
        station_id: parts[2].to_string(),
        day,
        hour,
        ..DecodedSynop::default()
    };

    // section 3 starts after the 333 indicator
    let section1_end = parts.iter().position(|p| *p == "333").unwrap_or(parts.len());

    for (i, part) in parts.iter().enumerate().take(section1_end).skip(3) {
        if part.len() != 5 {
            continue;
        }

        if i == 3 {
            // iRixhVV
            decoded.visibility = float_group(part.get(3..5));
        } else if i == 4 {
            // Nddff
            decoded.cloud_cover = digits(part.get(0..1)).map(|n| n as i32);
            decoded.wind_direction = digits(part.get(1..3)).map(|d| d as i32 * 10);
            decoded.wind_speed = float_group(part.get(3..5));
        } else if let Some(rest) = part.strip_prefix('1') {
            // 1snTTT
            decoded.temperature = signed_tenths(rest);
        } else if let Some(rest) = part.strip_prefix('2') {
            // 2snTdTdTd
            decoded.dew_point = signed_tenths(rest);
        } else if part.starts_with('3') {
            // 3P0P0P0P0
            decoded.station_pressure = float_group(part.get(1..5)).map(|p| p / 10.0);
        } else if part.starts_with('4') {
            // 4PPPP; values below 500 have the leading 10 dropped
            decoded.sea_level_pressure = float_group(part.get(1..5)).map(|raw| {
                let pressure = raw / 10.0;
                if pressure < 500.0 {
                    pressure + 1000.0
                } else {
                    pressure
                }
            });
        } else if part.starts_with('7') {
            // 7wwW1W2
            decoded.present_weather = digit_string(part.get(1..3));
            decoded.past_weather = digit_string(part.get(3..5));
        } else if part.starts_with('8') {
            // 8NhCLCMCH
            decoded.cloud_low_type = digit_char(part, 2);
            decoded.cloud_mid_type = digit_char(part, 3);
            decoded.cloud_high_type = digit_char(part, 4);
        }
    }

    if section1_end < parts.len() {
        for part in &parts[section1_end + 1..] {
            if part.len() != 5 {
                continue;
            }
            if let Some(rest) = part.strip_prefix('1') {
                // 1snTxTxTx
                decoded.max_temperature = signed_tenths(rest);
            } else if let Some(rest) = part.strip_prefix('2') {
                // 2snTnTnTn
                decoded.min_temperature = signed_tenths(rest);
            } else if part.starts_with('5') {
                // 5appp
                decoded.pressure_tendency = digits(part.get(1..2)).map(|n| n as i32);
                decoded.pressure_change = float_group(part.get(2..5)).map(|v| v / 10.0);
            } else if part.starts_with('6') {
                // 6RRRtR
                decoded.precipitation = float_group(part.get(1..4)).map(|v| v / 10.0);
            } else if part.starts_with('7') {
                // 7R24R24R24R24
                decoded.precipitation_24h = float_group(part.get(1..5)).map(|v| v / 10.0);
            }
        }
    }

    // plausibility clamps
    if let Some(p) = decoded.sea_level_pressure {
        if !(800.0..=1100.0).contains(&p) {
            tracing::warn!(station = %decoded.station_id, pressure = p, "Dropping implausible pressure");
            decoded.sea_level_pressure = None;
        }
    }
    if let Some(t) = decoded.temperature {
        if !(-50.0..=50.0).contains(&t) {
            tracing::warn!(station = %decoded.station_id, temperature = t, "Dropping implausible temperature");
            decoded.temperature = None;
        }
    }

    Ok(decoded)
}

/// Value encoded as sign digit plus tenths: `snTTT`.
fn signed_tenths(rest: &str) -> Option<f64> {
    let sign = match rest.get(0..1) {
        Some("0") => 1.0,
        Some("1") => -1.0,
        _ => return None,
    };
    float_group(rest.get(1..4)).map(|v| sign * v / 10.0)
}

fn digits(slice: Option<&str>) -> Option<u32> {
    slice.and_then(|s| {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().ok()
        } else {
            None
        }
    })
}

fn float_group(slice: Option<&str>) -> Option<f64> {
    digits(slice).map(|n| n as f64)
}

fn digit_string(slice: Option<&str>) -> Option<String> {
    slice.and_then(|s| {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            Some(s.to_string())
        } else {
            None
        }
    })
}

fn digit_char(part: &str, index: usize) -> Option<char> {
    part.chars().nth(index).filter(|c| c.is_ascii_digit())
}

fn preview(report: &str) -> String {
    report.chars().take(20).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str =
        "AAXX 15121 44477 11458 61207 10172 21015 30132 40131 81541 333 10178 21073 55055=";

    #[test]
    fn test_full_report() {
        let decoded = decode_synop(REPORT).unwrap();
        assert_eq!(decoded.station_id, "44477");
        assert_eq!(decoded.day, 15);
        assert_eq!(decoded.hour, 12);
        assert_eq!(decoded.visibility, Some(58.0));
        assert_eq!(decoded.cloud_cover, Some(6));
        assert_eq!(decoded.wind_direction, Some(120));
        assert_eq!(decoded.wind_speed, Some(7.0));
        assert_eq!(decoded.temperature, Some(17.2));
        assert_eq!(decoded.dew_point, Some(-1.5));
        assert_eq!(decoded.station_pressure, Some(13.2));
        assert_eq!(decoded.sea_level_pressure, Some(1013.1));
        assert_eq!(decoded.cloud_low_type, Some('5'));
        assert_eq!(decoded.cloud_mid_type, Some('4'));
        assert_eq!(decoded.cloud_high_type, Some('1'));
        assert_eq!(decoded.max_temperature, Some(17.8));
        assert_eq!(decoded.min_temperature, Some(-7.3));
        assert_eq!(decoded.pressure_tendency, Some(5));
        assert_eq!(decoded.pressure_change, Some(5.5));
    }

    #[test]
    fn test_nil_and_empty_rejected() {
        assert!(matches!(decode_synop("NIL"), Err(DecodeError::Empty)));
        assert!(matches!(decode_synop("   "), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_wrong_header_rejected() {
        assert!(matches!(
            decode_synop("BBXX 15121 44477 11458 61207"),
            Err(DecodeError::BadFormat(_))
        ));
    }

    #[test]
    fn test_bad_datetime_rejected() {
        assert!(decode_synop("AAXX 1x121 44477 11458 61207").is_err());
    }

    #[test]
    fn test_implausible_pressure_dropped() {
        // 43500 folds to 1350 hPa, outside the plausible band
        let decoded = decode_synop("AAXX 15121 44477 11458 61207 43500=").unwrap();
        assert_eq!(decoded.sea_level_pressure, None);
    }

    #[test]
    fn test_weather_group() {
        let decoded = decode_synop("AAXX 15121 44477 11458 61207 76122=").unwrap();
        assert_eq!(decoded.present_weather.as_deref(), Some("61"));
        assert_eq!(decoded.past_weather.as_deref(), Some("22"));
    }

    #[test]
    fn test_slashed_groups_skipped() {
        let decoded = decode_synop("AAXX 15121 44477 11458 612// 1//// 40131=").unwrap();
        assert_eq!(decoded.wind_speed, None);
        assert_eq!(decoded.temperature, None);
        assert_eq!(decoded.sea_level_pressure, Some(1013.1));
    }
}
