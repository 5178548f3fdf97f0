//! Conditions parsing: selected OCR lines → [`ConditionsRecord`].
//!
//! Each line is classified by the first matching label rule (checked
//! case-insensitively, in a fixed precedence order) and its value is pulled
//! out with a unit-anchored pattern. A line whose label matches but whose
//! value does not leaves the field untouched; later lines for the same
//! field overwrite earlier ones.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::ConditionsRecord;

static METRES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9.]+)\s*m").expect("metres pattern"));
static SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9.]+)\s*s").expect("seconds pattern"));
static KNOTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9.]+)\s*knots?").expect("knots pattern"));
static COMPASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([NSEW]{1,3})\b").expect("compass pattern"));
static CELSIUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9.]+)\s*°?c").expect("celsius pattern"));

/// Which record field a line feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    MaxWaveHeight,
    SigWaveHeight,
    WavePeriod,
    WindSpeed,
    WindGust,
    WindDirection,
    WaterTemp,
    AirTemp,
}

/// Label rule for a line, in precedence order. `lower` must already be
/// lowercased.
pub fn classify(lower: &str) -> Option<Field> {
    if lower.contains("max wave height") {
        Some(Field::MaxWaveHeight)
    } else if lower.contains("sig") && lower.contains("wave height") {
        Some(Field::SigWaveHeight)
    } else if lower.contains("period") {
        Some(Field::WavePeriod)
    } else if lower.contains("wind") && !lower.contains("gust") {
        Some(Field::WindSpeed)
    } else if lower.contains("gust") {
        Some(Field::WindGust)
    } else if lower.contains("direction") {
        Some(Field::WindDirection)
    } else if lower.contains("water temp") {
        Some(Field::WaterTemp)
    } else if lower.contains("air temp") {
        Some(Field::AirTemp)
    } else {
        None
    }
}

/// First number directly followed by the pattern's unit.
fn number(pattern: &Regex, line: &str) -> Option<f64> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn compass(line: &str) -> Option<String> {
    COMPASS
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Parse selected lines into a record. Unrecognised lines are ignored, so
/// this never fails.
pub fn parse<S: AsRef<str>>(conditions: &[S]) -> ConditionsRecord {
    let mut record = ConditionsRecord::default();

    for raw in conditions {
        let line = raw.as_ref().trim();
        let Some(field) = classify(&line.to_lowercase()) else {
            continue;
        };

        match field {
            Field::MaxWaveHeight => set(&mut record.max_wave_height, number(&METRES, line)),
            Field::SigWaveHeight => set(&mut record.sig_wave_height, number(&METRES, line)),
            Field::WavePeriod => set(&mut record.wave_period, number(&SECONDS, line)),
            Field::WindSpeed => set(&mut record.wind_speed, number(&KNOTS, line)),
            Field::WindGust => set(&mut record.wind_gust, number(&KNOTS, line)),
            Field::WindDirection => set(&mut record.wind_direction, compass(line)),
            Field::WaterTemp => set(&mut record.water_temp, number(&CELSIUS, line)),
            Field::AirTemp => set(&mut record.air_temp, number(&CELSIUS, line)),
        }
    }

    record
}

fn set<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
