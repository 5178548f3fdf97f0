//! Completeness check for a parsed conditions record.
//!
//! A record is worth publishing when at least three of the four headline
//! fields (max wave height, significant wave height, wind speed, wind
//! direction) are present, at least one wave height is among them, and wind
//! speed is among them. Direction alone never stands in for speed.

use crate::model::ConditionsRecord;

/// Minimum number of headline fields that must be present.
pub const QUORUM: usize = 3;

/// Returns `true` if the record passes the quorum rule.
pub fn is_complete(record: &ConditionsRecord) -> bool {
    let headline = [
        record.max_wave_height.is_some(),
        record.sig_wave_height.is_some(),
        record.wind_speed.is_some(),
        record.wind_direction.is_some(),
    ];
    let present = headline.iter().filter(|&&p| p).count();
    let has_wave = record.max_wave_height.is_some() || record.sig_wave_height.is_some();
    let has_wind = record.wind_speed.is_some();

    present >= QUORUM && has_wave && has_wind
}

/// Names of every condition field that is still unset, in schema order.
pub fn missing_fields(record: &ConditionsRecord) -> Vec<&'static str> {
    let fields = [
        ("max_wave_height", record.max_wave_height.is_none()),
        ("sig_wave_height", record.sig_wave_height.is_none()),
        ("wave_period", record.wave_period.is_none()),
        ("tide", record.tide.is_none()),
        ("wind_speed", record.wind_speed.is_none()),
        ("wind_gust", record.wind_gust.is_none()),
        ("wind_direction", record.wind_direction.is_none()),
        ("water_temp", record.water_temp.is_none()),
        ("air_temp", record.air_temp.is_none()),
    ];
    fields
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| *name)
        .collect()
}
