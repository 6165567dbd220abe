/// Utility functions: unit conversion and lenient JSON decoding
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const METERS_PER_FOOT: f64 = 0.3048;
pub const MPS_PER_KNOT: f64 = 0.514444;
pub const MPS_PER_FPM: f64 = 0.00508;

/// Convert feet to meters
pub fn feet_to_meters(ft: Option<f64>) -> Option<f64> {
    ft.map(|v| v * METERS_PER_FOOT)
}

/// Convert knots to meters per second
pub fn knots_to_mps(kt: Option<f64>) -> Option<f64> {
    kt.map(|v| v * MPS_PER_KNOT)
}

/// Convert feet per minute to meters per second
pub fn fpm_to_mps(fpm: Option<f64>) -> Option<f64> {
    fpm.map(|v| v * MPS_PER_FPM)
}

/// Parse an upstream timestamp into UNIX seconds (floored)
pub fn unix_seconds(ts: &str) -> Option<i64> {
    parse_timestamp(ts).map(|dt| dt.timestamp())
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&ndt));
    }
    None
}

/// Extract number from JSON value
pub fn num(v: &Value) -> Option<f64> {
    if let Some(x) = v.as_f64() {
        return Some(x);
    }
    if let Some(s) = v.as_str() {
        return s.trim().parse::<f64>().ok().filter(|x| x.is_finite());
    }
    None
}

/// Deserialize any field, turning a value of the wrong shape into `None`
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserialize a number that may arrive as a JSON number or a numeric string
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(num(&value))
}
