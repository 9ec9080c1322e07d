//! Time-basis and geodesy conversions
//!
//! Contains the GPS week/time-of-week to wall-clock conversion applied while
//! loading flight data CSVs, plus the great-circle distance used by the
//! derived-metric calculations.

use chrono::{DateTime, Duration, NaiveDateTime};

/// Seconds from the Unix epoch (1970-01-01) to the GPS epoch (1980-01-06)
pub const GPS_EPOCH_OFFSET_S: i64 = 86_400 * (10 * 365 + (1980 - 1969) / 4 + 1 + 6 - 2);

/// GPS-to-UTC leap second correction applied by the autopilot logs
pub const GPS_UTC_LEAP_S: f64 = 15.0;

/// Fixed local-time offset applied to all log timestamps (field site is UTC-7)
pub const LOCAL_OFFSET_HOURS: i64 = -7;

/// Mean earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Convert GPS time (time-of-week in seconds plus week number) to a local
/// wall-clock timestamp.
///
/// Returns `None` for inputs outside the representable timestamp range.
pub fn gps_to_timestamp(time_of_week_s: f64, week: u32) -> Option<NaiveDateTime> {
    let unix_s =
        GPS_EPOCH_OFFSET_S as f64 + 86_400.0 * 7.0 * f64::from(week) + time_of_week_s - GPS_UTC_LEAP_S;
    if !unix_s.is_finite() || unix_s < 0.0 {
        return None;
    }
    let secs = unix_s.floor() as i64;
    let nanos = ((unix_s - unix_s.floor()) * 1e9).round() as u32;
    let utc = DateTime::from_timestamp(secs, nanos.min(999_999_999))?.naive_utc();
    Some(utc + Duration::hours(LOCAL_OFFSET_HOURS))
}

/// Great-circle distance in meters between two points given in decimal degrees
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1, lng1, lat2, lng2) = (
        lat1.to_radians(),
        lng1.to_radians(),
        lat2.to_radians(),
        lng2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin() * EARTH_RADIUS_M
}
