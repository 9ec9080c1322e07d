//! Derived-metric calculations
//!
//! Combines phase-detection outputs with positional channels to produce the
//! per-sortie summary metrics: climbout distance and altitude gain, and the
//! landing overshoot decomposed along and across the final approach heading.

use chrono::NaiveDateTime;

use crate::config::AnalysisConfig;
use crate::conversion::haversine_m;
use crate::error::{AnalysisError, Result};
use crate::types::channels;
use crate::types::TelemetryTable;

/// Landing offset from the target point, split into the component along the
/// final approach direction and the component perpendicular to it. Meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overshoot {
    pub along_m: f64,
    pub cross_m: f64,
}

/// Climbout distance and altitude gain.
///
/// Distance is the great-circle distance from the position at the first
/// auto-mode sample (the aircraft on the launch rail) to the position at the
/// climbout phase event; the altitude delta is the matching GPS altitude
/// difference.
pub fn climbout_data(
    table: &TelemetryTable,
    config: &AnalysisConfig,
    climbout_time: NaiveDateTime,
) -> Result<(f64, f64)> {
    let modes = table.column(channels::MODE_MODE)?;
    let on_rails = modes
        .iter()
        .position(|v| *v == Some(config.auto_mode))
        .ok_or_else(|| {
            AnalysisError::InsufficientData("auto mode was never entered".to_string())
        })?;

    let end_row = table.row_at_or_before(climbout_time).ok_or_else(|| {
        AnalysisError::InsufficientData("climbout time precedes the log".to_string())
    })?;

    let position = |row: usize, what: &str| -> Result<(f64, f64, f64)> {
        let lat = table.value(row, channels::GPS_LAT)?;
        let lng = table.value(row, channels::GPS_LNG)?;
        let alt = table.value(row, channels::GPS_ALT)?;
        match (lat, lng, alt) {
            (Some(lat), Some(lng), Some(alt)) => Ok((lat, lng, alt)),
            _ => Err(AnalysisError::InsufficientData(format!(
                "missing GPS position at {}",
                what
            ))),
        }
    };

    let (launch_lat, launch_lng, launch_alt) = position(on_rails, "launch")?;
    let (climb_lat, climb_lng, climb_alt) = position(end_row, "climbout")?;

    let distance = haversine_m(launch_lat, launch_lng, climb_lat, climb_lng);
    Ok((distance, climb_alt - launch_alt))
}

/// Landing overshoot relative to the configured target landing point.
///
/// The final approach heading comes from a least-squares line through the
/// last `overshoot_window` above-threshold-speed positions, fitting
/// longitude against latitude. When the track runs east-west the fit is
/// degenerate, so the regression axes are swapped instead of dividing by a
/// vanishing latitude variance. The fitted line is undirected, so the signs
/// of the two components share the reference tooling's heading ambiguity.
pub fn landing_overshoot(table: &TelemetryTable, config: &AnalysisConfig) -> Result<Overshoot> {
    let speeds = table.column(channels::GPS_SPD)?;
    let lats = table.column(channels::GPS_LAT)?;
    let lngs = table.column(channels::GPS_LNG)?;

    let mut track: Vec<(f64, f64)> = Vec::new();
    for row in 0..table.len() {
        if let (Some(spd), Some(lat), Some(lng)) = (speeds[row], lats[row], lngs[row]) {
            if spd > config.landing_speed_ms {
                track.push((lat, lng));
            }
        }
    }
    if track.len() > config.overshoot_window {
        track.drain(..track.len() - config.overshoot_window);
    }
    if track.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "only {} end-of-flight samples, need at least 2",
            track.len()
        )));
    }

    let (land_lat, land_lng) = *track.last().expect("track has samples");

    let n = track.len() as f64;
    let mean_lat = track.iter().map(|(lat, _)| lat).sum::<f64>() / n;
    let mean_lng = track.iter().map(|(_, lng)| lng).sum::<f64>() / n;
    let var_lat: f64 = track.iter().map(|(lat, _)| (lat - mean_lat).powi(2)).sum();
    let var_lng: f64 = track.iter().map(|(_, lng)| (lng - mean_lng).powi(2)).sum();
    let cov: f64 = track
        .iter()
        .map(|(lat, lng)| (lat - mean_lat) * (lng - mean_lng))
        .sum();

    // Heading measured from north. Fit against whichever axis carries more
    // spread so an east-west track does not divide by a vanishing latitude
    // variance; a stationary track gets a zero heading.
    let heading = if var_lat == 0.0 && var_lng == 0.0 {
        0.0
    } else if var_lat >= var_lng {
        (cov / var_lat).atan()
    } else {
        std::f64::consts::FRAC_PI_2 - (cov / var_lng).atan()
    };
    let bearing = (config.target_landing_lng - land_lng).atan2(config.target_landing_lat - land_lat);
    let theta = heading - bearing;

    let distance = haversine_m(
        land_lat,
        land_lng,
        config.target_landing_lat,
        config.target_landing_lng,
    );

    Ok(Overshoot {
        along_m: distance * theta.cos(),
        cross_m: distance * theta.sin(),
    })
}
