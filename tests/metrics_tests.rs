//! Integration tests for the derived-metric calculations.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sortie_analyzer::metrics::{climbout_data, landing_overshoot};
use sortie_analyzer::{AnalysisConfig, AnalysisError, TelemetryTable};

fn ts(secs: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 7, 12)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
        + Duration::seconds(secs)
}

// One degree of latitude in meters for the haversine radius used here.
const METERS_PER_DEG: f64 = 111_194.9;

fn position_table(rows: &[(f64, Option<f64>, f64, f64, f64)]) -> TelemetryTable {
    // (GPS_Spd, CMD_CNum, GPS_Lat, GPS_Lng, GPS_Alt) plus MODE_Mode below
    let mut table = TelemetryTable::new(vec![
        "GPS_Spd".to_string(),
        "CMD_CNum".to_string(),
        "GPS_Lat".to_string(),
        "GPS_Lng".to_string(),
        "GPS_Alt".to_string(),
        "MODE_Mode".to_string(),
    ]);
    for (i, &(spd, cnum, lat, lng, alt)) in rows.iter().enumerate() {
        let mode = if i == 0 { Some(0.0) } else { Some(10.0) };
        table
            .push_row(
                ts(i as i64),
                vec![Some(spd), cnum, Some(lat), Some(lng), Some(alt), mode],
            )
            .unwrap();
    }
    table
}

#[test]
fn test_climbout_distance_and_altitude_gain() {
    // First auto-mode sample at t=1 (on the rail), pre-climbout waypoint 2
    // last targeted at t=3.
    let table = position_table(&[
        (0.0, None, 35.000, -120.0, 200.0),
        (0.0, None, 35.000, -120.0, 210.0),
        (8.0, Some(2.0), 35.001, -120.0, 300.0),
        (9.0, Some(2.0), 35.002, -120.0, 350.0),
        (9.0, Some(3.0), 35.003, -120.0, 400.0),
    ]);
    let config = AnalysisConfig::default();

    let (distance, dalt) = climbout_data(&table, &config, ts(3)).unwrap();
    let expected = 0.002 * METERS_PER_DEG;
    assert!((distance - expected).abs() < 1.0, "distance = {}", distance);
    assert!((dalt - 140.0).abs() < 1e-9);
}

#[test]
fn test_climbout_requires_auto_mode() {
    let mut table = TelemetryTable::new(vec![
        "GPS_Lat".to_string(),
        "GPS_Lng".to_string(),
        "GPS_Alt".to_string(),
        "MODE_Mode".to_string(),
    ]);
    for i in 0..5i64 {
        table
            .push_row(
                ts(i),
                vec![Some(35.0), Some(-120.0), Some(200.0), Some(0.0)],
            )
            .unwrap();
    }
    let config = AnalysisConfig::default();
    assert!(matches!(
        climbout_data(&table, &config, ts(4)),
        Err(AnalysisError::InsufficientData(_))
    ));
}

fn approach_table(positions: &[(f64, f64)]) -> TelemetryTable {
    let mut table = TelemetryTable::new(vec![
        "GPS_Spd".to_string(),
        "GPS_Lat".to_string(),
        "GPS_Lng".to_string(),
    ]);
    for (i, &(lat, lng)) in positions.iter().enumerate() {
        table
            .push_row(ts(i as i64), vec![Some(8.0), Some(lat), Some(lng)])
            .unwrap();
    }
    table
}

#[test]
fn test_overshoot_straight_north_approach() {
    // Track due north, target straight ahead: the whole miss distance is
    // along-track, nothing across.
    let positions: Vec<(f64, f64)> = (0..10)
        .map(|i| (35.0 + 0.0005 * i as f64, -120.0))
        .collect();
    let table = approach_table(&positions);

    let mut config = AnalysisConfig::default();
    config.target_landing_lat = 35.01;
    config.target_landing_lng = -120.0;

    let overshoot = landing_overshoot(&table, &config).unwrap();
    let expected = (35.01 - 35.0045) * METERS_PER_DEG;
    assert!(
        (overshoot.along_m - expected).abs() < expected * 0.01,
        "along = {}",
        overshoot.along_m
    );
    assert!(overshoot.cross_m.abs() < 0.5, "cross = {}", overshoot.cross_m);
}

#[test]
fn test_overshoot_east_west_approach() {
    // Track due east: the lng-on-lat fit is degenerate, the swapped-axis
    // fit must still recover the heading.
    let positions: Vec<(f64, f64)> = (0..10)
        .map(|i| (35.0, -120.0 + 0.0005 * i as f64))
        .collect();
    let table = approach_table(&positions);

    let mut config = AnalysisConfig::default();
    config.target_landing_lat = 35.0;
    config.target_landing_lng = -119.99;

    let overshoot = landing_overshoot(&table, &config).unwrap();
    assert!(overshoot.along_m > 0.0);
    assert!(
        overshoot.cross_m.abs() < overshoot.along_m * 0.01,
        "cross = {}",
        overshoot.cross_m
    );
}

#[test]
fn test_overshoot_fits_only_the_final_window() {
    // A long eastbound leg followed by five samples due north; with a
    // five-sample window only the northbound leg shapes the heading.
    let mut positions: Vec<(f64, f64)> = (0..20)
        .map(|i| (35.0, -120.01 + 0.0005 * i as f64))
        .collect();
    let turn_lng = positions.last().unwrap().1;
    positions.extend((1..=5).map(|i| (35.0 + 0.0005 * i as f64, turn_lng)));
    let table = approach_table(&positions);

    let mut config = AnalysisConfig::default();
    config.overshoot_window = 5;
    config.target_landing_lat = 35.01;
    config.target_landing_lng = turn_lng;

    let overshoot = landing_overshoot(&table, &config).unwrap();
    assert!(overshoot.along_m > 0.0);
    assert!(
        overshoot.cross_m.abs() < overshoot.along_m * 0.01,
        "cross = {}",
        overshoot.cross_m
    );
}

#[test]
fn test_overshoot_needs_two_fast_samples() {
    let mut table = TelemetryTable::new(vec![
        "GPS_Spd".to_string(),
        "GPS_Lat".to_string(),
        "GPS_Lng".to_string(),
    ]);
    table
        .push_row(ts(0), vec![Some(8.0), Some(35.0), Some(-120.0)])
        .unwrap();
    table
        .push_row(ts(1), vec![Some(1.0), Some(35.0), Some(-120.0)])
        .unwrap();

    let config = AnalysisConfig::default();
    assert!(matches!(
        landing_overshoot(&table, &config),
        Err(AnalysisError::InsufficientData(_))
    ));
}
