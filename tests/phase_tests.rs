//! Integration tests for the phase-detection rules and their caching.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sortie_analyzer::{AnalysisConfig, AnalysisError, Phase, Sortie, TelemetryTable};

fn ts(secs: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 7, 12)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
        + Duration::seconds(secs)
}

/// 100 samples at 1 Hz. Ground speed ramps 0 to 10 m/s over the first
/// 20 s, holds 10 m/s, and ramps back down to 0 over the last 20 s.
fn ramp_table() -> TelemetryTable {
    let mut table = TelemetryTable::new(vec!["GPS_Spd".to_string()]);
    for t in 0..100i64 {
        let spd = if t <= 20 {
            t as f64 / 2.0
        } else if t < 80 {
            10.0
        } else {
            (100 - t) as f64 / 2.0
        };
        table.push_row(ts(t), vec![Some(spd)]).unwrap();
    }
    table
}

fn ramp_sortie() -> Sortie {
    Sortie::from_table(ramp_table(), AnalysisConfig::default())
}

/// Table with one waypoint-number sample per second.
fn waypoint_sortie(cnums: &[Option<f64>]) -> Sortie {
    let mut table = TelemetryTable::new(vec!["CMD_CNum".to_string()]);
    for (i, cnum) in cnums.iter().enumerate() {
        table.push_row(ts(i as i64), vec![*cnum]).unwrap();
    }
    Sortie::from_table(table, AnalysisConfig::default())
}

#[test]
fn test_launch_is_first_threshold_crossing() {
    // t/2 >= 5 first at t = 10
    let mut sortie = ramp_sortie();
    assert_eq!(sortie.launch_time().unwrap(), ts(10));
}

#[test]
fn test_landing_is_last_sample_above_threshold() {
    // (100 - t)/2 > 3 last at t = 93
    let mut sortie = ramp_sortie();
    assert_eq!(sortie.landing_time().unwrap(), ts(93));
}

#[test]
fn test_flight_duration() {
    let mut sortie = ramp_sortie();
    assert_eq!(sortie.flight_duration().unwrap(), Duration::seconds(83));
}

#[test]
fn test_launch_not_found_when_never_fast_enough() {
    let mut table = TelemetryTable::new(vec!["GPS_Spd".to_string()]);
    for t in 0..10i64 {
        table.push_row(ts(t), vec![Some(2.0)]).unwrap();
    }
    let mut sortie = Sortie::from_table(table, AnalysisConfig::default());
    assert!(matches!(
        sortie.launch_time(),
        Err(AnalysisError::PhaseNotFound(_))
    ));
}

#[test]
fn test_land_command_first_and_last() {
    let cnums: Vec<Option<f64>> = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 17.0, 17.0, 21.0]
        .iter()
        .map(|v| Some(*v))
        .collect();
    let mut sortie = waypoint_sortie(&cnums);
    sortie.config.waypoints.land = vec![17, 21];

    assert_eq!(sortie.land_cmd_time().unwrap(), ts(6));
    assert_eq!(sortie.last_land_cmd_time().unwrap(), ts(8));
}

#[test]
fn test_climbout_and_handoff_take_last_waypoint_match() {
    // pre-climbout waypoint 2 last targeted at t=3, pre-handoff 3 at t=4
    let cnums: Vec<Option<f64>> = [2.0, 3.0, 2.0, 2.0, 3.0, 17.0]
        .iter()
        .map(|v| Some(*v))
        .collect();
    let mut sortie = waypoint_sortie(&cnums);

    assert_eq!(sortie.climbout_time().unwrap(), ts(3));
    assert_eq!(sortie.handoff_time().unwrap(), ts(4));
}

#[test]
fn test_egress_checks_waypoints_in_declared_order() {
    // Waypoint 19 appears earlier in time, but 15 is declared first and
    // matches, so its earliest sample wins.
    let cnums = vec![Some(2.0), Some(19.0), Some(3.0), None, Some(15.0), Some(15.0)];
    let mut sortie = waypoint_sortie(&cnums);
    assert_eq!(sortie.config.waypoints.egress, vec![15, 19]);
    assert_eq!(sortie.egress_time().unwrap(), ts(4));
}

#[test]
fn test_egress_falls_back_to_later_declared_waypoint() {
    let cnums = vec![Some(2.0), Some(19.0), Some(3.0)];
    let mut sortie = waypoint_sortie(&cnums);
    assert_eq!(sortie.egress_time().unwrap(), ts(1));
}

#[test]
fn test_landbreak_is_first_land_command_id() {
    let mut table = TelemetryTable::new(vec!["CMD_CId".to_string()]);
    let cids = [Some(17.0), None, Some(21.0), Some(21.0)];
    for (i, cid) in cids.iter().enumerate() {
        table.push_row(ts(i as i64), vec![*cid]).unwrap();
    }
    let mut sortie = Sortie::from_table(table, AnalysisConfig::default());
    assert_eq!(sortie.landbreak_time().unwrap(), ts(2));
}

#[test]
fn test_phase_results_are_cached() {
    let mut sortie = ramp_sortie();
    let first = sortie.launch_time().unwrap();
    assert!(sortie.phases().is_cached(Phase::Launch));

    // A config change after the fact must not affect the cached result.
    sortie.config.launch_speed_ms = 9.0;
    assert_eq!(sortie.launch_time().unwrap(), first);
}

#[test]
fn test_invalidate_forces_recompute() {
    let mut sortie = ramp_sortie();
    assert_eq!(sortie.launch_time().unwrap(), ts(10));

    sortie.config.launch_speed_ms = 9.0;
    sortie.invalidate_phase(Phase::Launch);
    // t/2 >= 9 first at t = 18
    assert_eq!(sortie.launch_time().unwrap(), ts(18));
}

#[test]
fn test_analyze_force_recomputes_everything() {
    let mut sortie = ramp_sortie();
    assert_eq!(sortie.launch_time().unwrap(), ts(10));

    sortie.config.launch_speed_ms = 9.0;
    sortie.analyze(true);
    assert_eq!(sortie.phase_time(Phase::Launch), Some(ts(18)));
}

/// Full-channel table for the autoland checks: the aircraft flies waypoints
/// 13/15/17 (site A), gets the land command at t=6 and touches down at t=9.
fn autoland_sortie(modes: &[Option<f64>]) -> Sortie {
    assert_eq!(modes.len(), 12);
    let mut table = TelemetryTable::new(vec![
        "GPS_Spd".to_string(),
        "CMD_CNum".to_string(),
        "MODE_Mode".to_string(),
    ]);
    let speeds = [0.0, 8.0, 8.0, 8.0, 8.0, 8.0, 8.0, 8.0, 8.0, 8.0, 2.0, 1.0];
    let cnums = [
        None,
        None,
        Some(13.0),
        None,
        Some(15.0),
        None,
        Some(17.0),
        None,
        None,
        None,
        None,
        None,
    ];
    for i in 0..12usize {
        table
            .push_row(ts(i as i64), vec![Some(speeds[i]), cnums[i], modes[i]])
            .unwrap();
    }
    Sortie::from_table(table, AnalysisConfig::default())
}

#[test]
fn test_autoland_detected_with_interpolated_gap() {
    // Auto mode (10) held across land command (t=6) to landing (t=9); the
    // missing sample at t=7 interpolates between auto neighbors.
    let modes = [
        Some(0.0),
        Some(0.0),
        Some(10.0),
        Some(10.0),
        Some(10.0),
        Some(10.0),
        Some(10.0),
        None,
        Some(10.0),
        Some(10.0),
        Some(10.0),
        Some(10.0),
    ];
    let mut sortie = autoland_sortie(&modes);
    let result = sortie.check_autoland().unwrap();
    assert!(result.autoland);
    assert_eq!(result.site.as_deref(), Some("A"));
}

#[test]
fn test_autoland_rejected_when_mode_leaves_auto() {
    // Pilot takes over at t=8: the site sequence completed, but the
    // landing was not autonomous.
    let modes = [
        Some(0.0),
        Some(0.0),
        Some(10.0),
        Some(10.0),
        Some(10.0),
        Some(10.0),
        Some(10.0),
        Some(10.0),
        Some(0.0),
        Some(0.0),
        Some(0.0),
        Some(0.0),
    ];
    let mut sortie = autoland_sortie(&modes);
    let result = sortie.check_autoland().unwrap();
    assert!(!result.autoland);
    assert_eq!(result.site.as_deref(), Some("A"));
}

#[test]
fn test_autoland_rejected_without_any_auto_mode() {
    let modes = [Some(0.0); 12];
    let mut sortie = autoland_sortie(&modes);
    let result = sortie.check_autoland().unwrap();
    assert!(!result.autoland);
    assert!(result.site.is_none());
}

#[test]
fn test_analyze_collects_failures_without_aborting() {
    // Speed-only table: launch/landing/duration succeed, everything that
    // needs waypoint or position channels fails.
    let mut sortie = ramp_sortie();
    sortie.analyze(false);

    assert!(sortie.phase_time(Phase::Launch).is_some());
    assert!(sortie.phase_time(Phase::Landing).is_some());
    assert!(sortie.phase_time(Phase::LandCommand).is_none());
    assert!(!sortie.failures().is_empty());
    assert!(sortie
        .failures()
        .iter()
        .any(|f| f.rule == "find_land_cmd_time"));

    let record = sortie.summary_record();
    assert!(record.launch_time.is_some());
    assert_eq!(record.duration_s, Some(83.0));
    assert!(record.land_cmd_time.is_none());
}
