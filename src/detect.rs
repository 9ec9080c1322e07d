//! Phase-detection rules
//!
//! Each rule is a pure function of the telemetry table (and config) to one
//! timestamp, or to the autoland flag. Rules are deliberately simple
//! threshold / first-match heuristics over the recorded channels, not
//! validated classifiers. The `Sortie::analyze` driver caches each result
//! and collects failures; calling a rule directly propagates its error.

use chrono::NaiveDateTime;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::query::{self, Clause, CompareOp, NoInstants, Selection};
use crate::types::channels;
use crate::types::{AutolandResult, TelemetryTable};

/// First timestamp at or above the launch ground-speed threshold.
pub fn find_launch_time(table: &TelemetryTable, config: &AnalysisConfig) -> Result<NaiveDateTime> {
    let mut selection = Selection::all(table);
    let clause = Clause::compare(channels::GPS_SPD, CompareOp::Ge, config.launch_speed_ms);
    query::apply(table, &mut selection, &[clause], &NoInstants)?;
    selection.first_timestamp(table).ok_or_else(|| {
        AnalysisError::PhaseNotFound(format!(
            "no sample with {} >= {}",
            channels::GPS_SPD,
            config.launch_speed_ms
        ))
    })
}

/// Last timestamp above the landing ground-speed threshold.
pub fn find_landing_time(table: &TelemetryTable, config: &AnalysisConfig) -> Result<NaiveDateTime> {
    let mut selection = Selection::all(table);
    let clause = Clause::compare(channels::GPS_SPD, CompareOp::Gt, config.landing_speed_ms);
    query::apply(table, &mut selection, &[clause], &NoInstants)?;
    selection.last_timestamp(table).ok_or_else(|| {
        AnalysisError::PhaseNotFound(format!(
            "no sample with {} > {}",
            channels::GPS_SPD,
            config.landing_speed_ms
        ))
    })
}

/// Rows where the targeted waypoint equals any of the land waypoints,
/// built as OR-combined equality clauses.
fn land_command_selection(table: &TelemetryTable, config: &AnalysisConfig) -> Result<Selection> {
    let land = &config.waypoints.land;
    if land.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "no land waypoints configured".to_string(),
        ));
    }
    let mut clauses = vec![Clause::compare(
        channels::CMD_CNUM,
        CompareOp::Eq,
        f64::from(land[0]),
    )];
    for &wp in &land[1..] {
        clauses.push(Clause::or(Clause::compare(
            channels::CMD_CNUM,
            CompareOp::Eq,
            f64::from(wp),
        )));
    }
    let mut selection = Selection::all(table);
    query::apply(table, &mut selection, &clauses, &NoInstants)?;
    Ok(selection)
}

/// First time a landing waypoint was commanded.
pub fn find_land_cmd_time(table: &TelemetryTable, config: &AnalysisConfig) -> Result<NaiveDateTime> {
    land_command_selection(table, config)?
        .first_timestamp(table)
        .ok_or_else(|| AnalysisError::PhaseNotFound("no land command was issued".to_string()))
}

/// Last time a landing waypoint was commanded.
pub fn find_last_land_cmd_time(
    table: &TelemetryTable,
    config: &AnalysisConfig,
) -> Result<NaiveDateTime> {
    land_command_selection(table, config)?
        .last_timestamp(table)
        .ok_or_else(|| AnalysisError::PhaseNotFound("no land command was issued".to_string()))
}

fn last_waypoint_match(
    table: &TelemetryTable,
    waypoint: u32,
    what: &str,
) -> Result<NaiveDateTime> {
    let column = table.column(channels::CMD_CNUM)?;
    let row = column
        .iter()
        .rposition(|v| *v == Some(f64::from(waypoint)))
        .ok_or_else(|| {
            AnalysisError::PhaseNotFound(format!("{} waypoint {} never targeted", what, waypoint))
        })?;
    Ok(table.timestamp(row))
}

/// Handoff: last sample targeting the pre-handoff waypoint.
pub fn find_handoff_time(table: &TelemetryTable, config: &AnalysisConfig) -> Result<NaiveDateTime> {
    last_waypoint_match(table, config.waypoints.pre_handoff, "pre-handoff")
}

/// Climbout complete: last sample targeting the pre-climbout waypoint.
pub fn find_climbout_time(table: &TelemetryTable, config: &AnalysisConfig) -> Result<NaiveDateTime> {
    last_waypoint_match(table, config.waypoints.pre_climbout, "pre-climbout")
}

/// Egress: scan the egress waypoints in declared order; the first id with
/// any match wins and its earliest sample is the egress time. Declared order
/// decides, not the globally earliest timestamp.
pub fn find_egress_time(table: &TelemetryTable, config: &AnalysisConfig) -> Result<NaiveDateTime> {
    let column = table.column(channels::CMD_CNUM)?;
    for &wp in &config.waypoints.egress {
        if let Some(row) = column.iter().position(|v| *v == Some(f64::from(wp))) {
            return Ok(table.timestamp(row));
        }
    }
    Err(AnalysisError::PhaseNotFound(
        "no egress waypoint was ever targeted".to_string(),
    ))
}

/// Landbreak: first message carrying the LAND command id.
pub fn find_landbreak_time(table: &TelemetryTable, config: &AnalysisConfig) -> Result<NaiveDateTime> {
    let column = table.column(channels::CMD_CID)?;
    let row = column
        .iter()
        .position(|v| *v == Some(config.land_command_id))
        .ok_or_else(|| {
            AnalysisError::PhaseNotFound(format!(
                "no message with {} == {}",
                channels::CMD_CID,
                config.land_command_id
            ))
        })?;
    Ok(table.timestamp(row))
}

/// Linear interpolation over gaps, matching the reference tooling: values
/// between known neighbors are interpolated, a trailing gap holds the last
/// known value, a leading gap stays missing.
pub fn interpolate(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let mut last_known: Option<(usize, f64)> = None;
    for i in 0..out.len() {
        match out[i] {
            Some(v) => {
                if let Some((j, prev)) = last_known {
                    if i > j + 1 {
                        let span = (i - j) as f64;
                        for (step, slot) in out[j + 1..i].iter_mut().enumerate() {
                            let frac = (step + 1) as f64 / span;
                            *slot = Some(prev + (v - prev) * frac);
                        }
                    }
                }
                last_known = Some((i, v));
            }
            None => {}
        }
    }
    if let Some((j, v)) = last_known {
        for slot in out[j + 1..].iter_mut() {
            *slot = Some(v);
        }
    }
    out
}

/// Autonomous-landing determination.
///
/// True only when the mode channel stayed in auto across the inclusive span
/// from the land command to touchdown (gaps interpolated) and every waypoint
/// of one declared landing site's sequence appears in the observed waypoint
/// numbers. Sites are checked in declared order; the first complete one
/// names the landing direction.
pub fn check_autoland(
    table: &TelemetryTable,
    config: &AnalysisConfig,
    land_cmd_time: NaiveDateTime,
    landing_time: NaiveDateTime,
) -> Result<AutolandResult> {
    let modes = table.column(channels::MODE_MODE)?;
    if !modes.iter().any(|v| *v == Some(config.auto_mode)) {
        return Ok(AutolandResult {
            autoland: false,
            site: None,
        });
    }

    let span = table.rows_between(land_cmd_time, landing_time);
    let span_modes: Vec<Option<f64>> = span.iter().map(|&r| modes[r]).collect();
    let filled = interpolate(&span_modes);
    let is_auto = !filled.is_empty() && filled.iter().all(|v| *v == Some(config.auto_mode));

    let observed = table.column(channels::CMD_CNUM)?;
    let seen = |wp: u32| observed.iter().any(|v| *v == Some(f64::from(wp)));
    for site in &config.waypoints.auto_landing_sequence {
        if !site.waypoints.is_empty() && site.waypoints.iter().all(|&wp| seen(wp)) {
            return Ok(AutolandResult {
                autoland: is_auto,
                site: Some(site.name.clone()),
            });
        }
    }

    Ok(AutolandResult {
        autoland: false,
        site: None,
    })
}
