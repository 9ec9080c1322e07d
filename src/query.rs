//! Query engine for telemetry selections
//!
//! Filter clauses are a small typed expression tree interpreted directly
//! against the telemetry table; no string-built expressions are ever
//! evaluated. A sequence of clauses narrows the current `Selection`
//! (logical AND); an `or`-wrapped clause is evaluated against the full
//! table and unioned with the current selection instead. `reset` restores
//! the selection to the whole table.
//!
//! Clauses can also be parsed from the compact text forms accepted by the
//! original field tooling, e.g. `"GPS_Spd >= 5"` or
//! `["index", "launch_time", "landing_time"]`.

use chrono::NaiveDateTime;

use crate::error::{AnalysisError, Result};
use crate::types::{Phase, TelemetryTable};

/// Comparison operator of a filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl CompareOp {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            "==" => Some(CompareOp::Eq),
            _ => None,
        }
    }

    pub fn eval(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => lhs == rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
        }
    }
}

/// A named instant-valued sortie attribute usable in an index-range clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instant {
    Phase(Phase),
    LogStart,
    LogEnd,
}

impl Instant {
    pub fn parse(name: &str) -> Result<Self> {
        let instant = match name {
            "launch_time" => Instant::Phase(Phase::Launch),
            "landing_time" => Instant::Phase(Phase::Landing),
            "land_cmd_time" => Instant::Phase(Phase::LandCommand),
            "last_land_cmd_time" => Instant::Phase(Phase::LastLandCommand),
            "handoff_time" => Instant::Phase(Phase::Handoff),
            "climbout_time" => Instant::Phase(Phase::Climbout),
            "egress_time" => Instant::Phase(Phase::Egress),
            "landbreak_time" => Instant::Phase(Phase::Landbreak),
            "log_start_time" => Instant::LogStart,
            "log_end_time" => Instant::LogEnd,
            other => {
                return Err(AnalysisError::Query(format!(
                    "unknown instant attribute '{}'",
                    other
                )))
            }
        };
        Ok(instant)
    }
}

/// One filter clause
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Restore the selection to the full table
    Reset,
    /// `<channel> <op> <number>` comparison
    Compare {
        channel: String,
        op: CompareOp,
        value: f64,
    },
    /// Rows where the channel is present and non-zero
    Truthy { channel: String },
    /// Rows between two named instants, inclusive on both ends
    Between { start: Instant, end: Instant },
    /// Union the inner clause's matches (over the full table) with the
    /// current selection instead of narrowing it
    Or(Box<Clause>),
}

impl Clause {
    pub fn compare(channel: &str, op: CompareOp, value: f64) -> Self {
        Clause::Compare {
            channel: channel.to_string(),
            op,
            value,
        }
    }

    pub fn or(inner: Clause) -> Self {
        Clause::Or(Box::new(inner))
    }

    /// Parse a clause supplied as one to three strings, matching the text
    /// query forms of the field tooling.
    pub fn parse(parts: &[&str]) -> Result<Self> {
        match parts {
            [] => Err(AnalysisError::Query("empty clause".to_string())),
            ["reset"] => Ok(Clause::Reset),
            ["or", rest @ ..] => {
                let inner = Clause::parse(rest)?;
                match inner {
                    Clause::Compare { .. } | Clause::Truthy { .. } => Ok(Clause::or(inner)),
                    other => Err(AnalysisError::Query(format!(
                        "'or' is not supported for clause {:?}",
                        other
                    ))),
                }
            }
            ["index", start, end] => Ok(Clause::Between {
                start: Instant::parse(start)?,
                end: Instant::parse(end)?,
            }),
            [single] => Self::parse_combined(single),
            [channel, op, value] => {
                let op = CompareOp::parse(op).ok_or_else(|| {
                    AnalysisError::Query(format!("unknown operator '{}'", op))
                })?;
                let value: f64 = value.parse().map_err(|_| {
                    AnalysisError::Query(format!("invalid threshold '{}'", value))
                })?;
                Ok(Clause::compare(channel, op, value))
            }
            other => Err(AnalysisError::Query(format!(
                "clause must have 1 or 3 parts, got {}",
                other.len()
            ))),
        }
    }

    /// Parse the combined one-string form: `"GPS_Spd >= 5"`, an
    /// `or`-prefixed variant, or a bare boolean channel name.
    fn parse_combined(text: &str) -> Result<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            ["or", ..] | [_, _, _] => Self::parse(&tokens),
            [channel] => Ok(Clause::Truthy {
                channel: (*channel).to_string(),
            }),
            other => Err(AnalysisError::Query(format!(
                "combined clause must be 'channel op number', got {} tokens",
                other.len()
            ))),
        }
    }
}

/// Resolves named instants (phase timestamps, log bounds) for index-range
/// clauses. Implemented by the sortie over its phase cache.
pub trait InstantResolver {
    fn resolve(&self, instant: Instant) -> Option<NaiveDateTime>;
}

/// Resolver for contexts with no phase results available
pub struct NoInstants;

impl InstantResolver for NoInstants {
    fn resolve(&self, _instant: Instant) -> Option<NaiveDateTime> {
        None
    }
}

/// The current working subset of a telemetry table: an ordered list of row
/// indices, always a subsequence of the full table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    rows: Vec<usize>,
}

impl Selection {
    /// Selection covering every row of the table
    pub fn all(table: &TelemetryTable) -> Self {
        Self {
            rows: (0..table.len()).collect(),
        }
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_timestamp(&self, table: &TelemetryTable) -> Option<NaiveDateTime> {
        self.rows.first().map(|&r| table.timestamp(r))
    }

    pub fn last_timestamp(&self, table: &TelemetryTable) -> Option<NaiveDateTime> {
        self.rows.last().map(|&r| table.timestamp(r))
    }

    /// Keep only one in `factor` rows of the selection
    pub fn thin(&mut self, factor: usize) {
        if factor > 1 {
            let mut i = 0;
            self.rows.retain(|_| {
                let keep = i % factor == 0;
                i += 1;
                keep
            });
        }
    }
}

/// Apply a sequence of clauses to `selection`. The whole call is atomic:
/// on any error the selection is left exactly as it was.
pub fn apply(
    table: &TelemetryTable,
    selection: &mut Selection,
    clauses: &[Clause],
    resolver: &dyn InstantResolver,
) -> Result<()> {
    let mut rows = selection.rows.clone();
    for clause in clauses {
        rows = apply_one(table, rows, clause, resolver)?;
    }
    selection.rows = rows;
    Ok(())
}

fn apply_one(
    table: &TelemetryTable,
    rows: Vec<usize>,
    clause: &Clause,
    resolver: &dyn InstantResolver,
) -> Result<Vec<usize>> {
    match clause {
        Clause::Reset => Ok((0..table.len()).collect()),
        Clause::Compare { channel, op, value } => {
            let column = table.column(channel)?;
            Ok(rows
                .into_iter()
                .filter(|&r| matches!(column[r], Some(v) if op.eval(v, *value)))
                .collect())
        }
        Clause::Truthy { channel } => {
            let column = table.column(channel)?;
            Ok(rows
                .into_iter()
                .filter(|&r| matches!(column[r], Some(v) if v != 0.0))
                .collect())
        }
        Clause::Between { start, end } => {
            let start_ts = resolver.resolve(*start).ok_or_else(|| {
                AnalysisError::InsufficientData(format!("instant {:?} is not resolved", start))
            })?;
            let end_ts = resolver.resolve(*end).ok_or_else(|| {
                AnalysisError::InsufficientData(format!("instant {:?} is not resolved", end))
            })?;
            let timestamps = table.timestamps();
            Ok(rows
                .into_iter()
                .filter(|&r| timestamps[r] >= start_ts && timestamps[r] <= end_ts)
                .collect())
        }
        Clause::Or(inner) => {
            match inner.as_ref() {
                Clause::Compare { .. } | Clause::Truthy { .. } => {}
                other => {
                    return Err(AnalysisError::Query(format!(
                        "'or' is not supported for clause {:?}",
                        other
                    )))
                }
            }
            // The or-branch always matches against the full table, then
            // unions with whatever is currently selected.
            let matched = apply_one(table, (0..table.len()).collect(), inner, resolver)?;
            let mut union = rows;
            union.extend(matched);
            union.sort_unstable();
            union.dedup();
            Ok(union)
        }
    }
}
