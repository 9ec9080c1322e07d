//! Sortie Analyzer Library
//!
//! A Rust library for analyzing flight logs from multi-UAV flight-test
//! campaigns. Flight data is organized as a three-level hierarchy:
//! an Event (a field-test campaign) holds Missions (sets of UAVs flown
//! concurrently), which hold Sorties (one aircraft's single flight).
//!
//! The core of the library is the sortie state-extraction engine: it loads
//! a per-sortie telemetry CSV into a time-indexed table, recovers discrete
//! flight-phase timestamps (launch, landing, handoff, climbout, egress,
//! landbreak, autoland detection) through threshold and waypoint-transition
//! rules, and computes derived metrics (flight duration, climbout distance
//! and altitude gain, landing overshoot).
//!
//! # Features
//!
//! - **`cli`** (default): Build the command-line interface binary
//! - **`json`**: Enable summary export in JSON format
//! - **`serde`**: Enable serialization of summary records
//!
//! # Quick Start
//!
//! Analyze a sortie folder and print its summary:
//! ```rust,no_run
//! use sortie_analyzer::{AnalysisConfig, Sortie};
//! use std::path::Path;
//!
//! let config = AnalysisConfig::default();
//! let mut sortie = Sortie::from_path(Path::new("Event04/2016-07-12/Mission02/Sortie07-UAV13"), config).unwrap();
//! let failures = sortie.analyze(false).len();
//! println!("{} rules failed", failures);
//! println!("{}", sortie.summary_text());
//! ```
//!
//! Query a time window of the telemetry:
//! ```rust,no_run
//! use sortie_analyzer::{AnalysisConfig, Clause, Sortie};
//! # use std::path::Path;
//! # let mut sortie = Sortie::from_path(Path::new("x"), AnalysisConfig::default()).unwrap();
//! let fast = sortie.query(&["GPS_Spd > 18"]).unwrap().len();
//! println!("{} fast samples", fast);
//! sortie.query_data(&[Clause::Reset]).unwrap();
//! ```
//!
//! # Public API
//!
//! ## Hierarchy
//! - [`Sortie`] - One flight: telemetry table, phase detection, metrics
//! - [`Mission`] - Concurrent sorties with typed per-sortie dispatch
//! - [`Event`] - A campaign of missions over consecutive days
//!
//! ## Core Types
//! - [`TelemetryTable`] - Time-indexed table of flight channels
//! - [`Selection`] - The current filtered subset of a table
//! - [`Clause`] - Typed filter expression for the query engine
//! - [`Phase`] / [`PhaseCache`] - Flight phases and their result cache
//! - [`AnalysisConfig`] / [`WaypointMap`] - Per-sortie tunables
//!
//! ## Detection & Metrics
//! - [`detect`] - Phase-detection rules as pure functions
//! - [`metrics`] - Climbout and landing-overshoot calculations
//! - [`conversion`] - GPS time basis and great-circle distance

pub mod config;
pub mod conversion;
pub mod detect;
pub mod discovery;
pub mod error;
pub mod event;
pub mod metrics;
pub mod mission;
pub mod query;
pub mod sortie;
pub mod types;

pub use config::{channel_label, command_id, mode_number, AnalysisConfig, LandingSite, WaypointMap};
pub use discovery::{find_data, FileKind, PathMap};
pub use error::{AnalysisError, Result};
pub use event::{Event, EventStats};
pub use metrics::Overshoot;
pub use mission::{Mission, MissionStats, SortieOp};
pub use query::{Clause, CompareOp, Instant, InstantResolver, Selection};
pub use sortie::{load_flight_csv, Axis, AxisSeries, Failure, Sortie, SummaryRecord};
pub use types::{AutolandResult, Phase, PhaseCache, SortieIdentity, TelemetryTable};
