//! Sortie: one aircraft's single flight
//!
//! Owns the telemetry table loaded from the flight data CSV, the current
//! selection, and the cached phase/metric results. The `analyze` driver runs
//! every detection rule and metric, skipping anything already cached unless
//! forced, and records failures per rule instead of aborting.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use log::{debug, info, warn};

use crate::config::{channel_label, AnalysisConfig};
use crate::conversion::gps_to_timestamp;
use crate::detect;
use crate::discovery::{self, FileKind, PathMap};
use crate::error::{AnalysisError, Result};
use crate::metrics::{self, Overshoot};
use crate::query::{self, Clause, Instant, InstantResolver, Selection};
use crate::types::channels;
use crate::types::{AutolandResult, Phase, PhaseCache, SortieIdentity, TelemetryTable};

/// One failed rule from an `analyze` run
#[derive(Debug)]
pub struct Failure {
    pub rule: &'static str,
    pub error: AnalysisError,
}

/// Axis roles for the plot-layer accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// A channel bound to an axis role: the series pulled from the current
/// selection (missing values dropped) plus its display label.
#[derive(Debug, Clone)]
pub struct AxisSeries {
    pub channel: String,
    pub label: String,
    pub points: Vec<(NaiveDateTime, f64)>,
}

/// Cached derived metrics
#[derive(Debug, Clone, Default)]
struct MetricCache {
    duration: Option<Duration>,
    climbout: Option<(f64, f64)>,
    overshoot: Option<Overshoot>,
}

/// Flat summary of one analyzed sortie, read from the caches only
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SummaryRecord {
    pub event: i32,
    pub mission: i32,
    pub sortie: i32,
    pub uav: i32,
    pub launch_time: Option<String>,
    pub landing_time: Option<String>,
    pub land_cmd_time: Option<String>,
    pub last_land_cmd_time: Option<String>,
    pub handoff_time: Option<String>,
    pub climbout_time: Option<String>,
    pub egress_time: Option<String>,
    pub landbreak_time: Option<String>,
    pub duration_s: Option<f64>,
    pub autoland: Option<bool>,
    pub land_site: Option<String>,
    pub climbout_distance_m: Option<f64>,
    pub climbout_dalt_m: Option<f64>,
    pub overshoot_along_m: Option<f64>,
    pub overshoot_cross_m: Option<f64>,
}

struct PhaseInstants<'a> {
    phases: &'a PhaseCache,
    table: &'a TelemetryTable,
}

impl InstantResolver for PhaseInstants<'_> {
    fn resolve(&self, instant: Instant) -> Option<NaiveDateTime> {
        match instant {
            Instant::Phase(phase) => self.phases.get(phase),
            Instant::LogStart => self.table.start_time(),
            Instant::LogEnd => self.table.end_time(),
        }
    }
}

/// A single aircraft's flight from launch to landing (with pre-launch and
/// post-landing margin included in the log).
#[derive(Debug)]
pub struct Sortie {
    pub path: PathBuf,
    pub identity: SortieIdentity,
    pub config: AnalysisConfig,
    pub files: PathMap,
    table: TelemetryTable,
    selection: Selection,
    phases: PhaseCache,
    autoland: Option<AutolandResult>,
    metrics: MetricCache,
    failures: Vec<Failure>,
    axes: [Option<AxisSeries>; 3],
}

impl Sortie {
    /// Build a sortie from its folder: discover associated files, load the
    /// flight data CSV and parse the identity numbering from the path.
    pub fn from_path(path: &Path, config: AnalysisConfig) -> Result<Self> {
        info!("loading sortie from {}", path.display());
        let files = discovery::find_data(path, &discovery::sortie_patterns())?;
        let csv_path = files.first(FileKind::DataCsv).ok_or_else(|| {
            AnalysisError::InsufficientData(format!(
                "no flight data CSV found in {}",
                path.display()
            ))
        })?;
        let table = load_flight_csv(csv_path)?;

        let mut identity = SortieIdentity::from_path(path);
        if identity.uav == -1 {
            if let Some(summary_path) = files.first(FileKind::BinSummary) {
                if let Ok(contents) = fs::read_to_string(summary_path) {
                    if let Some(uav) = SortieIdentity::uav_from_bin_summary(&contents) {
                        identity.uav = uav;
                    }
                }
            }
        }

        Ok(Self::assemble(path.to_path_buf(), identity, config, files, table))
    }

    /// Build a sortie directly from a telemetry table (synthetic data,
    /// pre-converted logs).
    pub fn from_table(table: TelemetryTable, config: AnalysisConfig) -> Self {
        Self::assemble(
            PathBuf::new(),
            SortieIdentity::default(),
            config,
            PathMap::default(),
            table,
        )
    }

    fn assemble(
        path: PathBuf,
        identity: SortieIdentity,
        config: AnalysisConfig,
        files: PathMap,
        table: TelemetryTable,
    ) -> Self {
        let selection = Selection::all(&table);
        Self {
            path,
            identity,
            config,
            files,
            table,
            selection,
            phases: PhaseCache::default(),
            autoland: None,
            metrics: MetricCache::default(),
            failures: Vec::new(),
            axes: [None, None, None],
        }
    }

    pub fn table(&self) -> &TelemetryTable {
        &self.table
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn phases(&self) -> &PhaseCache {
        &self.phases
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn log_start_time(&self) -> Option<NaiveDateTime> {
        self.table.start_time()
    }

    pub fn log_end_time(&self) -> Option<NaiveDateTime> {
        self.table.end_time()
    }

    // ---- query interface -------------------------------------------------

    /// Apply filter clauses to the current selection. AND-narrowing by
    /// default, `or`-wrapped clauses union, `reset` restores the full table.
    /// On error the selection is unchanged.
    pub fn query_data(&mut self, clauses: &[Clause]) -> Result<&Selection> {
        let resolver = PhaseInstants {
            phases: &self.phases,
            table: &self.table,
        };
        query::apply(&self.table, &mut self.selection, clauses, &resolver)?;
        Ok(&self.selection)
    }

    /// Text-form query, each string being one combined clause
    pub fn query(&mut self, raw: &[&str]) -> Result<&Selection> {
        let clauses = raw
            .iter()
            .map(|s| Clause::parse(&[s]))
            .collect::<Result<Vec<_>>>()?;
        self.query_data(&clauses)
    }

    pub fn reset_selection(&mut self) {
        self.selection = Selection::all(&self.table);
    }

    /// Keep one in `factor` rows of the current selection
    pub fn make_sparse(&mut self, factor: usize) {
        self.selection.thin(factor);
    }

    // ---- phase rules (cached) --------------------------------------------

    fn cached_phase(
        &mut self,
        phase: Phase,
        rule: fn(&TelemetryTable, &AnalysisConfig) -> Result<NaiveDateTime>,
    ) -> Result<NaiveDateTime> {
        if let Some(ts) = self.phases.get(phase) {
            return Ok(ts);
        }
        let ts = rule(&self.table, &self.config)?;
        debug!("{}: {} = {}", self.identity.tag(), phase, ts);
        self.phases.set(phase, ts);
        Ok(ts)
    }

    pub fn launch_time(&mut self) -> Result<NaiveDateTime> {
        self.cached_phase(Phase::Launch, detect::find_launch_time)
    }

    pub fn landing_time(&mut self) -> Result<NaiveDateTime> {
        self.cached_phase(Phase::Landing, detect::find_landing_time)
    }

    pub fn land_cmd_time(&mut self) -> Result<NaiveDateTime> {
        self.cached_phase(Phase::LandCommand, detect::find_land_cmd_time)
    }

    pub fn last_land_cmd_time(&mut self) -> Result<NaiveDateTime> {
        self.cached_phase(Phase::LastLandCommand, detect::find_last_land_cmd_time)
    }

    pub fn handoff_time(&mut self) -> Result<NaiveDateTime> {
        self.cached_phase(Phase::Handoff, detect::find_handoff_time)
    }

    pub fn climbout_time(&mut self) -> Result<NaiveDateTime> {
        self.cached_phase(Phase::Climbout, detect::find_climbout_time)
    }

    pub fn egress_time(&mut self) -> Result<NaiveDateTime> {
        self.cached_phase(Phase::Egress, detect::find_egress_time)
    }

    pub fn landbreak_time(&mut self) -> Result<NaiveDateTime> {
        self.cached_phase(Phase::Landbreak, detect::find_landbreak_time)
    }

    /// Cached timestamp for a phase without running its rule
    pub fn phase_time(&self, phase: Phase) -> Option<NaiveDateTime> {
        self.phases.get(phase)
    }

    /// Drop one cached phase so its rule recomputes on the next call
    pub fn invalidate_phase(&mut self, phase: Phase) {
        self.phases.invalidate(phase);
    }

    /// Autonomous-landing determination, cached. Resolves the land command
    /// and landing times first if needed.
    pub fn check_autoland(&mut self) -> Result<AutolandResult> {
        if let Some(result) = &self.autoland {
            return Ok(result.clone());
        }
        let land_cmd = self.land_cmd_time()?;
        let landing = self.landing_time()?;
        let result = detect::check_autoland(&self.table, &self.config, land_cmd, landing)?;
        self.autoland = Some(result.clone());
        Ok(result)
    }

    pub fn autoland(&self) -> Option<&AutolandResult> {
        self.autoland.as_ref()
    }

    // ---- derived metrics (cached) ----------------------------------------

    /// Flight duration, landing minus launch
    pub fn flight_duration(&mut self) -> Result<Duration> {
        if let Some(duration) = self.metrics.duration {
            return Ok(duration);
        }
        let launch = self.launch_time()?;
        let landing = self.landing_time()?;
        let duration = landing - launch;
        self.metrics.duration = Some(duration);
        Ok(duration)
    }

    /// Climbout distance (m) and altitude gain (m)
    pub fn climbout_data(&mut self) -> Result<(f64, f64)> {
        if let Some(climbout) = self.metrics.climbout {
            return Ok(climbout);
        }
        let climbout_time = self.climbout_time()?;
        let climbout = metrics::climbout_data(&self.table, &self.config, climbout_time)?;
        self.metrics.climbout = Some(climbout);
        Ok(climbout)
    }

    /// Landing overshoot decomposed along/across the approach heading
    pub fn landing_overshoot(&mut self) -> Result<Overshoot> {
        if let Some(overshoot) = self.metrics.overshoot {
            return Ok(overshoot);
        }
        let overshoot = metrics::landing_overshoot(&self.table, &self.config)?;
        self.metrics.overshoot = Some(overshoot);
        Ok(overshoot)
    }

    // ---- driver ----------------------------------------------------------

    /// Run every detection rule and metric, skipping cached results unless
    /// `do_everything` is set. Each failure is recorded as (rule, error) and
    /// does not stop the remaining rules; the failure list is also kept on
    /// the sortie.
    pub fn analyze(&mut self, do_everything: bool) -> &[Failure] {
        info!("analyzing sortie {}", self.identity.tag());
        if do_everything {
            self.phases.clear();
            self.autoland = None;
            self.metrics = MetricCache::default();
        }
        self.failures.clear();

        macro_rules! run {
            ($name:literal, $call:expr) => {
                if let Err(error) = $call {
                    warn!("{}: {} failed: {}", self.identity.tag(), $name, error);
                    self.reset_selection();
                    self.failures.push(Failure { rule: $name, error });
                }
            };
        }

        run!("find_launch_time", self.launch_time());
        run!("find_landing_time", self.landing_time());
        run!("calculate_sortie_duration", self.flight_duration());
        run!("find_land_cmd_time", self.land_cmd_time());
        run!("find_last_land_cmd_time", self.last_land_cmd_time());
        run!("find_handoff_time", self.handoff_time());
        run!("find_climbout_time", self.climbout_time());
        run!("find_egress_time", self.egress_time());
        run!("find_landbreak_time", self.landbreak_time());
        run!("check_autoland", self.check_autoland());
        run!("calculate_climbout_data", self.climbout_data());
        run!("calculate_landing_overshoot", self.landing_overshoot());

        &self.failures
    }

    // ---- plot-layer accessors --------------------------------------------

    /// Bind a channel of the current selection to an axis role, with its
    /// display label. Rows with a missing value are dropped from the series.
    pub fn select_field(&mut self, channel: &str, axis: Axis) -> Result<&AxisSeries> {
        let column = self.table.column(channel)?;
        let points = self
            .selection
            .rows()
            .iter()
            .filter_map(|&r| column[r].map(|v| (self.table.timestamp(r), v)))
            .collect();
        let series = AxisSeries {
            channel: channel.to_string(),
            label: channel_label(channel).to_string(),
            points,
        };
        let slot = &mut self.axes[axis.index()];
        *slot = Some(series);
        Ok(slot.as_ref().expect("just set"))
    }

    pub fn axis(&self, axis: Axis) -> Option<&AxisSeries> {
        self.axes[axis.index()].as_ref()
    }

    // ---- summaries -------------------------------------------------------

    /// Flat record of everything currently cached (no computation)
    pub fn summary_record(&self) -> SummaryRecord {
        let phase = |p: Phase| self.phases.get(p).map(|t| t.to_string());
        SummaryRecord {
            event: self.identity.event,
            mission: self.identity.mission,
            sortie: self.identity.sortie,
            uav: self.identity.uav,
            launch_time: phase(Phase::Launch),
            landing_time: phase(Phase::Landing),
            land_cmd_time: phase(Phase::LandCommand),
            last_land_cmd_time: phase(Phase::LastLandCommand),
            handoff_time: phase(Phase::Handoff),
            climbout_time: phase(Phase::Climbout),
            egress_time: phase(Phase::Egress),
            landbreak_time: phase(Phase::Landbreak),
            duration_s: self
                .metrics
                .duration
                .map(|d| d.num_milliseconds() as f64 / 1000.0),
            autoland: self.autoland.as_ref().map(|a| a.autoland),
            land_site: self.autoland.as_ref().and_then(|a| a.site.clone()),
            climbout_distance_m: self.metrics.climbout.map(|(d, _)| d),
            climbout_dalt_m: self.metrics.climbout.map(|(_, d)| d),
            overshoot_along_m: self.metrics.overshoot.map(|o| o.along_m),
            overshoot_cross_m: self.metrics.overshoot.map(|o| o.cross_m),
        }
    }

    /// Printable summary of the cached analysis results
    pub fn summary_text(&self) -> String {
        fn opt<T: std::fmt::Display>(value: &Option<T>) -> String {
            match value {
                Some(v) => v.to_string(),
                None => "undetermined".to_string(),
            }
        }
        let record = self.summary_record();
        let mut out = String::new();
        out.push_str("============================\n");
        out.push_str(&format!("Event {}\n", record.event));
        out.push_str(&format!("Mission {}\n", record.mission));
        out.push_str(&format!("Sortie {}\n", record.sortie));
        out.push_str(&format!("UAV {}\n", record.uav));
        out.push_str("- - - - - - - - - - - - - - -\n");
        out.push_str(&format!("Launch Time: {}\n", opt(&record.launch_time)));
        out.push_str(&format!("Landing Time: {}\n", opt(&record.landing_time)));
        out.push_str(&format!(
            "Flight Time: {}\n",
            opt(&record.duration_s.map(|s| format!("{:.1} s", s)))
        ));
        out.push_str(&format!(
            "Autoland: {}, {}\n",
            opt(&record.autoland),
            opt(&record.land_site)
        ));
        out.push_str(&format!(
            "Climbout Distance: {}\n",
            opt(&record.climbout_distance_m.map(|m| format!("{:.0} meters", m)))
        ));
        out.push_str(&format!("Egress Time: {}\n", opt(&record.egress_time)));
        out.push_str(&format!("Handoff Time: {}\n", opt(&record.handoff_time)));
        out.push_str(&format!(
            "Time of Land command: {}\n",
            opt(&record.land_cmd_time)
        ));
        out.push_str(&format!(
            "Landbreak Time: {}\n",
            opt(&record.landbreak_time)
        ));
        out.push_str("============================\n");
        out
    }

    /// JSON form of the summary record
    #[cfg(feature = "json")]
    pub fn summary_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.summary_record())
            .map_err(|e| AnalysisError::Parse(e.to_string()))
    }

    /// Run the analysis (using cached results) and write the text summary
    /// into the sortie folder. Returns the written path.
    pub fn write_summary(&mut self) -> Result<PathBuf> {
        self.analyze(false);
        let file_name = format!("{}_text_summary.txt", self.identity.tag());
        let summary_path = if self.path.as_os_str().is_empty() {
            PathBuf::from(file_name)
        } else {
            self.path.join(file_name)
        };
        let mut file = fs::File::create(&summary_path)?;
        writeln!(file, "Summary of Sortie. Generated by Sortie::write_summary()")?;
        file.write_all(self.summary_text().as_bytes())?;
        Ok(summary_path)
    }
}

/// Load a flight data CSV into a telemetry table.
///
/// The `GPS_TimeMS`/`GPS_Week` columns (or their `GPS_GMS`/`GPS_GWk`
/// spellings) become the timestamp index and are not kept as channels.
/// Rows without a usable time basis are dropped; unparseable cells become
/// missing values.
pub fn load_flight_csv(path: &Path) -> Result<TelemetryTable> {
    info!("reading {}", path.display());
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| match h.trim() {
            "GPS_GMS" => channels::GPS_TIME_MS.to_string(),
            "GPS_GWk" => channels::GPS_WEEK.to_string(),
            other => other.to_string(),
        })
        .collect();

    let time_col = headers
        .iter()
        .position(|h| h == channels::GPS_TIME_MS)
        .ok_or_else(|| {
            AnalysisError::Parse(format!("CSV has no {} column", channels::GPS_TIME_MS))
        })?;
    let week_col = headers
        .iter()
        .position(|h| h == channels::GPS_WEEK)
        .ok_or_else(|| {
            AnalysisError::Parse(format!("CSV has no {} column", channels::GPS_WEEK))
        })?;

    let channel_names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != time_col && i != week_col)
        .map(|(_, h)| h.clone())
        .collect();
    let mut table = TelemetryTable::new(channel_names);

    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record?;
        let cell = |i: usize| record.get(i).map(str::trim).unwrap_or("");

        let time_ms: f64 = match cell(time_col).parse() {
            Ok(v) => v,
            Err(_) => {
                dropped += 1;
                continue;
            }
        };
        let week: f64 = match cell(week_col).parse() {
            Ok(v) => v,
            Err(_) => {
                dropped += 1;
                continue;
            }
        };
        if !time_ms.is_finite() || !week.is_finite() || week < 0.0 {
            dropped += 1;
            continue;
        }
        let timestamp = match gps_to_timestamp(time_ms / 1000.0, week as u32) {
            Some(ts) => ts,
            None => {
                dropped += 1;
                continue;
            }
        };

        let values: Vec<Option<f64>> = (0..headers.len())
            .filter(|&i| i != time_col && i != week_col)
            .map(|i| cell(i).parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect();
        table.push_row(timestamp, values)?;
    }
    if dropped > 0 {
        debug!("dropped {} rows without a usable time basis", dropped);
    }
    if table.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "{} contains no usable samples",
            path.display()
        )));
    }
    Ok(table)
}
