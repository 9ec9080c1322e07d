//! Mission: a set of sorties flown concurrently
//!
//! Loads every `Sortie*` folder under the mission directory and fans
//! analysis out across the children. Per-sortie operations go through a
//! closed, enumerated operation set (`SortieOp`); a child's error is
//! collected as that child's result and never aborts the batch.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{info, warn};

use crate::config::AnalysisConfig;
use crate::discovery::{self, FileKind, PathMap};
use crate::error::{AnalysisError, Result};
use crate::sortie::Sortie;
use crate::types::Phase;

/// The closed set of per-sortie instant operations a mission can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortieOp {
    LaunchTime,
    LandingTime,
    LandCmdTime,
    LastLandCmdTime,
    HandoffTime,
    ClimboutTime,
    EgressTime,
    LandbreakTime,
}

impl SortieOp {
    pub fn apply(self, sortie: &mut Sortie) -> Result<NaiveDateTime> {
        match self {
            SortieOp::LaunchTime => sortie.launch_time(),
            SortieOp::LandingTime => sortie.landing_time(),
            SortieOp::LandCmdTime => sortie.land_cmd_time(),
            SortieOp::LastLandCmdTime => sortie.last_land_cmd_time(),
            SortieOp::HandoffTime => sortie.handoff_time(),
            SortieOp::ClimboutTime => sortie.climbout_time(),
            SortieOp::EgressTime => sortie.egress_time(),
            SortieOp::LandbreakTime => sortie.landbreak_time(),
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            SortieOp::LaunchTime => Phase::Launch,
            SortieOp::LandingTime => Phase::Landing,
            SortieOp::LandCmdTime => Phase::LandCommand,
            SortieOp::LastLandCmdTime => Phase::LastLandCommand,
            SortieOp::HandoffTime => Phase::Handoff,
            SortieOp::ClimboutTime => Phase::Climbout,
            SortieOp::EgressTime => Phase::Egress,
            SortieOp::LandbreakTime => Phase::Landbreak,
        }
    }
}

/// Aggregate timing statistics for one mission
#[derive(Debug, Clone, Default)]
pub struct MissionStats {
    pub num_sorties: usize,
    /// First launch to last landing
    pub mission_duration: Option<Duration>,
    /// Last launch to first landing among sorties still aloft
    pub overlap_time: Option<Duration>,
    /// Sum of every sortie's flight duration
    pub total_airtime: Option<Duration>,
    pub mean_time_between_launches: Option<Duration>,
}

/// A set of sorties flown at the same time from one field site
#[derive(Debug)]
pub struct Mission {
    pub path: PathBuf,
    pub event_number: i32,
    pub mission_number: i32,
    pub date: Option<NaiveDate>,
    pub files: PathMap,
    sorties: BTreeMap<i32, Sortie>,
    /// Sortie folders that failed to load, kept as per-child outcomes
    pub load_failures: Vec<(PathBuf, AnalysisError)>,
    pub stats: MissionStats,
}

impl Mission {
    /// Load a mission folder: every `Sortie*` subfolder becomes a child,
    /// keyed by sortie number. A child that fails to load is recorded in
    /// `load_failures` and skipped.
    pub fn from_path(path: &Path, config: &AnalysisConfig) -> Result<Self> {
        info!("loading mission from {}", path.display());
        let files = discovery::find_data(path, &discovery::mission_patterns())?;

        let mut sorties = BTreeMap::new();
        let mut load_failures = Vec::new();
        for sortie_path in files.all(FileKind::SortieFolder) {
            if !sortie_path.is_dir() {
                continue;
            }
            match Sortie::from_path(sortie_path, config.clone()) {
                Ok(sortie) => {
                    sorties.insert(sortie.identity.sortie, sortie);
                }
                Err(error) => {
                    warn!("skipping {}: {}", sortie_path.display(), error);
                    load_failures.push((sortie_path.clone(), error));
                }
            }
        }

        let mut mission = Self {
            path: path.to_path_buf(),
            event_number: -1,
            mission_number: -1,
            date: None,
            files,
            sorties,
            load_failures,
            stats: MissionStats::default(),
        };
        mission.find_numbering();
        Ok(mission)
    }

    /// Event/mission numbers and the flight date from the path components
    /// (`.../EventNN/YYYY-MM-DD/MissionNN`).
    fn find_numbering(&mut self) {
        let identity = crate::types::SortieIdentity::from_path(&self.path);
        self.event_number = identity.event;
        self.mission_number = identity.mission;
        self.date = self
            .path
            .components()
            .filter_map(|c| {
                NaiveDate::parse_from_str(&c.as_os_str().to_string_lossy(), "%Y-%m-%d").ok()
            })
            .last();
    }

    pub fn num_sorties(&self) -> usize {
        self.sorties.len()
    }

    pub fn sorties(&self) -> impl Iterator<Item = (&i32, &Sortie)> {
        self.sorties.iter()
    }

    pub fn sortie(&self, number: i32) -> Option<&Sortie> {
        self.sorties.get(&number)
    }

    pub fn sortie_mut(&mut self, number: i32) -> Option<&mut Sortie> {
        self.sorties.get_mut(&number)
    }

    /// Dispatch one enumerated operation to every sortie, collecting each
    /// child's outcome (value or error) under its sortie number.
    pub fn dispatch(&mut self, op: SortieOp) -> BTreeMap<i32, Result<NaiveDateTime>> {
        let mut results = BTreeMap::new();
        for (&number, sortie) in self.sorties.iter_mut() {
            let result = op.apply(sortie);
            if let Err(error) = &result {
                warn!("sortie {}: {} failed: {}", number, op.phase(), error);
            }
            results.insert(number, result);
        }
        results
    }

    /// Launch times of every sortie that has one resolved, sorted
    pub fn launch_times(&self) -> Vec<NaiveDateTime> {
        let mut times: Vec<_> = self
            .sorties
            .values()
            .filter_map(|s| s.phase_time(Phase::Launch))
            .collect();
        times.sort();
        times
    }

    /// Landing times of every sortie that has one resolved, sorted
    pub fn landing_times(&self) -> Vec<NaiveDateTime> {
        let mut times: Vec<_> = self
            .sorties
            .values()
            .filter_map(|s| s.phase_time(Phase::Landing))
            .collect();
        times.sort();
        times
    }

    /// Analyze every sortie, then compute the mission-level statistics.
    pub fn analyze(&mut self, do_everything: bool) {
        info!("analyzing mission {}", self.mission_number);
        for sortie in self.sorties.values_mut() {
            sortie.analyze(do_everything);
        }
        self.stats = self.compute_stats();
    }

    fn compute_stats(&mut self) -> MissionStats {
        let launches = self.launch_times();
        let landings = self.landing_times();

        let mission_duration = match (launches.first(), landings.last()) {
            (Some(first_launch), Some(last_landing)) => Some(*last_landing - *first_launch),
            _ => None,
        };

        // Overlap: last launch to first landing, ignoring sorties that were
        // already down before the last aircraft got airborne.
        let overlap_time = launches.last().and_then(|last_launch| {
            landings
                .iter()
                .find(|landing| *landing >= last_launch)
                .map(|first_landing| *first_landing - *last_launch)
        });

        let mut total_airtime = Duration::zero();
        let mut counted = 0usize;
        for sortie in self.sorties.values_mut() {
            if let Ok(duration) = sortie.flight_duration() {
                total_airtime = total_airtime + duration;
                counted += 1;
            }
        }
        let total_airtime = (counted > 0).then_some(total_airtime);

        let mean_time_between_launches = (launches.len() > 1).then(|| {
            let sum: Duration = launches
                .windows(2)
                .map(|pair| pair[1] - pair[0])
                .fold(Duration::zero(), |acc, d| acc + d);
            sum / (launches.len() as i32 - 1)
        });

        MissionStats {
            num_sorties: self.sorties.len(),
            mission_duration,
            overlap_time,
            total_airtime,
            mean_time_between_launches,
        }
    }

    /// Printable summary of the mission statistics
    pub fn summary_text(&self) -> String {
        fn fmt(duration: &Option<Duration>) -> String {
            match duration {
                Some(d) => format!("{:.1} s", d.num_milliseconds() as f64 / 1000.0),
                None => "undetermined".to_string(),
            }
        }
        let mut out = String::new();
        out.push_str("=============================\n");
        out.push_str(&format!("Event: {}\n", self.event_number));
        out.push_str(&format!("Mission: {}\n", self.mission_number));
        out.push_str(&format!(
            "Date: {}\n",
            self.date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ));
        out.push_str(&format!("Sorties: {}\n", self.stats.num_sorties));
        out.push_str(&format!(
            "Mission Duration: {}\n",
            fmt(&self.stats.mission_duration)
        ));
        out.push_str(&format!(
            "Mission Overlap: {}\n",
            fmt(&self.stats.overlap_time)
        ));
        out.push_str(&format!(
            "Total Airtime: {}\n",
            fmt(&self.stats.total_airtime)
        ));
        out.push_str(&format!(
            "Mean time between launches: {}\n",
            fmt(&self.stats.mean_time_between_launches)
        ));
        out.push_str("=============================\n");
        out
    }

    /// Analyze and write the mission text summary into the mission folder.
    pub fn write_summary(&mut self) -> Result<PathBuf> {
        self.analyze(false);
        let summary_path = self.path.join(format!(
            "FX{:02}-M{:02}_text_summary.txt",
            self.event_number, self.mission_number
        ));
        let mut file = fs::File::create(&summary_path)?;
        writeln!(
            file,
            "Summary of Mission. Generated by Mission::write_summary()"
        )?;
        file.write_all(self.summary_text().as_bytes())?;
        Ok(summary_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sortie_op_phase_mapping() {
        let ops = [
            (SortieOp::LaunchTime, Phase::Launch),
            (SortieOp::LandingTime, Phase::Landing),
            (SortieOp::LandCmdTime, Phase::LandCommand),
            (SortieOp::LastLandCmdTime, Phase::LastLandCommand),
            (SortieOp::HandoffTime, Phase::Handoff),
            (SortieOp::ClimboutTime, Phase::Climbout),
            (SortieOp::EgressTime, Phase::Egress),
            (SortieOp::LandbreakTime, Phase::Landbreak),
        ];
        for (op, phase) in ops {
            assert_eq!(op.phase(), phase);
        }
    }
}
