//! Event: a field-test campaign of missions over consecutive days
//!
//! Scans the event folder for dated day folders (`YYYY-MM-DD`) and the
//! `Mission*` folders inside them, then aggregates campaign-wide totals.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use log::{info, warn};

use crate::config::AnalysisConfig;
use crate::discovery::{self, FileKind, PathMap};
use crate::error::{AnalysisError, Result};
use crate::mission::Mission;
use std::collections::BTreeMap;

/// Aggregate statistics for one campaign
#[derive(Debug, Clone, Default)]
pub struct EventStats {
    pub num_missions: usize,
    pub num_sorties: usize,
    pub total_airtime: Option<Duration>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A set of missions flown over a consecutive set of field-experimentation
/// days
#[derive(Debug)]
pub struct Event {
    pub path: PathBuf,
    pub event_number: i32,
    pub files: PathMap,
    missions: BTreeMap<i32, Mission>,
    /// Mission folders that failed to load, kept as per-child outcomes
    pub load_failures: Vec<(PathBuf, AnalysisError)>,
    pub stats: EventStats,
}

impl Event {
    /// Load an event folder. Missions are searched both inside dated day
    /// folders and directly under the event path, keyed by mission number.
    pub fn from_path(path: &Path, config: &AnalysisConfig) -> Result<Self> {
        info!("loading event from {}", path.display());
        let files = discovery::find_data(path, &discovery::event_patterns())?;

        let mut mission_dirs: Vec<PathBuf> = files
            .all(FileKind::MissionFolder)
            .iter()
            .filter(|p| p.is_dir())
            .cloned()
            .collect();
        for date_dir in files.all(FileKind::DateFolder) {
            if !date_dir.is_dir() {
                continue;
            }
            let inner = discovery::find_data(date_dir, &discovery::event_patterns())?;
            mission_dirs.extend(
                inner
                    .all(FileKind::MissionFolder)
                    .iter()
                    .filter(|p| p.is_dir())
                    .cloned(),
            );
        }

        let mut missions = BTreeMap::new();
        let mut load_failures = Vec::new();
        for mission_path in mission_dirs {
            match Mission::from_path(&mission_path, config) {
                Ok(mission) => {
                    missions.insert(mission.mission_number, mission);
                }
                Err(error) => {
                    warn!("skipping {}: {}", mission_path.display(), error);
                    load_failures.push((mission_path, error));
                }
            }
        }

        let event_number = crate::types::SortieIdentity::from_path(path).event;
        Ok(Self {
            path: path.to_path_buf(),
            event_number,
            files,
            missions,
            load_failures,
            stats: EventStats::default(),
        })
    }

    pub fn num_missions(&self) -> usize {
        self.missions.len()
    }

    pub fn missions(&self) -> impl Iterator<Item = (&i32, &Mission)> {
        self.missions.iter()
    }

    pub fn mission(&self, number: i32) -> Option<&Mission> {
        self.missions.get(&number)
    }

    pub fn mission_mut(&mut self, number: i32) -> Option<&mut Mission> {
        self.missions.get_mut(&number)
    }

    /// Analyze every mission, then total up the campaign statistics.
    pub fn analyze(&mut self, do_everything: bool) {
        info!("analyzing event {}", self.event_number);
        for mission in self.missions.values_mut() {
            mission.analyze(do_everything);
        }

        let mut num_sorties = 0usize;
        let mut total_airtime = Duration::zero();
        let mut any_airtime = false;
        let mut dates: Vec<NaiveDate> = Vec::new();
        for mission in self.missions.values() {
            num_sorties += mission.num_sorties();
            if let Some(airtime) = mission.stats.total_airtime {
                total_airtime = total_airtime + airtime;
                any_airtime = true;
            }
            if let Some(date) = mission.date {
                dates.push(date);
            }
        }
        dates.sort();

        self.stats = EventStats {
            num_missions: self.missions.len(),
            num_sorties,
            total_airtime: any_airtime.then_some(total_airtime),
            start_date: dates.first().copied(),
            end_date: dates.last().copied(),
        };
    }

    /// Printable summary of the campaign statistics
    pub fn summary_text(&self) -> String {
        fn opt<T: std::fmt::Display>(value: &Option<T>) -> String {
            match value {
                Some(v) => v.to_string(),
                None => "unknown".to_string(),
            }
        }
        let mut out = String::new();
        out.push_str("=============================\n");
        out.push_str(&format!("Event: {}\n", self.event_number));
        out.push_str(&format!(
            "Dates: {} to {}\n",
            opt(&self.stats.start_date),
            opt(&self.stats.end_date)
        ));
        out.push_str(&format!("Missions: {}\n", self.stats.num_missions));
        out.push_str(&format!("Sorties: {}\n", self.stats.num_sorties));
        out.push_str(&format!(
            "Total Airtime: {}\n",
            opt(&self
                .stats
                .total_airtime
                .map(|d| format!("{:.1} s", d.num_milliseconds() as f64 / 1000.0)))
        ));
        out.push_str("=============================\n");
        out
    }

    /// Analyze and write the event text summary into the event folder.
    pub fn write_summary(&mut self) -> Result<PathBuf> {
        self.analyze(false);
        let summary_path = self
            .path
            .join(format!("FX{:02}_text_summary.txt", self.event_number));
        let mut file = fs::File::create(&summary_path)?;
        writeln!(file, "Summary of Event. Generated by Event::write_summary()")?;
        file.write_all(self.summary_text().as_bytes())?;
        Ok(summary_path)
    }
}
