//! File discovery for the Event/Mission/Sortie hierarchy
//!
//! Each hierarchy level carries a pattern map from file kind to a glob
//! pattern; `find_data` scans one directory and buckets the matching entries
//! by kind. This is the collaborator that resolves a sortie's data CSV (and
//! any associated logs, parameter files and saved figures) before loading.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::Result;

/// Kinds of files and folders associated with a hierarchy level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    DataCsv,
    AltitudeGraph,
    LaunchGraph,
    WaypointGraph,
    OvershootGraph,
    BinSummary,
    Bin,
    BinText,
    Params,
    WaypointFile,
    Summary,
    AllPng,
    SortieFolder,
    ConcurrentSorties,
    MissionFolder,
    DateFolder,
}

/// Pattern map for a sortie folder
pub fn sortie_patterns() -> Vec<(FileKind, Pattern)> {
    pattern_list(&[
        (FileKind::DataCsv, "FX*-M*-S*.csv"),
        (FileKind::AltitudeGraph, "*Altitude_Graph.png"),
        (FileKind::LaunchGraph, "*autolaunch.png"),
        (FileKind::WaypointGraph, "*WPExec.png"),
        (FileKind::OvershootGraph, "*Overshoot_Graph.png"),
        (FileKind::BinSummary, "*.BIN_summary.txt"),
        (FileKind::Bin, "*.BIN"),
        (FileKind::BinText, "*.BIN.txt"),
        (FileKind::Params, "*.parm"),
        (FileKind::WaypointFile, "*.wp"),
        (FileKind::Summary, "FX*text_summary.txt"),
        (FileKind::AllPng, "*.png"),
    ])
}

/// Pattern map for a mission folder
pub fn mission_patterns() -> Vec<(FileKind, Pattern)> {
    pattern_list(&[
        (FileKind::SortieFolder, "Sortie*"),
        (FileKind::ConcurrentSorties, "FX*concurrent_sorties.png"),
        (FileKind::Summary, "FX*text_summary.txt"),
    ])
}

/// Pattern map for an event folder
pub fn event_patterns() -> Vec<(FileKind, Pattern)> {
    pattern_list(&[
        (FileKind::MissionFolder, "Mission*"),
        (FileKind::DateFolder, "????-??-??"),
        (FileKind::Summary, "FX*text_summary.txt"),
    ])
}

fn pattern_list(entries: &[(FileKind, &str)]) -> Vec<(FileKind, Pattern)> {
    entries
        .iter()
        .map(|(kind, pat)| (*kind, Pattern::new(pat).expect("static pattern")))
        .collect()
}

/// Paths found under one directory, bucketed by file kind
#[derive(Debug, Clone, Default)]
pub struct PathMap {
    paths: HashMap<FileKind, Vec<PathBuf>>,
}

impl PathMap {
    pub fn all(&self, kind: FileKind) -> &[PathBuf] {
        self.paths.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, kind: FileKind) -> Option<&Path> {
        self.all(kind).first().map(PathBuf::as_path)
    }

    pub fn contains(&self, kind: FileKind) -> bool {
        !self.all(kind).is_empty()
    }

    fn insert(&mut self, kind: FileKind, path: PathBuf) {
        self.paths.entry(kind).or_default().push(path);
    }
}

/// Scan one directory and match every entry name against the pattern map.
/// A single entry may land under several kinds (a PNG matches both its
/// specific kind and `AllPng`). Matches are sorted per kind for stable
/// ordering.
pub fn find_data(dir: &Path, patterns: &[(FileKind, Pattern)]) -> Result<PathMap> {
    let mut map = PathMap::default();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        for (kind, pattern) in patterns {
            if pattern.matches(&name) {
                map.insert(*kind, entry.path());
            }
        }
    }
    for paths in map.paths.values_mut() {
        paths.sort();
    }
    Ok(map)
}
