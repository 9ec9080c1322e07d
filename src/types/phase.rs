use std::collections::HashMap;

use chrono::NaiveDateTime;

/// Discrete flight phases recovered from telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Launch,
    Landing,
    LandCommand,
    LastLandCommand,
    Handoff,
    Climbout,
    Egress,
    Landbreak,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::Launch,
        Phase::Landing,
        Phase::LandCommand,
        Phase::LastLandCommand,
        Phase::Handoff,
        Phase::Climbout,
        Phase::Egress,
        Phase::Landbreak,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Launch => "launch",
            Phase::Landing => "landing",
            Phase::LandCommand => "land_command",
            Phase::LastLandCommand => "last_land_command",
            Phase::Handoff => "handoff",
            Phase::Climbout => "climbout",
            Phase::Egress => "egress",
            Phase::Landbreak => "landbreak",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Explicit result cache for phase-detection rules, keyed by phase.
///
/// A rule stores its timestamp here on first success; the `analyze` driver
/// skips any phase already present unless the caller forces recomputation.
/// Entries are never invalidated automatically.
#[derive(Debug, Clone, Default)]
pub struct PhaseCache {
    entries: HashMap<Phase, NaiveDateTime>,
}

impl PhaseCache {
    pub fn get(&self, phase: Phase) -> Option<NaiveDateTime> {
        self.entries.get(&phase).copied()
    }

    pub fn set(&mut self, phase: Phase, timestamp: NaiveDateTime) {
        self.entries.insert(phase, timestamp);
    }

    pub fn is_cached(&self, phase: Phase) -> bool {
        self.entries.contains_key(&phase)
    }

    /// Drop one cached result so the next rule invocation recomputes it
    pub fn invalidate(&mut self, phase: Phase) {
        self.entries.remove(&phase);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Outcome of the autonomous-landing determination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutolandResult {
    /// True only if the aircraft stayed in auto mode from land command to
    /// touchdown and completed one declared landing sequence
    pub autoland: bool,
    /// Name of the landing site whose full waypoint sequence was observed
    pub site: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cache_set_get_invalidate() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let mut cache = PhaseCache::default();
        assert!(!cache.is_cached(Phase::Launch));
        cache.set(Phase::Launch, ts);
        assert_eq!(cache.get(Phase::Launch), Some(ts));
        cache.invalidate(Phase::Launch);
        assert!(cache.get(Phase::Launch).is_none());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::LastLandCommand.name(), "last_land_command");
        assert_eq!(Phase::ALL.len(), 8);
    }
}
