//! Per-sortie analysis configuration
//!
//! All tunables used by phase detection and the derived-metric calculations
//! live here: speed thresholds, the waypoint role map, the mode and command-id
//! tables, and the target landing coordinate. A `Sortie` receives one
//! `AnalysisConfig` at construction; defaults match the standard field-site
//! mission plan and can be overridden per instance before analysis runs.

/// One autonomous landing site and the waypoint sequence that defines it
#[derive(Debug, Clone, PartialEq)]
pub struct LandingSite {
    pub name: String,
    pub waypoints: Vec<u32>,
}

/// Mapping from symbolic waypoint role to mission waypoint numbers
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointMap {
    /// Egress waypoints, in the order they are checked for a match
    pub egress: Vec<u32>,
    /// Waypoint targeted immediately before climbout completes
    pub pre_climbout: u32,
    /// Waypoint targeted immediately before handoff
    pub pre_handoff: u32,
    /// Landing waypoints (one per landing site)
    pub land: Vec<u32>,
    /// Declared autonomous landing sequences, checked in order
    pub auto_landing_sequence: Vec<LandingSite>,
}

impl Default for WaypointMap {
    fn default() -> Self {
        Self {
            egress: vec![15, 19],
            pre_climbout: 2,
            pre_handoff: 3,
            land: vec![17, 23],
            auto_landing_sequence: vec![
                LandingSite {
                    name: "A".to_string(),
                    waypoints: vec![13, 15, 17],
                },
                LandingSite {
                    name: "B".to_string(),
                    waypoints: vec![19, 21, 23],
                },
            ],
        }
    }
}

/// Analysis tunables for one sortie
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Ground speed that marks launch, m/s (first sample at or above)
    pub launch_speed_ms: f64,
    /// Ground speed that marks rolling/flying, m/s (last sample above = landing)
    pub landing_speed_ms: f64,
    /// Waypoint role map
    pub waypoints: WaypointMap,
    /// MODE_Mode value for fully autonomous flight
    pub auto_mode: f64,
    /// CMD_CId value of the LAND mission command
    pub land_command_id: f64,
    /// Target landing point latitude, decimal degrees
    pub target_landing_lat: f64,
    /// Target landing point longitude, decimal degrees
    pub target_landing_lng: f64,
    /// Number of final above-threshold samples used for the approach fit
    pub overshoot_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            launch_speed_ms: 5.0,
            landing_speed_ms: 3.0,
            waypoints: WaypointMap::default(),
            auto_mode: mode_number("auto").unwrap_or(10.0),
            land_command_id: command_id("land").unwrap_or(21.0),
            target_landing_lat: 35.719_535_827_6,
            target_landing_lng: -120.771_690_369,
            overshoot_window: 20,
        }
    }
}

/// ArduPlane flight mode numbers
pub const MODE_TABLE: &[(&str, f64)] = &[
    ("manual", 0.0),
    ("circle", 1.0),
    ("stabilize", 2.0),
    ("training", 3.0),
    ("acro", 4.0),
    ("fbw_A", 5.0),
    ("fbw_B", 6.0),
    ("cruise", 7.0),
    ("autotune", 8.0),
    ("auto", 10.0),
    ("rtl", 11.0),
    ("loiter", 12.0),
    ("guided", 15.0),
    ("initializing", 16.0),
];

/// Mission command (waypoint type) identifiers
pub const COMMAND_ID_TABLE: &[(&str, f64)] = &[
    ("loiter_unl", 17.0),
    ("loiter_time", 19.0),
    ("loiter_to_alt", 31.0),
    ("land", 21.0),
];

/// Look up a flight mode number by name
pub fn mode_number(name: &str) -> Option<f64> {
    MODE_TABLE.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

/// Look up a mission command id by name
pub fn command_id(name: &str) -> Option<f64> {
    COMMAND_ID_TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
}

/// Human-readable axis label for a telemetry channel, falling back to the
/// raw channel name.
pub fn channel_label(channel: &str) -> &str {
    match channel {
        "index" => "Local Time",
        "GPS_Alt" => "GPS Alt (M MSL)",
        "GPS_Spd" => "GPS Spd (M/s)",
        "BARO_Alt" => "Baro Alt (M AGL)",
        "IMU_AccX" => "X Acc. (m/s/s)",
        "IMU_AccY" => "Y Acc. (m/s/s)",
        "IMU_AccZ" => "Z Acc. (m/s/s)",
        "GPS_NSats" => "Num. of Satellites",
        "GPS_HDop" => "HDOP",
        "MODE_Mode" => "Flight Mode",
        "CMD_CNum" => "Waypoint Number",
        other => other,
    }
}
