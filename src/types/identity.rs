use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

fn sortie_uav_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Sortie(\d+)-UAV(-?\d*)").expect("static regex"))
}

fn level_number(component: &str, marker: &str) -> Option<i32> {
    if !component.contains(marker) {
        return None;
    }
    let digits: String = component.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Event/mission/sortie/UAV numbers derived from a sortie's storage path.
///
/// Parsed once at construction and immutable afterwards; used for labeling,
/// summary filenames and cross-referencing in the aggregation layer. Any
/// number that cannot be determined is `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortieIdentity {
    pub event: i32,
    pub mission: i32,
    pub sortie: i32,
    pub uav: i32,
}

impl Default for SortieIdentity {
    fn default() -> Self {
        Self {
            event: -1,
            mission: -1,
            sortie: -1,
            uav: -1,
        }
    }
}

impl SortieIdentity {
    /// Extract numbering from path components like
    /// `.../Event04/2016-07-12/Mission02/Sortie07-UAV13/`.
    pub fn from_path(path: &Path) -> Self {
        let mut id = Self::default();
        for component in path.components() {
            let part = component.as_os_str().to_string_lossy();

            if let Some(n) = level_number(&part, "Event") {
                id.event = n;
            }
            if let Some(n) = level_number(&part, "Mission") {
                id.mission = n;
            }

            if let Some(caps) = sortie_uav_re().captures(&part) {
                id.sortie = caps[1].parse().unwrap_or(-1);
                id.uav = caps[2].parse().unwrap_or(-1);
            } else if let Some(n) = level_number(&part, "Sortie") {
                id.sortie = n;
            }
        }
        id
    }

    /// Pull the UAV number out of a `*.BIN_summary.txt` file when the path
    /// did not carry one.
    pub fn uav_from_bin_summary(contents: &str) -> Option<i32> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"Summary\s+for\s+plane\s+number\s*:\s*(\d+)").expect("static regex")
        });
        re.captures(contents)?.get(1)?.as_str().parse().ok()
    }

    /// Canonical `FXee-Mmm-Sss-UAVuu` tag used in filenames and titles
    pub fn tag(&self) -> String {
        format!(
            "FX{:02}-M{:02}-S{:02}-UAV{:02}",
            self.event, self.mission, self.sortie, self.uav
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_full_path_numbering() {
        let path = PathBuf::from("/data/Event04/2016-07-12/Mission02/Sortie07-UAV13");
        let id = SortieIdentity::from_path(&path);
        assert_eq!(id.event, 4);
        assert_eq!(id.mission, 2);
        assert_eq!(id.sortie, 7);
        assert_eq!(id.uav, 13);
        assert_eq!(id.tag(), "FX04-M02-S07-UAV13");
    }

    #[test]
    fn test_sortie_without_uav() {
        let id = SortieIdentity::from_path(&PathBuf::from("/data/Event01/Mission01/Sortie03"));
        assert_eq!(id.sortie, 3);
        assert_eq!(id.uav, -1);
    }

    #[test]
    fn test_uav_from_bin_summary() {
        let text = "Header\nSummary for plane number : 12\nmore text";
        assert_eq!(SortieIdentity::uav_from_bin_summary(text), Some(12));
        assert_eq!(SortieIdentity::uav_from_bin_summary("no match"), None);
    }
}
