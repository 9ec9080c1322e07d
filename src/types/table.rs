use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::error::{AnalysisError, Result};

/// Well-known telemetry channel names
pub mod channels {
    pub const GPS_SPD: &str = "GPS_Spd";
    pub const GPS_LAT: &str = "GPS_Lat";
    pub const GPS_LNG: &str = "GPS_Lng";
    pub const GPS_ALT: &str = "GPS_Alt";
    pub const BARO_ALT: &str = "BARO_Alt";
    pub const IMU_ACC_X: &str = "IMU_AccX";
    pub const IMU_ACC_Y: &str = "IMU_AccY";
    pub const IMU_ACC_Z: &str = "IMU_AccZ";
    pub const CTUN_THR_OUT: &str = "CTUN_ThrOut";
    pub const ARSP_AIRSPEED: &str = "ARSP_Airspeed";
    pub const CMD_CNUM: &str = "CMD_CNum";
    pub const CMD_CID: &str = "CMD_CId";
    pub const MODE_MODE: &str = "MODE_Mode";
    pub const GPS_TIME_MS: &str = "GPS_TimeMS";
    pub const GPS_WEEK: &str = "GPS_Week";
}

/// Time-indexed table of flight telemetry channels.
///
/// Rows are ordered by timestamp (non-decreasing) and the channel set is
/// fixed once the table is built. Values are `Option<f64>`: a dropped or
/// non-numeric CSV cell is carried as `None`, never as a sentinel number.
#[derive(Debug, Clone)]
pub struct TelemetryTable {
    channel_names: Vec<String>,
    channel_index: HashMap<String, usize>,
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<Vec<Option<f64>>>,
}

impl TelemetryTable {
    pub fn new(channel_names: Vec<String>) -> Self {
        let channel_index = channel_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        let columns = vec![Vec::new(); channel_names.len()];
        Self {
            channel_names,
            channel_index,
            timestamps: Vec::new(),
            columns,
        }
    }

    /// Append one sample. Timestamps must be non-decreasing and the value
    /// vector must match the channel set.
    pub fn push_row(&mut self, timestamp: NaiveDateTime, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.channel_names.len() {
            return Err(AnalysisError::Parse(format!(
                "row has {} values, table has {} channels",
                values.len(),
                self.channel_names.len()
            )));
        }
        if let Some(last) = self.timestamps.last() {
            if timestamp < *last {
                return Err(AnalysisError::Parse(format!(
                    "timestamps out of order: {} after {}",
                    timestamp, last
                )));
            }
        }
        self.timestamps.push(timestamp);
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.push(value);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channel_index.contains_key(name)
    }

    /// Full column for a channel, or `ChannelNotFound`
    pub fn column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.channel_index
            .get(name)
            .map(|&i| self.columns[i].as_slice())
            .ok_or_else(|| AnalysisError::ChannelNotFound(name.to_string()))
    }

    /// Single cell for a channel at a row index
    pub fn value(&self, row: usize, name: &str) -> Result<Option<f64>> {
        Ok(self.column(name)?[row])
    }

    pub fn timestamp(&self, row: usize) -> NaiveDateTime {
        self.timestamps[row]
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.timestamps.first().copied()
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }

    /// Index of the last row at or before `ts`, if any
    pub fn row_at_or_before(&self, ts: NaiveDateTime) -> Option<usize> {
        let upto = self.timestamps.partition_point(|t| *t <= ts);
        upto.checked_sub(1)
    }

    /// Row indices whose timestamps fall in the inclusive span `start..=end`
    pub fn rows_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<usize> {
        let lo = self.timestamps.partition_point(|t| *t < start);
        let hi = self.timestamps.partition_point(|t| *t <= end);
        (lo..hi).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            + chrono::Duration::seconds(secs)
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut table = TelemetryTable::new(vec!["a".to_string(), "b".to_string()]);
        assert!(table.push_row(ts(0), vec![Some(1.0)]).is_err());
    }

    #[test]
    fn test_push_row_rejects_decreasing_timestamps() {
        let mut table = TelemetryTable::new(vec!["a".to_string()]);
        table.push_row(ts(1), vec![Some(1.0)]).unwrap();
        assert!(table.push_row(ts(0), vec![Some(2.0)]).is_err());
    }

    #[test]
    fn test_unknown_channel() {
        let table = TelemetryTable::new(vec!["a".to_string()]);
        assert!(matches!(
            table.column("b"),
            Err(AnalysisError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn test_rows_between_is_inclusive() {
        let mut table = TelemetryTable::new(vec!["a".to_string()]);
        for i in 0..5 {
            table.push_row(ts(i), vec![Some(i as f64)]).unwrap();
        }
        assert_eq!(table.rows_between(ts(1), ts(3)), vec![1, 2, 3]);
    }
}
