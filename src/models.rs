use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Tag used for race pace documents ("..._Analysis.pdf")
pub const RACE_SESSION: &str = "RAC";

/// Session identifier attached to every row of a lap table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionTag(String);

impl SessionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Derive the tag from a downloaded file name
    ///
    /// Files are saved as `{year}_{event}_{session}.pdf`, so the tag is the last
    /// `_` segment of the stem. Race pace documents end in `Analysis` and are
    /// tagged [`RACE_SESSION`].
    pub fn from_file_name<P: AsRef<Path>>(path: P) -> Self {
        let stem = path
            .as_ref()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let tag = stem.rsplit('_').next().unwrap_or(stem);

        if tag == "Analysis" {
            Self::new(RACE_SESSION)
        } else {
            Self::new(tag)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_race(&self) -> bool {
        self.0 == RACE_SESSION
    }
}

impl fmt::Display for SessionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One rider's valid laps in document order, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderLaps {
    pub rider: String,
    pub laps: Vec<f64>,
}

/// Lap times for one session, keyed by rider name
///
/// Riders keep the order in which they first appear in the document. Column
/// lengths differ per rider; padding only happens when the table is
/// materialised as a [`polars::prelude::DataFrame`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapTable {
    pub session: SessionTag,
    pub riders: Vec<RiderLaps>,
}

impl LapTable {
    pub fn new(session: SessionTag) -> Self {
        Self {
            session,
            riders: Vec::new(),
        }
    }

    /// Insert a rider's laps
    ///
    /// A repeated name replaces the earlier laps but keeps its column position.
    pub fn insert(&mut self, rider: impl Into<String>, laps: Vec<f64>) {
        let rider = rider.into();
        match self.riders.iter_mut().find(|r| r.rider == rider) {
            Some(existing) => existing.laps = laps,
            None => self.riders.push(RiderLaps { rider, laps }),
        }
    }

    pub fn get(&self, rider: &str) -> Option<&[f64]> {
        self.riders
            .iter()
            .find(|r| r.rider == rider)
            .map(|r| r.laps.as_slice())
    }

    pub fn rider_names(&self) -> Vec<&str> {
        self.riders.iter().map(|r| r.rider.as_str()).collect()
    }

    /// Number of rows in the padded representation
    pub fn height(&self) -> usize {
        self.riders.iter().map(|r| r.laps.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.riders.len()
    }

    /// Keep only riders with at least `min_laps` laps
    pub fn retain_min_laps(&mut self, min_laps: usize) {
        self.riders.retain(|r| r.laps.len() >= min_laps);
    }
}

/// Long-format row: one lap of one rider in one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub session: SessionTag,
    pub rider: String,
    pub lap_time: f64,
}

/// Classified finisher from a race results document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEntry {
    pub position: u32,
    pub points: f64,
    pub rider: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_tag_from_file_name() {
        assert_eq!(SessionTag::from_file_name("2023_SPA_FP1.pdf").as_str(), "FP1");
        assert_eq!(
            SessionTag::from_file_name("static/2023_SPA_P2.pdf").as_str(),
            "P2"
        );
        assert_eq!(SessionTag::from_file_name("WUP.txt").as_str(), "WUP");
    }

    #[test]
    fn test_session_tag_race_analysis() {
        let tag = SessionTag::from_file_name("2023_SPA_MotoGP_RAC_Analysis.pdf");
        assert_eq!(tag.as_str(), RACE_SESSION);
        assert!(tag.is_race());
        assert!(!SessionTag::new("FP2").is_race());
    }

    #[test]
    fn test_insert_keeps_position_on_repeat() {
        let mut table = LapTable::new(SessionTag::new("FP1"));
        table.insert("Marc MARQUEZ", vec![100.0]);
        table.insert("Jorge MARTIN", vec![101.0]);
        table.insert("Marc MARQUEZ", vec![99.5, 99.7]);

        assert_eq!(table.rider_names(), vec!["Marc MARQUEZ", "Jorge MARTIN"]);
        assert_eq!(table.get("Marc MARQUEZ"), Some(&[99.5, 99.7][..]));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_height_is_longest_series() {
        let mut table = LapTable::new(SessionTag::new("FP1"));
        assert_eq!(table.height(), 0);
        table.insert("A", vec![1.0, 2.0, 3.0]);
        table.insert("B", vec![1.0]);
        assert_eq!(table.height(), 3);
    }

    #[test]
    fn test_retain_min_laps() {
        let mut table = LapTable::new(SessionTag::new("FP1"));
        table.insert("A", vec![1.0, 2.0, 3.0]);
        table.insert("B", vec![1.0, 2.0]);
        table.retain_min_laps(3);
        assert_eq!(table.rider_names(), vec!["A"]);
    }
}
