//! Race classification parser
//!
//! Reads the finishing order and points from the first page of a race
//! results document. The page text is split on finishing times; within each
//! chunk the rider name and points sit at fixed offsets from the end.

use regex::Regex;
use std::path::Path;

use super::source::{first_page, read_text_dump};
use crate::error::ParseError;
use crate::models::ClassificationEntry;

const NOT_CLASSIFIED_MARKER: &str = "Not classified";

/// Chunks this short hold no complete finisher row
const MIN_CHUNK_LINES: usize = 11;

/// Offsets counted from the end of a chunk's lines
const POINTS_OFFSET: usize = 3;
const WINNER_RIDER_OFFSET: usize = 7;
// Finishers after the winner carry a gap line
const RIDER_OFFSET: usize = 8;

/// Race results (classification) document parser
pub struct ClassificationParser {
    race_time_pattern: Regex,
}

impl Default for ClassificationParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationParser {
    pub fn new() -> Self {
        Self {
            race_time_pattern: Regex::new(r"\d\d'\d\d.\d\d\d").unwrap(),
        }
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ClassificationEntry>, ParseError> {
        let text = read_text_dump(path)?;
        Ok(self.parse(&text))
    }

    /// Parse classified finishers in document order
    ///
    /// Stops at the "Not classified" section, at the first chunk too short to
    /// hold a row, or at the first points value that is not a number.
    pub fn parse(&self, text: &str) -> Vec<ClassificationEntry> {
        let page = first_page(text);
        let mut finishers: Vec<(String, f64)> = Vec::new();

        for (i, chunk) in self.race_time_pattern.split(page).enumerate() {
            if chunk.contains(NOT_CLASSIFIED_MARKER) {
                tracing::debug!("No more classified riders");
                break;
            }

            let lines: Vec<&str> = chunk.split('\n').collect();
            if lines.len() < MIN_CHUNK_LINES {
                break;
            }

            let rider_offset = if i == 0 {
                WINNER_RIDER_OFFSET
            } else {
                RIDER_OFFSET
            };
            let rider = lines[lines.len() - rider_offset].trim().to_string();
            let points_token = lines[lines.len() - POINTS_OFFSET].trim();

            let points: f64 = match points_token.parse() {
                Ok(p) => p,
                Err(_) => {
                    tracing::debug!("No points left after {} riders", finishers.len());
                    break;
                }
            };

            match finishers.iter_mut().find(|(name, _)| *name == rider) {
                Some(existing) => existing.1 = points,
                None => finishers.push((rider, points)),
            }
        }

        if finishers.is_empty() {
            tracing::warn!("No points column recognised in classification");
        }

        finishers
            .into_iter()
            .enumerate()
            .map(|(i, (rider, points))| ClassificationEntry {
                position: i as u32 + 1,
                points,
                rider,
            })
            .collect()
    }
}
