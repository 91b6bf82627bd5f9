//! Lap-time extractor for timing-sheet text
//!
//! Parses the text of a lap analysis document (all pages concatenated in
//! reading order) into a [`LapTable`].
//!
//! Rider entries look like `ITA\nFrancesco BAGNAIA\n1st`: a nationality code,
//! the name, and the session position. The entries also delimit each rider's
//! block of lap data. Inside a block, `P` lines mark pit visits and split the
//! block into stints.
//!
//! # Example
//!
//! ```
//! use motogp_pace::data::parser::{LapTimeParser, ParseOptions};
//! use motogp_pace::SessionTag;
//!
//! let text = "Lap Analysis\nITA\nFrancesco BAGNAIA\n1st\n\
//!             1'45.000 1\n1'39.800 2\n1'39.900 3\n1'40.100 4\n";
//! let parser = LapTimeParser::new();
//! let table = parser
//!     .parse(text, &ParseOptions::practice(SessionTag::new("FP1")))
//!     .unwrap();
//! assert_eq!(table.get("Francesco BAGNAIA"), Some(&[99.8, 99.9, 100.1][..]));
//! ```

use regex::Regex;
use std::path::Path;

use super::source::read_text_dump;
use crate::error::ParseError;
use crate::models::{LapTable, SessionTag};

/// Minimum laps a practice rider needs to be kept
pub const MIN_PRACTICE_LAPS: usize = 3;

/// Marker that abandons the rest of a stint
const UNFINISHED_MARKER: &str = "unfinished";

/// Per-document extraction switches
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Race documents keep every lap, practice drops in/out laps
    pub is_race: bool,
    /// Drop riders with fewer than `min_laps` laps
    pub drop_short_series: bool,
    pub min_laps: usize,
    pub session: SessionTag,
}

impl ParseOptions {
    /// Practice session: trim in/out laps and drop short series
    pub fn practice(session: SessionTag) -> Self {
        Self {
            is_race: false,
            drop_short_series: true,
            min_laps: MIN_PRACTICE_LAPS,
            session,
        }
    }

    /// Race session: keep all laps and all riders
    pub fn race(session: SessionTag) -> Self {
        Self {
            is_race: true,
            drop_short_series: false,
            min_laps: MIN_PRACTICE_LAPS,
            session,
        }
    }
}

/// Lap analysis document parser
pub struct LapTimeParser {
    rider_pattern: Regex,
    pit_pattern: Regex,
    lap_pattern: Regex,
}

impl Default for LapTimeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LapTimeParser {
    pub fn new() -> Self {
        Self {
            rider_pattern: Regex::new(r"[A-Z]{3}\s[\w\s]+\s\d{1,2}[stndrh]{2,}").unwrap(),
            pit_pattern: Regex::new(r"\nP\n").unwrap(),
            // 1-2 minute laps followed by the lap counter and a separator
            lap_pattern: Regex::new(r"(?:^|\s)([12]'\d\d.\d{3})\s\d{1,2}(\s|$)").unwrap(),
        }
    }

    /// Parse a text dump from disk
    pub fn parse_file<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ParseOptions,
    ) -> Result<LapTable, ParseError> {
        let text = read_text_dump(path)?;
        self.parse(&text, options)
    }

    /// Parse document text into a lap table
    ///
    /// Fails only when no rider entry is found at all. Riders whose name can
    /// not be extracted and lap tokens that do not convert are skipped.
    pub fn parse(&self, text: &str, options: &ParseOptions) -> Result<LapTable, ParseError> {
        let entries: Vec<&str> = self
            .rider_pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .collect();

        if entries.is_empty() {
            tracing::warn!("No rider entries found for session {}", options.session);
            return Err(ParseError::NoRiderEntries);
        }

        // The first block is circuit and session metadata
        let blocks = self.rider_pattern.split(text).skip(1);

        let mut table = LapTable::new(options.session.clone());
        for (entry, block) in entries.iter().zip(blocks) {
            let rider = match rider_name(entry) {
                Ok(name) => name,
                Err(e) => {
                    tracing::debug!("Skipping rider: {}", e);
                    continue;
                }
            };
            let laps = self.extract_laps(block, options.is_race);
            table.insert(rider, laps);
        }

        if options.drop_short_series {
            let before = table.len();
            table.retain_min_laps(options.min_laps);
            if table.len() < before {
                tracing::debug!(
                    "Dropped {} riders with fewer than {} laps",
                    before - table.len(),
                    options.min_laps
                );
            }
        }

        tracing::info!(
            "Session {}: {} riders, up to {} laps",
            options.session,
            table.len(),
            table.height()
        );

        Ok(table)
    }

    /// Like [`parse`](Self::parse) but a document without riders yields an empty table
    pub fn parse_or_empty(&self, text: &str, options: &ParseOptions) -> LapTable {
        self.parse(text, options)
            .unwrap_or_else(|_| LapTable::new(options.session.clone()))
    }

    /// Valid lap times of one rider block
    pub fn extract_laps(&self, block: &str, is_race: bool) -> Vec<f64> {
        let stints: Vec<&str> = self.pit_pattern.split(block).collect();
        let final_stint = stints.len().saturating_sub(1);

        let mut laps = Vec::new();
        for (i, stint) in stints.iter().enumerate() {
            let tokens = self.lap_tokens(truncate_unfinished(stint));
            let kept = retained_tokens(&tokens, i == final_stint, is_race);

            for token in kept {
                match lap_time_to_seconds(token) {
                    Ok(seconds) => laps.push(seconds),
                    Err(e) => tracing::debug!("{}", e),
                }
            }
        }
        laps
    }

    /// Lap tokens of a stint in document order
    ///
    /// The separator after a lap counter may also lead the next token, so the
    /// search resumes at the separator instead of after it.
    fn lap_tokens<'a>(&self, stint: &'a str) -> Vec<&'a str> {
        let mut tokens = Vec::new();
        let mut start = 0;

        while let Some(caps) = self.lap_pattern.captures_at(stint, start) {
            let (Some(token), Some(separator)) = (caps.get(1), caps.get(2)) else {
                break;
            };
            tokens.push(token.as_str());
            if separator.start() >= stint.len() {
                break;
            }
            start = separator.start();
        }
        tokens
    }
}

/// Rider name from a raw entry match: the second-to-last line
pub fn rider_name(entry: &str) -> Result<String, ParseError> {
    let lines: Vec<&str> = entry.split('\n').collect();
    if lines.len() < 2 {
        return Err(ParseError::FieldExtraction {
            entry: entry.to_string(),
        });
    }

    let name = lines[lines.len() - 2].trim();
    if name.is_empty() {
        return Err(ParseError::FieldExtraction {
            entry: entry.to_string(),
        });
    }
    Ok(name.to_string())
}

/// Lap tokens of a stint that count as representative laps
///
/// Races keep everything. In practice the out-lap is dropped from every
/// stint, and the in-lap as well from stints that end in the pits.
pub fn retained_tokens<'a, T>(tokens: &'a [T], is_final_stint: bool, is_race: bool) -> &'a [T] {
    if is_race {
        return tokens;
    }
    if is_final_stint {
        tokens.get(1..).unwrap_or(&[])
    } else if tokens.len() >= 2 {
        &tokens[1..tokens.len() - 1]
    } else {
        &[]
    }
}

fn truncate_unfinished(stint: &str) -> &str {
    match stint.find(UNFINISHED_MARKER) {
        Some(idx) => &stint[..idx],
        None => stint,
    }
}

/// Convert `M'SS.mmm` into seconds rounded to milliseconds
pub fn lap_time_to_seconds(token: &str) -> Result<f64, ParseError> {
    let conversion_error = || ParseError::ValueConversion {
        token: token.to_string(),
    };

    let (minutes, seconds) = token.split_once('\'').ok_or_else(conversion_error)?;
    let minutes: u32 = minutes.parse().map_err(|_| conversion_error())?;
    let seconds: f64 = seconds.parse().map_err(|_| conversion_error())?;

    let total = minutes as f64 * 60.0 + seconds;
    Ok((total * 1000.0).round() / 1000.0)
}
