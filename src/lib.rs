//! MotoGP pace - lap-time analysis of MotoGP timing sheets
//!
//! This library provides:
//! - Lap-time extraction from the text of practice and race analysis sheets
//! - Race classification (position, points) extraction
//! - Relative-frequency histograms of lap times over a shared binning
//! - Bhattacharyya similarity matrices comparing riders' pace
//!
//! # Example
//!
//! ```no_run
//! use motogp_pace::analysis::compare_riders;
//! use motogp_pace::config::AnalysisConfig;
//! use motogp_pace::data::{LapTimeParser, ParseOptions};
//! use motogp_pace::models::SessionTag;
//!
//! let parser = LapTimeParser::new();
//! let options = ParseOptions::practice(SessionTag::from_file_name("2024_QAT_FP1.txt"));
//! let table = parser.parse_file("2024_QAT_FP1.txt", &options).unwrap();
//!
//! let comparison = compare_riders(&table, &AnalysisConfig::default()).unwrap();
//! for (a, b, bc) in comparison.matrix.closest_pairs().into_iter().take(3) {
//!     println!("{} ~ {}: {:.3}", a, b, bc);
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use analysis::{compare_riders, PaceComparison};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, ParseError};
pub use models::{ClassificationEntry, LapRecord, LapTable, RiderLaps, SessionTag};
