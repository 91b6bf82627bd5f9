use polars::prelude::PolarsError;
use std::io;
use thiserror::Error;

/// Errors raised while turning timing-sheet text into tables
#[derive(Debug, Error)]
pub enum ParseError {
    /// No rider-entry pattern matched anywhere in the document
    #[error("No rider entries found in document")]
    NoRiderEntries,

    /// A rider-entry match did not decompose into a usable name
    #[error("Could not extract rider name from entry {entry:?}")]
    FieldExtraction { entry: String },

    /// A lap-time token matched the pattern but is not minutes'seconds.millis
    #[error("Could not convert lap time token {token:?}")]
    ValueConversion { token: String },

    #[error("Failed to read text dump: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by the similarity engine and its upstream helpers
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Histogram lengths differ: {left} vs {right}")]
    MismatchedHistograms { left: usize, right: usize },

    /// Nothing left to anchor the bin range on
    #[error("No lap times available for analysis")]
    NoLapTimes,

    #[error("Table error: {0}")]
    Table(#[from] PolarsError),
}

/// Upper limit on histogram bins; a lap window split finer than this is a
/// misconfigured bin width
pub const MAX_BINS: usize = 100_000;

pub fn validate_bin_count(count: usize) -> Result<(), AnalysisError> {
    if count == 0 {
        return Err(AnalysisError::InvalidConfiguration(
            "Bin count must be greater than 0".to_string(),
        ));
    }
    if count > MAX_BINS {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "Bin count must be at most {}, got {}",
            MAX_BINS, count
        )));
    }
    Ok(())
}

pub fn validate_bounds(low: f64, high: f64) -> Result<(), AnalysisError> {
    if !low.is_finite() || !high.is_finite() {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "Bin bounds must be finite, got [{}, {})",
            low, high
        )));
    }
    if low >= high {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "Low bound must be below high bound, got [{}, {})",
            low, high
        )));
    }
    Ok(())
}

pub fn validate_bin_width(width: f64) -> Result<(), AnalysisError> {
    if !(width.is_finite() && width > 0.0) {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "Bin width must be positive, got {}",
            width
        )));
    }
    Ok(())
}

pub fn validate_tolerance(percent: f64) -> Result<(), AnalysisError> {
    if !(percent.is_finite() && percent >= 0.0) {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "Tolerance must be a non-negative percentage, got {}",
            percent
        )));
    }
    Ok(())
}
