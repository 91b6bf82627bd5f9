//! Analysis settings
//!
//! Defaults follow the practice analysis page: laps within 10% below and
//! one second above the median are kept, bins span the fastest lap plus 7%
//! in 0.25 s steps.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::histogram::BinConfig;
use crate::core::similarity::SelfSimilarity;
use crate::data::parser::MIN_PRACTICE_LAPS;
use crate::error::{validate_bin_width, validate_tolerance, AnalysisError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Laps faster than `median * lower_median_fraction` are masked
    pub lower_median_fraction: f64,
    /// Laps slower than `median + upper_median_offset` seconds are masked
    pub upper_median_offset: f64,
    /// Slowest lap binned, as a percentage above the fastest lap
    pub tolerance_percent: f64,
    /// Bin width in seconds
    pub bin_width: f64,
    /// Extra seconds added on both ends of the bin range
    pub bin_margin: f64,
    pub self_similarity: SelfSimilarity,
    /// Practice riders with fewer laps are dropped
    pub min_laps: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lower_median_fraction: 0.9,
            upper_median_offset: 1.0,
            tolerance_percent: 7.0,
            bin_width: 0.25,
            bin_margin: 0.1,
            self_similarity: SelfSimilarity::Zero,
            min_laps: MIN_PRACTICE_LAPS,
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            AnalysisError::InvalidConfiguration(format!("Failed to read {:?}: {}", path, e))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.lower_median_fraction.is_finite() && self.lower_median_fraction > 0.0) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "Lower median fraction must be positive, got {}",
                self.lower_median_fraction
            )));
        }
        if !(self.upper_median_offset.is_finite() && self.upper_median_offset >= 0.0) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "Upper median offset must be non-negative, got {}",
                self.upper_median_offset
            )));
        }
        validate_tolerance(self.tolerance_percent)?;
        validate_bin_width(self.bin_width)?;
        Ok(())
    }

    /// Bins anchored on `fastest_lap` with these settings
    pub fn bins_for(&self, fastest_lap: f64) -> Result<BinConfig, AnalysisError> {
        BinConfig::from_fastest_lap(
            fastest_lap,
            self.tolerance_percent,
            self.bin_width,
            self.bin_margin,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.self_similarity, SelfSimilarity::Zero);
        assert_eq!(config.min_laps, 3);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            AnalysisConfig::from_json(r#"{"tolerance_percent": 5.0, "self_similarity": "one"}"#)
                .unwrap();
        assert_eq!(config.tolerance_percent, 5.0);
        assert_eq!(config.self_similarity, SelfSimilarity::One);
        assert_eq!(config.bin_width, 0.25);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(AnalysisConfig::from_json(r#"{"bin_width": 0.0}"#).is_err());
        assert!(AnalysisConfig::from_json(r#"{"tolerance_percent": -2.0}"#).is_err());
        assert!(AnalysisConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_from_json_file_missing() {
        assert!(AnalysisConfig::from_json_file("/nonexistent/motogp_pace.json").is_err());
    }

    #[test]
    fn test_bins_for() {
        let bins = AnalysisConfig::default().bins_for(100.0).unwrap();
        assert!((bins.low() - 99.9).abs() < 1e-9);
        assert_eq!(bins.count(), 29);
    }

    #[test]
    fn test_bins_for_tiny_width() {
        let config = AnalysisConfig::from_json(r#"{"bin_width": 1e-300}"#).unwrap();
        assert!(matches!(
            config.bins_for(100.0),
            Err(AnalysisError::InvalidConfiguration(_))
        ));
    }
}
