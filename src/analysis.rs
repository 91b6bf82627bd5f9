//! Rider pace comparison
//!
//! Runs the steps the presentation layer performs before the similarity
//! engine: mask laps far from the session median, find the fastest lap,
//! derive the bins from it and build the matrix.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::core::histogram::BinConfig;
use crate::core::similarity::{similarity_matrix, SimilarityMatrix};
use crate::error::AnalysisError;
use crate::models::LapTable;

/// Result of comparing the riders of one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaceComparison {
    /// Masked laps, riders sorted by median
    pub laps: LapTable,
    pub median: f64,
    pub fastest_lap: f64,
    pub fastest_rider: String,
    pub bins: BinConfig,
    pub matrix: SimilarityMatrix,
}

/// Laps kept for comparison and the median they were masked around
pub fn mask_around_median(
    table: &LapTable,
    config: &AnalysisConfig,
) -> Result<(LapTable, f64), AnalysisError> {
    let median = table.median_of_medians().ok_or(AnalysisError::NoLapTimes)?;
    let min = median * config.lower_median_fraction;
    let max = median + config.upper_median_offset;

    tracing::debug!("Masking laps outside [{:.3}, {:.3}]", min, max);
    Ok((table.mask(min, max), median))
}

pub fn compare_riders(
    table: &LapTable,
    config: &AnalysisConfig,
) -> Result<PaceComparison, AnalysisError> {
    config.validate()?;

    let (masked, median) = mask_around_median(table, config)?;
    let laps = masked.sorted_by_median();

    let (fastest_lap, fastest_rider) = laps
        .fastest_lap()
        .map(|(lap, rider)| (lap, rider.to_string()))
        .ok_or(AnalysisError::NoLapTimes)?;
    tracing::info!("Fastest lap was {:.3} by {}", fastest_lap, fastest_rider);

    let bins = config.bins_for(fastest_lap)?;
    let matrix = similarity_matrix(&laps, &bins, config.self_similarity)?;

    Ok(PaceComparison {
        laps,
        median,
        fastest_lap,
        fastest_rider,
        bins,
        matrix,
    })
}
