//! Bhattacharyya similarity between riders' lap-time distributions
//!
//! The coefficient of two relative-frequency histograms p and q is
//!
//! ```text
//! BC(p, q) = sum over bins of sqrt(p[i] * q[i])
//! ```
//!
//! It is 1 for identical distributions and 0 for disjoint ones.

use serde::{Deserialize, Serialize};

use super::histogram::{BinConfig, RelativeFrequencyHistogram};
use crate::error::AnalysisError;
use crate::models::LapTable;

/// Value placed on the matrix diagonal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfSimilarity {
    /// Keeps a heatmap's diagonal neutral
    #[default]
    Zero,
    One,
    /// Compute the coefficient like any other pair
    Computed,
}

fn check_lengths(p: &[f64], q: &[f64]) -> Result<(), AnalysisError> {
    if p.len() != q.len() {
        return Err(AnalysisError::MismatchedHistograms {
            left: p.len(),
            right: q.len(),
        });
    }
    Ok(())
}

/// Bhattacharyya coefficient of two relative-frequency vectors
///
/// # Examples
/// ```
/// use motogp_pace::core::similarity::bhattacharyya_coefficient;
/// let bc = bhattacharyya_coefficient(&[0.5, 0.5, 0.0], &[0.0, 0.5, 0.5]).unwrap();
/// assert!((bc - 0.5).abs() < 1e-12);
/// ```
pub fn bhattacharyya_coefficient(p: &[f64], q: &[f64]) -> Result<f64, AnalysisError> {
    check_lengths(p, q)?;
    Ok(p.iter().zip(q).map(|(a, b)| (a * b).sqrt()).sum())
}

/// Kullback-Leibler divergence D(p || q), summed elementwise
///
/// Bins where p is 0 contribute `q[i]`; bins where only q is 0 make the
/// divergence infinite.
pub fn kl_divergence(p: &[f64], q: &[f64]) -> Result<f64, AnalysisError> {
    check_lengths(p, q)?;
    Ok(p
        .iter()
        .zip(q)
        .map(|(&x, &y)| {
            if x > 0.0 && y > 0.0 {
                x * (x / y).ln() - x + y
            } else if x == 0.0 && y >= 0.0 {
                y
            } else {
                f64::INFINITY
            }
        })
        .sum())
}

/// Square rider-by-rider coefficient matrix
///
/// Rows and columns share the same rider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    riders: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl SimilarityMatrix {
    pub fn riders(&self) -> &[String] {
        &self.riders
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.riders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }

    fn index_of(&self, rider: &str) -> Option<usize> {
        self.riders.iter().position(|r| r == rider)
    }

    /// Coefficients of `rider` against every rider, in column order
    pub fn row(&self, rider: &str) -> Option<&[f64]> {
        self.index_of(rider).map(|i| self.values[i].as_slice())
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Some(self.values[i][j])
    }

    /// (rider, row) pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.riders
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Most similar other rider for each rider; ties go to the earlier column
    pub fn closest_pairs(&self) -> Vec<(&str, &str, f64)> {
        self.iter()
            .enumerate()
            .filter_map(|(i, (rider, row))| {
                row.iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .fold(None, |best: Option<(usize, f64)>, (j, &v)| match best {
                        Some((_, b)) if v <= b => best,
                        _ => Some((j, v)),
                    })
                    .map(|(j, v)| (rider, self.riders[j].as_str(), v))
            })
            .collect()
    }
}

/// Build the matrix from named histograms
pub fn matrix_from_histograms(
    histograms: &[(String, RelativeFrequencyHistogram)],
    policy: SelfSimilarity,
) -> Result<SimilarityMatrix, AnalysisError> {
    let mut values = Vec::with_capacity(histograms.len());

    for (i, (_, a)) in histograms.iter().enumerate() {
        let mut row = Vec::with_capacity(histograms.len());
        for (j, (_, b)) in histograms.iter().enumerate() {
            let coefficient = match (i == j, policy) {
                (true, SelfSimilarity::Zero) => 0.0,
                (true, SelfSimilarity::One) => 1.0,
                _ => bhattacharyya_coefficient(a.frequencies(), b.frequencies())?,
            };
            row.push(coefficient);
        }
        values.push(row);
    }

    Ok(SimilarityMatrix {
        riders: histograms.iter().map(|(name, _)| name.clone()).collect(),
        values,
    })
}

/// Histogram every rider of the table with a shared binning
pub fn rider_histograms(
    table: &LapTable,
    bins: &BinConfig,
) -> Vec<(String, RelativeFrequencyHistogram)> {
    table
        .riders
        .iter()
        .map(|r| {
            (
                r.rider.clone(),
                RelativeFrequencyHistogram::compute(&r.laps, bins),
            )
        })
        .collect()
}

/// All-pairs similarity of the riders in `table`, in table column order
pub fn similarity_matrix(
    table: &LapTable,
    bins: &BinConfig,
    policy: SelfSimilarity,
) -> Result<SimilarityMatrix, AnalysisError> {
    let histograms = rider_histograms(table, bins);
    tracing::debug!(
        "Comparing {} riders over {} bins [{:.3}, {:.3})",
        histograms.len(),
        bins.count(),
        bins.low(),
        bins.high()
    );
    matrix_from_histograms(&histograms, policy)
}
