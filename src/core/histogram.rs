//! Relative-frequency histograms over a shared binning
//!
//! All riders in one comparison are binned with the same [`BinConfig`], so
//! their histograms have identical bin boundaries and length.
//!
//! Laps outside `[low, high)` are excluded from the bins and from the
//! denominator, so frequencies sum to 1 whenever at least one lap is in range.

use serde::{Deserialize, Serialize};

use crate::error::{
    validate_bin_count, validate_bin_width, validate_bounds, validate_tolerance, AnalysisError,
    MAX_BINS,
};

/// Equal-width binning of `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinConfig {
    low: f64,
    high: f64,
    count: usize,
}

impl BinConfig {
    pub fn new(low: f64, high: f64, count: usize) -> Result<Self, AnalysisError> {
        validate_bounds(low, high)?;
        validate_bin_count(count)?;
        Ok(Self { low, high, count })
    }

    /// Bin range anchored on the fastest lap
    ///
    /// * low = fastest - margin
    /// * high = fastest * (1 + tolerance / 100) + margin
    /// * count = ceil((high - low) / bin_width)
    pub fn from_fastest_lap(
        fastest_lap: f64,
        tolerance_percent: f64,
        bin_width: f64,
        margin: f64,
    ) -> Result<Self, AnalysisError> {
        validate_tolerance(tolerance_percent)?;
        validate_bin_width(bin_width)?;
        if !(margin.is_finite() && margin >= 0.0) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "Bin margin must be non-negative, got {}",
                margin
            )));
        }

        let low = fastest_lap - margin;
        let high = fastest_lap * (1.0 + tolerance_percent / 100.0) + margin;
        validate_bounds(low, high)?;

        let count = ((high - low) / bin_width).ceil();
        if !count.is_finite() || count > MAX_BINS as f64 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "Bin width {} splits [{}, {}) into more than {} bins",
                bin_width, low, high, MAX_BINS
            )));
        }
        Self::new(low, high, count as usize)
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn width(&self) -> f64 {
        (self.high - self.low) / self.count as f64
    }

    /// `count + 1` bin edges from low to high
    pub fn edges(&self) -> Vec<f64> {
        let width = self.width();
        (0..=self.count)
            .map(|i| {
                if i == self.count {
                    self.high
                } else {
                    self.low + width * i as f64
                }
            })
            .collect()
    }

    /// Bin holding `value`, `None` outside `[low, high)`
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || value < self.low || value >= self.high {
            return None;
        }
        let idx = ((value - self.low) / self.width()).floor() as usize;
        // Values just below `high` can round up to `count`
        Some(idx.min(self.count - 1))
    }
}

/// One bin of a histogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeFrequencyHistogram {
    config: BinConfig,
    counts: Vec<usize>,
    frequencies: Vec<f64>,
    excluded: usize,
}

impl RelativeFrequencyHistogram {
    /// Bin one rider's laps; non-finite values count as missing
    pub fn compute(laps: &[f64], config: &BinConfig) -> Self {
        let mut counts = vec![0usize; config.count()];
        let mut excluded = 0;

        for &lap in laps.iter().filter(|l| l.is_finite()) {
            match config.bin_index(lap) {
                Some(idx) => counts[idx] += 1,
                None => excluded += 1,
            }
        }

        let in_range: usize = counts.iter().sum();
        let frequencies = if in_range == 0 {
            vec![0.0; config.count()]
        } else {
            counts
                .iter()
                .map(|&c| c as f64 / in_range as f64)
                .collect()
        };

        Self {
            config: *config,
            counts,
            frequencies,
            excluded,
        }
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Laps that fell inside the bin range
    pub fn in_range(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Laps outside the bin range
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// (lower, upper, frequency) per bin
    pub fn bins(&self) -> Vec<Bin> {
        let edges = self.config.edges();
        self.frequencies
            .iter()
            .enumerate()
            .map(|(i, &frequency)| Bin {
                lower: edges[i],
                upper: edges[i + 1],
                frequency,
            })
            .collect()
    }
}
