//! Histogram and similarity engine

pub mod histogram;
pub mod similarity;

// Re-export commonly used types
pub use histogram::{Bin, BinConfig, RelativeFrequencyHistogram};
pub use similarity::{
    bhattacharyya_coefficient, kl_divergence, similarity_matrix, SelfSimilarity, SimilarityMatrix,
};
