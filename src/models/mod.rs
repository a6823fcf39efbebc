//! Data models shared across the quantization engine

pub mod vector_utils;
pub mod vector_utils_simd;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BinquantError, Result};

/// Similarity function the corrections are prepared for and scores are
/// finalized under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityFunction {
    /// Inverted squared-distance score
    Euclidean,
    /// Normalized-dot score; inputs and queries are L2-normalized
    #[default]
    Cosine,
    /// Raw inner product folded into a positive score
    MaximumInnerProduct,
}

impl SimilarityFunction {
    /// Stable ordinal written into the on-disk metadata record
    pub fn ordinal(&self) -> u32 {
        match self {
            SimilarityFunction::Euclidean => 0,
            SimilarityFunction::Cosine => 1,
            SimilarityFunction::MaximumInnerProduct => 2,
        }
    }

    /// Inverse of [`ordinal`](Self::ordinal), used by the persistence reader
    pub fn from_ordinal(ordinal: u32) -> Result<Self> {
        match ordinal {
            0 => Ok(SimilarityFunction::Euclidean),
            1 => Ok(SimilarityFunction::Cosine),
            2 => Ok(SimilarityFunction::MaximumInnerProduct),
            other => Err(BinquantError::InvalidConfig(format!(
                "unknown similarity ordinal {other}"
            ))),
        }
    }
}

impl fmt::Display for SimilarityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityFunction::Euclidean => write!(f, "euclidean"),
            SimilarityFunction::Cosine => write!(f, "cosine"),
            SimilarityFunction::MaximumInnerProduct => write!(f, "max_inner_product"),
        }
    }
}

impl FromStr for SimilarityFunction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "euclidean" => Ok(SimilarityFunction::Euclidean),
            "cosine" => Ok(SimilarityFunction::Cosine),
            "max_inner_product" | "dot" => Ok(SimilarityFunction::MaximumInnerProduct),
            other => Err(format!(
                "unknown similarity function '{other}' (expected euclidean, cosine, or max_inner_product)"
            )),
        }
    }
}

/// Per-vector corrective terms emitted by the optimized scalar quantizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectiveTerms {
    /// Lower bound of the chosen quantization interval
    pub lower_interval: f32,
    /// Upper bound of the chosen quantization interval
    pub upper_interval: f32,
    /// Squared L2 norm of the centered vector (Euclidean), or the dot of
    /// the pre-centering vector with the centroid (cosine / MaxIP)
    pub additional_correction: f32,
    /// Integer sum of the emitted codes
    pub quantized_component_sum: u32,
}

/// A single search hit: corpus ordinal plus similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Position of the matched vector in the built corpus
    pub ordinal: usize,
    /// Non-negative similarity score, higher is closer
    pub score: f32,
}
