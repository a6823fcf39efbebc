//! Asymmetric scoring of quantized queries against a binarized corpus
//!
//! The bit-level dot product between query and index codes is fused with
//! the per-vector corrective terms into a similarity score. The three
//! metrics share one bilinear base term and differ only in finalization.

use crate::corpus::BinarizedValues;
use crate::error::{BinquantError, Result};
use crate::models::vector_utils_simd::{dot_product_simd, squared_euclidean_simd};
use crate::models::{CorrectiveTerms, SimilarityFunction};
use crate::quantization::packing::transpose_half_byte;
use crate::scoring::kernels::{
    batch_int1_bit, batch_int4_bit_packed, int1_bit_dot_product, int4_bit_dot_product,
};

/// Folds the 4-bit code range back to the unit interval
const FOUR_BIT_SCALE: f32 = 1.0 / 15.0;

/// A quantized query plus everything the scorer needs alongside it
#[derive(Debug, Clone)]
pub struct QuantizedQuery {
    /// Unpacked codes, one byte per dimension ({0,1} for 1-bit queries,
    /// {0..15} for 4-bit)
    pub codes: Vec<u8>,
    /// Corrective terms from query quantization
    pub corrections: CorrectiveTerms,
    /// Query precision in bits; only 1 and 4 are scorable
    pub bits: u8,
    /// Dot of the processed query with the corpus centroid; unused for
    /// Euclidean scoring
    pub centroid_dp: f32,
}

/// Scorer fusing bit dot products with corrective terms under one metric
#[derive(Debug, Clone)]
pub struct QuantizedScorer {
    similarity_function: SimilarityFunction,
}

impl QuantizedScorer {
    /// Create a scorer for one similarity function
    pub fn new(similarity_function: SimilarityFunction) -> Self {
        Self {
            similarity_function,
        }
    }

    /// Similarity function this scorer finalizes under
    pub fn similarity_function(&self) -> SimilarityFunction {
        self.similarity_function
    }

    /// Score a single target ordinal.
    ///
    /// 4-bit queries are transposed into bit-planes here, inside the
    /// scoring path; the query itself stays in plain per-dimension codes.
    pub fn score_target(
        &self,
        query: &QuantizedQuery,
        corpus: &BinarizedValues,
        ordinal: usize,
    ) -> Result<f32> {
        let dimension = corpus.dimension();
        if query.codes.len() != dimension {
            return Err(BinquantError::DimensionMismatch {
                expected: dimension,
                got: query.codes.len(),
            });
        }
        let target = corpus.unpacked_vector(ordinal)?;
        let corrections = corpus.corrective_terms(ordinal)?;
        let qc_dist = match query.bits {
            1 => int1_bit_dot_product(&query.codes, target)?,
            4 => {
                let mut planes = vec![0u8; 4 * dimension];
                transpose_half_byte(&query.codes, &mut planes)?;
                int4_bit_dot_product(&planes, target)?
            }
            bits => {
                return Err(BinquantError::InvalidConfig(format!(
                    "query bits must be 1 or 4 for scoring, got {bits}"
                )));
            }
        };
        Ok(self.finalize(query, corrections, qc_dist, dimension))
    }

    /// Score `out.len()` consecutive targets starting at `start`.
    ///
    /// 1-bit queries run the unpacked batch kernel over the corpus code
    /// arena; 4-bit queries run the packed kernel. The metric is matched
    /// once per batch so the per-target loop carries no branch.
    pub fn score_batch_into(
        &self,
        query: &QuantizedQuery,
        corpus: &BinarizedValues,
        start: usize,
        out: &mut [f32],
    ) -> Result<()> {
        let dimension = corpus.dimension();
        let count = out.len();
        if query.codes.len() != dimension {
            return Err(BinquantError::DimensionMismatch {
                expected: dimension,
                got: query.codes.len(),
            });
        }
        if count == 0 {
            return Ok(());
        }
        if start + count > corpus.size() {
            return Err(BinquantError::InvalidOrdinal {
                ordinal: start + count - 1,
                size: corpus.size(),
            });
        }

        let qc_dists = match query.bits {
            1 => batch_int1_bit(
                &query.codes,
                corpus.unpacked_range(start, count),
                count,
                dimension,
            )?,
            4 => batch_int4_bit_packed(
                &query.codes,
                corpus.packed_range(start, count),
                count,
                dimension,
            )?,
            bits => {
                return Err(BinquantError::InvalidConfig(format!(
                    "query bits must be 1 or 4 for scoring, got {bits}"
                )));
            }
        };

        let corrections = corpus.corrections_range(start, count);
        let ly_scale = if query.bits == 4 { FOUR_BIT_SCALE } else { 1.0 };
        let q = &query.corrections;
        match self.similarity_function {
            SimilarityFunction::Euclidean => {
                for ((score, &qc_dist), index) in out.iter_mut().zip(&qc_dists).zip(corrections) {
                    let base = base_score(q, index, qc_dist, dimension, ly_scale);
                    let s = q.additional_correction + index.additional_correction - 2.0 * base;
                    *score = (1.0 / (1.0 + s)).max(0.0);
                }
            }
            SimilarityFunction::Cosine => {
                for ((score, &qc_dist), index) in out.iter_mut().zip(&qc_dists).zip(corrections) {
                    let base = base_score(q, index, qc_dist, dimension, ly_scale);
                    let s = base + q.additional_correction + index.additional_correction
                        - query.centroid_dp;
                    *score = ((1.0 + s) / 2.0).max(0.0);
                }
            }
            SimilarityFunction::MaximumInnerProduct => {
                for ((score, &qc_dist), index) in out.iter_mut().zip(&qc_dists).zip(corrections) {
                    let base = base_score(q, index, qc_dist, dimension, ly_scale);
                    let s = base + q.additional_correction + index.additional_correction
                        - query.centroid_dp;
                    *score = scale_max_inner_product(s);
                }
            }
        }
        Ok(())
    }

    /// Convenience wrapper around [`score_batch_into`](Self::score_batch_into)
    /// that allocates the output buffer
    pub fn score_batch(
        &self,
        query: &QuantizedQuery,
        corpus: &BinarizedValues,
        start: usize,
        count: usize,
    ) -> Result<Vec<f32>> {
        let mut scores = vec![0.0f32; count];
        self.score_batch_into(query, corpus, start, &mut scores)?;
        Ok(scores)
    }

    fn finalize(
        &self,
        query: &QuantizedQuery,
        index: &CorrectiveTerms,
        qc_dist: i32,
        dimension: usize,
    ) -> f32 {
        let ly_scale = if query.bits == 4 { FOUR_BIT_SCALE } else { 1.0 };
        let base = base_score(&query.corrections, index, qc_dist, dimension, ly_scale);
        match self.similarity_function {
            SimilarityFunction::Euclidean => {
                let s = query.corrections.additional_correction + index.additional_correction
                    - 2.0 * base;
                (1.0 / (1.0 + s)).max(0.0)
            }
            SimilarityFunction::Cosine => {
                let s = base
                    + query.corrections.additional_correction
                    + index.additional_correction
                    - query.centroid_dp;
                ((1.0 + s) / 2.0).max(0.0)
            }
            SimilarityFunction::MaximumInnerProduct => {
                let s = base
                    + query.corrections.additional_correction
                    + index.additional_correction
                    - query.centroid_dp;
                scale_max_inner_product(s)
            }
        }
    }
}

/// Bilinear base term shared by all metrics:
/// `ax*ay*D + ay*lx*x1 + ax*ly*y1 + lx*ly*qcDist`
#[inline]
fn base_score(
    query: &CorrectiveTerms,
    index: &CorrectiveTerms,
    qc_dist: i32,
    dimension: usize,
    ly_scale: f32,
) -> f32 {
    let ax = index.lower_interval;
    let lx = index.upper_interval - ax;
    let ay = query.lower_interval;
    let ly = (query.upper_interval - ay) * ly_scale;
    let x1 = index.quantized_component_sum as f32;
    let y1 = query.quantized_component_sum as f32;
    ax * ay * dimension as f32 + ay * lx * x1 + ax * ly * y1 + lx * ly * qc_dist as f32
}

/// Fold a raw inner-product value into a positive, order-preserving score
#[inline]
pub fn scale_max_inner_product(score: f32) -> f32 {
    if score < 0.0 {
        1.0 / (1.0 - score)
    } else {
        score + 1.0
    }
}

/// Exact float-metric score over the original vectors, used for oversample
/// re-ranking and accuracy measurement
pub fn exact_score(similarity_function: SimilarityFunction, a: &[f32], b: &[f32]) -> f32 {
    match similarity_function {
        SimilarityFunction::Euclidean => {
            let d2 = squared_euclidean_simd(a, b);
            (1.0 / (1.0 + d2)).max(0.0)
        }
        SimilarityFunction::Cosine => {
            let norm_a = dot_product_simd(a, a).sqrt();
            let norm_b = dot_product_simd(b, b).sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                return 0.0;
            }
            let cos = dot_product_simd(a, b) / (norm_a * norm_b);
            ((1.0 + cos) / 2.0).max(0.0)
        }
        SimilarityFunction::MaximumInnerProduct => {
            scale_max_inner_product(dot_product_simd(a, b))
        }
    }
}
