//! Accuracy statistics comparing quantized scores against exact scores

use serde::{Deserialize, Serialize};

use crate::error::{BinquantError, Result};
use crate::format::BinaryQuantizationFormat;
use crate::scoring::scorer::exact_score;

/// Error statistics between quantized and exact score sequences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Mean absolute error
    pub mean_error: f32,
    /// Largest absolute error
    pub max_error: f32,
    /// Smallest absolute error
    pub min_error: f32,
    /// Population standard deviation of the absolute errors
    pub std_error: f32,
    /// Pearson correlation between the two score sequences
    pub correlation: f32,
}

/// Quantize `originals` into a corpus, score query `i` against ordinal `i`
/// with both the quantized and the exact scorer, and summarize the errors.
pub fn compute_accuracy(
    format: &BinaryQuantizationFormat,
    originals: &[Vec<f32>],
    queries: &[Vec<f32>],
) -> Result<AccuracyReport> {
    if originals.len() != queries.len() {
        return Err(BinquantError::DimensionMismatch {
            expected: originals.len(),
            got: queries.len(),
        });
    }
    if originals.is_empty() {
        return Err(BinquantError::EmptyCorpus);
    }

    let corpus = format.quantize_vectors(originals)?;
    let similarity = format.similarity_function();

    let mut quantized_scores = Vec::with_capacity(queries.len());
    let mut exact_scores = Vec::with_capacity(queries.len());
    for (ordinal, query) in queries.iter().enumerate() {
        quantized_scores.push(format.quantized_score(query, &corpus, ordinal)?);
        exact_scores.push(exact_score(similarity, query, &originals[ordinal]));
    }

    let errors: Vec<f64> = quantized_scores
        .iter()
        .zip(&exact_scores)
        .map(|(&q, &e)| (q as f64 - e as f64).abs())
        .collect();
    let count = errors.len() as f64;
    let mean = errors.iter().sum::<f64>() / count;
    let max = errors.iter().cloned().fold(f64::MIN, f64::max);
    let min = errors.iter().cloned().fold(f64::MAX, f64::min);
    let variance = errors.iter().map(|&e| (e - mean) * (e - mean)).sum::<f64>() / count;

    Ok(AccuracyReport {
        mean_error: mean as f32,
        max_error: max as f32,
        min_error: min as f32,
        std_error: variance.sqrt() as f32,
        correlation: pearson_correlation(&quantized_scores, &exact_scores),
    })
}

/// Pearson correlation over paired arrays; 0 for mismatched lengths or
/// degenerate (zero-variance) inputs
pub fn pearson_correlation(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let count = a.len() as f64;
    let mean_a = a.iter().map(|&v| v as f64).sum::<f64>() / count;
    let mean_b = b.iter().map(|&v| v as f64).sum::<f64>() / count;

    let mut covariance = 0.0f64;
    let mut variance_a = 0.0f64;
    let mut variance_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        covariance += dx * dy;
        variance_a += dx * dx;
        variance_b += dy * dy;
    }

    let denominator = (variance_a * variance_b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    (covariance / denominator) as f32
}
