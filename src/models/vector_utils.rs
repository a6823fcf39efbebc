//! Float-vector primitives
//!
//! Every reduction accumulates in f64 so high-dimensional inputs do not
//! lose precision in the running sums.

use crate::error::{BinquantError, Result};

/// L2 norm of a vector
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector
        .iter()
        .map(|&v| (v as f64) * (v as f64))
        .sum::<f64>()
        .sqrt() as f32
}

/// Normalize in place to unit L2 norm; a zero vector is left unchanged
pub fn normalize(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Elementwise mean of a non-empty set of equal-length vectors
pub fn compute_centroid(vectors: &[Vec<f32>]) -> Result<Vec<f32>> {
    let first = vectors.first().ok_or(BinquantError::EmptyCorpus)?;
    let dimension = first.len();
    let mut acc = vec![0.0f64; dimension];
    for vector in vectors {
        if vector.len() != dimension {
            return Err(BinquantError::DimensionMismatch {
                expected: dimension,
                got: vector.len(),
            });
        }
        for (a, &v) in acc.iter_mut().zip(vector) {
            *a += v as f64;
        }
    }
    let inv = 1.0 / vectors.len() as f64;
    Ok(acc.into_iter().map(|a| (a * inv) as f32).collect())
}

/// Dot product of two equal-length vectors
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have the same length");
    a.iter()
        .zip(b)
        .map(|(&x, &y)| x as f64 * y as f64)
        .sum::<f64>() as f32
}

/// Euclidean distance between two equal-length vectors
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have the same length");
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt() as f32
}

/// Cosine similarity; 0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product(a, b) / (norm_a * norm_b)
}

/// Raw inner product, the maximum-inner-product metric
pub fn maximum_inner_product(a: &[f32], b: &[f32]) -> f32 {
    dot_product(a, b)
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32
}

/// Population standard deviation; 0 for an empty slice
pub fn stdev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_norm() {
        assert_eq!(l2_norm(&[3.0, 4.0]), 5.0);
        assert_eq!(l2_norm(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_normalize() {
        let mut vector = vec![3.0, 4.0];
        normalize(&mut vector);
        assert!((l2_norm(&vector) - 1.0).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_compute_centroid() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
        let centroid = compute_centroid(&vectors).unwrap();
        assert!((centroid[0] - 2.0 / 3.0).abs() < 1e-6);
        assert!((centroid[1] - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_compute_centroid_rejects_empty_and_ragged() {
        assert!(matches!(
            compute_centroid(&[]),
            Err(BinquantError::EmptyCorpus)
        ));
        assert!(matches!(
            compute_centroid(&[vec![1.0, 2.0], vec![1.0]]),
            Err(BinquantError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_dot_product() {
        assert_eq!(dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }

    #[test]
    fn test_euclidean_distance() {
        assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_cosine_similarity_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean_and_stdev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-6);
        assert!((stdev(&values) - 2.0).abs() < 1e-6);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(stdev(&[]), 0.0);
    }
}
