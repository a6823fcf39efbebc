//! Shared helpers for the integration tests
#![allow(dead_code)]

use binquant::models::vector_utils::normalize;

/// Seeded Gaussian vectors via Box-Muller
pub fn gaussian_vectors(rng: &mut fastrand::Rng, count: usize, dimension: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|_| {
            (0..dimension)
                .map(|_| {
                    let u1 = rng.f64().max(f64::MIN_POSITIVE);
                    let u2 = rng.f64();
                    ((-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()) as f32
                })
                .collect()
        })
        .collect()
}

/// Seeded random unit vectors
pub fn unit_vectors(rng: &mut fastrand::Rng, count: usize, dimension: usize) -> Vec<Vec<f32>> {
    let mut vectors = gaussian_vectors(rng, count, dimension);
    for vector in &mut vectors {
        normalize(vector);
    }
    vectors
}

/// Fraction of `truth` ordinals present in `found`
pub fn recall(found: &[usize], truth: &[usize]) -> f32 {
    if truth.is_empty() {
        return 1.0;
    }
    let hits = truth.iter().filter(|t| found.contains(t)).count();
    hits as f32 / truth.len() as f32
}
