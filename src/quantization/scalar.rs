//! Per-vector optimized scalar quantization
//!
//! Each vector is centered on the corpus centroid and assigned its own
//! quantization interval: a minimum-MSE grid estimate refined by
//! coordinate descent on an anisotropic loss that weights error parallel
//! to the vector more heavily than orthogonal error.

use serde::{Deserialize, Serialize};

use crate::error::{BinquantError, Result};
use crate::models::vector_utils::dot_product;
use crate::models::{CorrectiveTerms, SimilarityFunction};
use crate::quantization::{
    DEFAULT_ITERS, DEFAULT_LAMBDA, INTERVAL_EPSILON, MIN_DETERMINANT, MINIMUM_MSE_GRID,
};

/// Configuration for the optimized scalar quantizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantizerConfig {
    /// Similarity function the corrective terms are prepared for
    pub similarity_function: SimilarityFunction,
    /// Anisotropic weight in [0, 1]; 1 reduces the loss to plain MSE
    pub lambda: f32,
    /// Maximum refinement iterations per vector
    pub iters: usize,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            similarity_function: SimilarityFunction::default(),
            lambda: DEFAULT_LAMBDA,
            iters: DEFAULT_ITERS,
        }
    }
}

/// Optimized scalar quantizer
#[derive(Debug, Clone)]
pub struct OptimizedScalarQuantizer {
    similarity_function: SimilarityFunction,
    lambda: f32,
    iters: usize,
}

impl OptimizedScalarQuantizer {
    /// Create a quantizer from its configuration
    pub fn new(config: &QuantizerConfig) -> Self {
        Self {
            similarity_function: config.similarity_function,
            lambda: config.lambda,
            iters: config.iters,
        }
    }

    /// Similarity function the corrections are prepared for
    pub fn similarity_function(&self) -> SimilarityFunction {
        self.similarity_function
    }

    /// Quantize `vector` into `destination` at `bits` bits per dimension.
    ///
    /// `destination` receives one unpacked code per dimension; the returned
    /// corrective terms feed the asymmetric scorer. Fails on NaN/infinite
    /// components, dimension mismatches, or `bits` outside [1, 8].
    pub fn scalar_quantize(
        &self,
        vector: &[f32],
        destination: &mut [u8],
        bits: u8,
        centroid: &[f32],
    ) -> Result<CorrectiveTerms> {
        if !(1..=8).contains(&bits) {
            return Err(BinquantError::InvalidConfig(format!(
                "bits must be in [1, 8], got {bits}"
            )));
        }
        if vector.len() != centroid.len() {
            return Err(BinquantError::DimensionMismatch {
                expected: centroid.len(),
                got: vector.len(),
            });
        }
        if destination.len() != vector.len() {
            return Err(BinquantError::DimensionMismatch {
                expected: vector.len(),
                got: destination.len(),
            });
        }
        for (d, &value) in vector.iter().enumerate() {
            if !value.is_finite() {
                return Err(BinquantError::InvalidComponent {
                    dimension: d,
                    value,
                });
            }
        }

        // The centroid dot must use the vector BEFORE centering: for cosine
        // and MaxIP it becomes the additional correction, and the
        // post-centering value is a different (wrong) quantity.
        let centroid_dot = if self.similarity_function != SimilarityFunction::Euclidean {
            dot_product(vector, centroid)
        } else {
            0.0
        };

        let dimension = vector.len();
        let mut centered = vec![0.0f32; dimension];
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        let mut norm2 = 0.0f64;
        for d in 0..dimension {
            let w = vector[d] - centroid[d];
            centered[d] = w;
            min = min.min(w);
            max = max.max(w);
            sum += w as f64;
            norm2 += (w as f64) * (w as f64);
        }
        let mean = sum / dimension as f64;
        let variance = centered
            .iter()
            .map(|&w| {
                let d = w as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / dimension as f64;
        let std = variance.sqrt();

        let points = 1u32 << bits;
        let grid = MINIMUM_MSE_GRID[(bits - 1) as usize];
        let mut interval = (
            ((grid[0] as f64 * std + mean) as f32).clamp(min, max),
            ((grid[1] as f64 * std + mean) as f32).clamp(min, max),
        );
        self.optimize_intervals(&mut interval, &centered, norm2, points);

        let (a, b) = interval;
        let n_steps = points - 1;
        let step = (b - a) / n_steps as f32;
        let step_inv = if step > 0.0 { 1.0 / step } else { 0.0 };
        let threshold = (a + b) / 2.0;
        let mut component_sum = 0u32;
        for (code, &w) in destination.iter_mut().zip(centered.iter()) {
            let clamped = w.clamp(a, b);
            *code = if bits == 1 {
                // Midpoint threshold, not the generic rounding: the 1-bit
                // path binarizes around the interval center.
                u8::from(clamped >= threshold)
            } else {
                let assignment = ((clamped - a) * step_inv).round() as u32;
                assignment.min(n_steps) as u8
            };
            component_sum += *code as u32;
        }

        Ok(CorrectiveTerms {
            lower_interval: a,
            upper_interval: b,
            additional_correction: if self.similarity_function == SimilarityFunction::Euclidean {
                norm2 as f32
            } else {
                centroid_dot
            },
            quantized_component_sum: component_sum,
        })
    }

    /// Quantize one vector at several bit widths in a single call
    pub fn multi_scalar_quantize(
        &self,
        vector: &[f32],
        destinations: &mut [Vec<u8>],
        bits: &[u8],
        centroid: &[f32],
    ) -> Result<Vec<CorrectiveTerms>> {
        if destinations.len() != bits.len() {
            return Err(BinquantError::DimensionMismatch {
                expected: bits.len(),
                got: destinations.len(),
            });
        }
        destinations
            .iter_mut()
            .zip(bits)
            .map(|(destination, &b)| self.scalar_quantize(vector, destination, b, centroid))
            .collect()
    }

    /// Refine `(a, b)` by coordinate descent: each iteration solves the 2x2
    /// normal equations of the anisotropic loss at the current code
    /// assignment, committing only while the loss keeps decreasing.
    fn optimize_intervals(
        &self,
        interval: &mut (f32, f32),
        centered: &[f32],
        norm2: f64,
        points: u32,
    ) {
        let lambda = self.lambda as f64;
        let scale = (1.0 - lambda) / norm2;
        if !scale.is_finite() {
            return;
        }

        let n_steps = (points - 1) as f64;
        let mut loss = self.interval_loss(centered, *interval, points, norm2);
        for _ in 0..self.iters {
            let (a, b) = *interval;
            let step_inv = if b > a { n_steps / (b - a) as f64 } else { 0.0 };

            let mut daa = 0.0f64;
            let mut dab = 0.0f64;
            let mut dbb = 0.0f64;
            let mut dax = 0.0f64;
            let mut dbx = 0.0f64;
            for &w in centered {
                let clamped = w.clamp(a, b) as f64;
                let k = ((clamped - a as f64) * step_inv).round();
                let s = k / n_steps;
                let w = w as f64;
                daa += (1.0 - s) * (1.0 - s);
                dab += (1.0 - s) * s;
                dbb += s * s;
                dax += w * (1.0 - s);
                dbx += w * s;
            }

            let m0 = scale * dax * dax + lambda * daa;
            let m1 = scale * dax * dbx + lambda * dab;
            let m2 = scale * dbx * dbx + lambda * dbb;
            let det = m0 * m2 - m1 * m1;
            if det.abs() < MIN_DETERMINANT {
                return;
            }

            let a_new = ((m2 * dax - m1 * dbx) / det) as f32;
            let b_new = ((m0 * dbx - m1 * dax) / det) as f32;
            if !a_new.is_finite() || !b_new.is_finite() || a_new > b_new {
                return;
            }
            if ((a - a_new).abs() as f64) < INTERVAL_EPSILON
                && ((b - b_new).abs() as f64) < INTERVAL_EPSILON
            {
                return;
            }

            let new_loss = self.interval_loss(centered, (a_new, b_new), points, norm2);
            if new_loss > loss {
                return;
            }
            *interval = (a_new, b_new);
            loss = new_loss;
        }
    }

    /// Anisotropic loss of quantizing `centered` onto `interval`:
    /// `(1 - lambda) * (sum w * err)^2 / norm2 + lambda * sum err^2`
    fn interval_loss(
        &self,
        centered: &[f32],
        interval: (f32, f32),
        points: u32,
        norm2: f64,
    ) -> f64 {
        let (a, b) = interval;
        let n_steps = (points - 1) as f64;
        let step = (b - a) as f64 / n_steps;
        let step_inv = if step > 0.0 { 1.0 / step } else { 0.0 };

        let mut parallel = 0.0f64;
        let mut total = 0.0f64;
        for &w in centered {
            let clamped = w.clamp(a, b) as f64;
            let k = ((clamped - a as f64) * step_inv).round();
            let reconstructed = a as f64 + step * k;
            let diff = w as f64 - reconstructed;
            parallel += w as f64 * diff;
            total += diff * diff;
        }
        let lambda = self.lambda as f64;
        (1.0 - lambda) * parallel * parallel / norm2 + lambda * total
    }
}
