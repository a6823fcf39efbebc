//! Optimized scalar quantization
//!
//! Compresses centered vectors to low-bit codes by selecting a per-vector
//! quantization interval under an anisotropic loss, then packing 1-bit
//! codes into bytes for storage and rearranging 4-bit query codes into
//! bit-planes for scoring.

pub mod packing;
pub mod scalar;

pub use packing::{pack_as_binary, packed_len, transpose_half_byte, unpack_binary};
pub use scalar::{OptimizedScalarQuantizer, QuantizerConfig};

/// Default anisotropic weight for the interval loss
pub const DEFAULT_LAMBDA: f32 = 0.1;

/// Default number of coordinate-descent refinement iterations
pub const DEFAULT_ITERS: usize = 5;

/// Minimum-MSE interval grid, one (lower, upper) multiplier pair per bit
/// width 1..=8, applied as `grid * stdev + mean` before clamping to the
/// observed range
pub(crate) const MINIMUM_MSE_GRID: [[f32; 2]; 8] = [
    [-0.798, 0.798],
    [-1.493, 1.493],
    [-2.051, 2.051],
    [-2.514, 2.514],
    [-2.916, 2.916],
    [-3.278, 3.278],
    [-3.611, 3.611],
    [-3.922, 3.922],
];

/// Determinant magnitude below which the 2x2 refinement system is singular
pub(crate) const MIN_DETERMINANT: f64 = 1e-12;

/// Convergence tolerance for refined interval endpoints
pub(crate) const INTERVAL_EPSILON: f64 = 1e-8;
