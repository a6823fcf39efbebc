//! Binquant - binary vector quantization and asymmetric scoring engine
//!
//! This crate compresses an index corpus of high-dimensional float vectors
//! down to roughly one bit per dimension with an optimized scalar
//! quantizer, quantizes incoming queries to 1 or 4 bits, and ranks the
//! corpus against a query by fusing bit-level dot products with
//! per-vector corrective terms under the Euclidean, cosine, or
//! maximum-inner-product metric.

pub mod accuracy;
pub mod corpus;
pub mod error;
pub mod format;
pub mod models;
pub mod persistence;
pub mod quantization;
pub mod scoring;

// Re-export commonly used types
pub use accuracy::{AccuracyReport, compute_accuracy};
pub use corpus::BinarizedValues;
pub use error::{BinquantError, Result};
pub use format::{BinaryQuantizationFormat, FormatConfig};
pub use models::{CorrectiveTerms, SearchResult, SimilarityFunction};
pub use quantization::{OptimizedScalarQuantizer, QuantizerConfig};
pub use scoring::{QuantizedQuery, QuantizedScorer, TopKSelector};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
