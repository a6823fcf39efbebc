//! Scoring: bit-level dot-product kernels, the asymmetric scorer, and
//! bounded top-k selection

pub mod kernels;
pub mod scorer;
pub mod topk;

pub use scorer::{QuantizedQuery, QuantizedScorer, exact_score, scale_max_inner_product};
pub use topk::TopKSelector;
