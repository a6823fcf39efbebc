//! Corpus value holder: packed codes, unpacked codes, corrections, centroid

use crate::error::{BinquantError, Result};
use crate::models::CorrectiveTerms;
use crate::models::vector_utils::dot_product;
use crate::quantization::packing::packed_len;

/// Quantized corpus produced by one build; immutable afterwards.
///
/// Codes live in two contiguous arenas: the packed form (storage, and the
/// 4-bit scoring kernel) and the unpacked form (the 1-bit scoring kernel).
/// Batch scoring addresses target ranges directly in the arenas, so the
/// "concatenated target buffer" is the arena itself and no per-search
/// copies are made.
#[derive(Debug, Clone)]
pub struct BinarizedValues {
    packed: Vec<u8>,
    unpacked: Vec<u8>,
    corrections: Vec<CorrectiveTerms>,
    centroid: Vec<f32>,
    dimension: usize,
}

impl BinarizedValues {
    pub(crate) fn new(
        packed: Vec<u8>,
        unpacked: Vec<u8>,
        corrections: Vec<CorrectiveTerms>,
        centroid: Vec<f32>,
        dimension: usize,
    ) -> Result<Self> {
        let count = corrections.len();
        if unpacked.len() != count * dimension
            || packed.len() != count * packed_len(dimension)
            || centroid.len() != dimension
        {
            return Err(BinquantError::Persistence(
                "inconsistent corpus arena sizes".to_string(),
            ));
        }
        Ok(Self {
            packed,
            unpacked,
            corrections,
            centroid,
            dimension,
        })
    }

    /// Dimensionality of the quantized vectors
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors in the corpus
    pub fn size(&self) -> usize {
        self.corrections.len()
    }

    /// True when the corpus holds no vectors
    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    /// Packed 1-bit codes of one vector, `ceil(dimension / 8)` bytes
    pub fn vector_value(&self, ordinal: usize) -> Result<&[u8]> {
        self.check_ordinal(ordinal)?;
        let width = packed_len(self.dimension);
        Ok(&self.packed[ordinal * width..(ordinal + 1) * width])
    }

    /// Unpacked codes of one vector, one byte per dimension
    pub fn unpacked_vector(&self, ordinal: usize) -> Result<&[u8]> {
        self.check_ordinal(ordinal)?;
        Ok(&self.unpacked[ordinal * self.dimension..(ordinal + 1) * self.dimension])
    }

    /// Corrective terms of one vector
    pub fn corrective_terms(&self, ordinal: usize) -> Result<&CorrectiveTerms> {
        self.check_ordinal(ordinal)?;
        Ok(&self.corrections[ordinal])
    }

    /// The build centroid
    pub fn centroid(&self) -> &[f32] {
        &self.centroid
    }

    /// Dot of `query` with the centroid; without a query, the centroid
    /// self-dot (kept for the serialized metadata record)
    pub fn centroid_dp(&self, query: Option<&[f32]>) -> f32 {
        match query {
            Some(q) => dot_product(q, &self.centroid),
            None => dot_product(&self.centroid, &self.centroid),
        }
    }

    pub(crate) fn packed_range(&self, start: usize, count: usize) -> &[u8] {
        let width = packed_len(self.dimension);
        &self.packed[start * width..(start + count) * width]
    }

    pub(crate) fn unpacked_range(&self, start: usize, count: usize) -> &[u8] {
        &self.unpacked[start * self.dimension..(start + count) * self.dimension]
    }

    pub(crate) fn corrections_range(&self, start: usize, count: usize) -> &[CorrectiveTerms] {
        &self.corrections[start..start + count]
    }

    fn check_ordinal(&self, ordinal: usize) -> Result<()> {
        if ordinal >= self.size() {
            return Err(BinquantError::InvalidOrdinal {
                ordinal,
                size: self.size(),
            });
        }
        Ok(())
    }
}
