//! Quantization format facade: end-to-end build, query, and search

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::BinarizedValues;
use crate::error::{BinquantError, Result};
use crate::models::vector_utils::{compute_centroid, normalize};
use crate::models::{CorrectiveTerms, SearchResult, SimilarityFunction};
use crate::quantization::packing::{pack_as_binary, packed_len};
use crate::quantization::{OptimizedScalarQuantizer, QuantizerConfig};
use crate::scoring::scorer::{QuantizedQuery, QuantizedScorer, exact_score};
use crate::scoring::topk::TopKSelector;

/// Targets scored per batch during a search
const SEARCH_BATCH_SIZE: usize = 1000;

/// Configuration for [`BinaryQuantizationFormat`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Query precision in bits; must be in [1, 8] to construct, and 1 or 4
    /// to actually score
    pub query_bits: u8,
    /// Index precision in bits; 1 is the packed canonical form
    pub index_bits: u8,
    /// Quantizer settings shared by the build and query paths
    pub quantizer: QuantizerConfig,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            query_bits: 4,
            index_bits: 1,
            quantizer: QuantizerConfig::default(),
        }
    }
}

/// End-to-end binary quantization format
#[derive(Debug, Clone)]
pub struct BinaryQuantizationFormat {
    config: FormatConfig,
    quantizer: OptimizedScalarQuantizer,
    scorer: QuantizedScorer,
}

impl BinaryQuantizationFormat {
    /// Validate the bit widths and assemble quantizer and scorer.
    ///
    /// Query widths outside {1, 4} pass construction and are rejected at
    /// scoring time.
    pub fn new(config: FormatConfig) -> Result<Self> {
        if !(1..=8).contains(&config.query_bits) {
            return Err(BinquantError::InvalidConfig(format!(
                "query_bits must be in [1, 8], got {}",
                config.query_bits
            )));
        }
        if !(1..=8).contains(&config.index_bits) {
            return Err(BinquantError::InvalidConfig(format!(
                "index_bits must be in [1, 8], got {}",
                config.index_bits
            )));
        }
        let quantizer = OptimizedScalarQuantizer::new(&config.quantizer);
        let scorer = QuantizedScorer::new(config.quantizer.similarity_function);
        Ok(Self {
            config,
            quantizer,
            scorer,
        })
    }

    /// The configuration this format was built with
    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Similarity function shared by quantizer and scorer
    pub fn similarity_function(&self) -> SimilarityFunction {
        self.config.quantizer.similarity_function
    }

    /// Quantize an input corpus into a [`BinarizedValues`].
    ///
    /// Cosine formats normalize every input first; the centroid is the
    /// mean of the processed vectors. 1-bit index codes are additionally
    /// packed; the unpacked copy is always retained for scoring.
    pub fn quantize_vectors(&self, vectors: &[Vec<f32>]) -> Result<BinarizedValues> {
        if vectors.is_empty() {
            return Err(BinquantError::EmptyCorpus);
        }
        let dimension = vectors[0].len();
        for vector in vectors {
            if vector.len() != dimension {
                return Err(BinquantError::DimensionMismatch {
                    expected: dimension,
                    got: vector.len(),
                });
            }
        }

        let processed: Vec<Vec<f32>> = if self.similarity_function() == SimilarityFunction::Cosine
        {
            vectors
                .iter()
                .map(|vector| {
                    let mut copy = vector.clone();
                    normalize(&mut copy);
                    copy
                })
                .collect()
        } else {
            vectors.to_vec()
        };

        let centroid = compute_centroid(&processed)?;

        let count = processed.len();
        let width = packed_len(dimension);
        let mut packed = vec![0u8; count * width];
        let mut unpacked = vec![0u8; count * dimension];
        let mut corrections = Vec::with_capacity(count);
        for (i, vector) in processed.iter().enumerate() {
            let codes = &mut unpacked[i * dimension..(i + 1) * dimension];
            let terms =
                self.quantizer
                    .scalar_quantize(vector, codes, self.config.index_bits, &centroid)?;
            if self.config.index_bits == 1 {
                pack_as_binary(codes, &mut packed[i * width..(i + 1) * width])?;
            }
            corrections.push(terms);
        }
        debug!(
            count,
            dimension,
            index_bits = self.config.index_bits,
            "corpus quantized"
        );

        BinarizedValues::new(packed, unpacked, corrections, centroid, dimension)
    }

    /// Quantize a query against a corpus centroid.
    ///
    /// Cosine formats normalize the query first. No transposition happens
    /// here; the 4-bit scoring path transposes on its own.
    pub fn quantize_query_vector(
        &self,
        query: &[f32],
        centroid: &[f32],
    ) -> Result<(Vec<u8>, CorrectiveTerms)> {
        let processed = self.processed_query(query);
        self.quantize_processed_query(&processed, centroid)
    }

    /// Exhaustively score `corpus` and return the `min(k, N)` best ordinals
    /// in descending score order, ties broken by the lower ordinal
    pub fn search_nearest_neighbors(
        &self,
        query: &[f32],
        corpus: &BinarizedValues,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        if query.len() != corpus.dimension() {
            return Err(BinquantError::DimensionMismatch {
                expected: corpus.dimension(),
                got: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let quantized = self.prepare_query(query, corpus)?;

        let count = corpus.size();
        let mut scores = vec![0.0f32; count];
        let mut start = 0;
        while start < count {
            let end = (start + SEARCH_BATCH_SIZE).min(count);
            self.scorer
                .score_batch_into(&quantized, corpus, start, &mut scores[start..end])?;
            start = end;
        }

        let mut selector = TopKSelector::new(k.min(count));
        for (ordinal, &score) in scores.iter().enumerate() {
            selector.offer(score, ordinal);
        }
        debug!(k, count, "search complete");
        Ok(selector.into_sorted_results())
    }

    /// Quantized score of `query` against a single corpus ordinal
    pub fn quantized_score(
        &self,
        query: &[f32],
        corpus: &BinarizedValues,
        ordinal: usize,
    ) -> Result<f32> {
        if query.len() != corpus.dimension() {
            return Err(BinquantError::DimensionMismatch {
                expected: corpus.dimension(),
                got: query.len(),
            });
        }
        let quantized = self.prepare_query(query, corpus)?;
        self.scorer.score_target(&quantized, corpus, ordinal)
    }

    /// Fetch `k * factor` candidates with the quantized scorer, then
    /// re-rank them by the exact float metric over the callers' original
    /// vectors and keep the `k` best.
    pub fn search_with_oversampling(
        &self,
        query: &[f32],
        corpus: &BinarizedValues,
        originals: &[Vec<f32>],
        k: usize,
        factor: usize,
    ) -> Result<Vec<SearchResult>> {
        if originals.len() != corpus.size() {
            return Err(BinquantError::DimensionMismatch {
                expected: corpus.size(),
                got: originals.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let factor = factor.max(1);
        let candidates = self.search_nearest_neighbors(query, corpus, k.saturating_mul(factor))?;

        let similarity = self.similarity_function();
        let mut reranked: Vec<SearchResult> = candidates
            .into_iter()
            .map(|candidate| SearchResult {
                score: exact_score(similarity, query, &originals[candidate.ordinal]),
                ordinal: candidate.ordinal,
            })
            .collect();
        reranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.ordinal.cmp(&b.ordinal))
        });
        reranked.truncate(k);
        Ok(reranked)
    }

    /// Normalize once (cosine only), quantize, and attach the lazy
    /// centroid dot. The processed query feeds BOTH quantization and the
    /// centroid dot, so the correction terms cancel consistently.
    fn prepare_query(&self, query: &[f32], corpus: &BinarizedValues) -> Result<QuantizedQuery> {
        if self.config.index_bits != 1 {
            return Err(BinquantError::InvalidConfig(format!(
                "scoring requires a 1-bit index, corpus was built at {} bits",
                self.config.index_bits
            )));
        }
        let processed = self.processed_query(query);
        let (codes, corrections) = self.quantize_processed_query(&processed, corpus.centroid())?;
        let centroid_dp = match self.similarity_function() {
            SimilarityFunction::Euclidean => 0.0,
            _ => corpus.centroid_dp(Some(&processed)),
        };
        Ok(QuantizedQuery {
            codes,
            corrections,
            bits: self.config.query_bits,
            centroid_dp,
        })
    }

    fn processed_query(&self, query: &[f32]) -> Vec<f32> {
        let mut processed = query.to_vec();
        if self.similarity_function() == SimilarityFunction::Cosine {
            normalize(&mut processed);
        }
        processed
    }

    fn quantize_processed_query(
        &self,
        query: &[f32],
        centroid: &[f32],
    ) -> Result<(Vec<u8>, CorrectiveTerms)> {
        let mut codes = vec![0u8; query.len()];
        let terms =
            self.quantizer
                .scalar_quantize(query, &mut codes, self.config.query_bits, centroid)?;
        Ok((codes, terms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_bits() {
        let mut config = FormatConfig::default();
        config.query_bits = 0;
        assert!(BinaryQuantizationFormat::new(config.clone()).is_err());
        config.query_bits = 9;
        assert!(BinaryQuantizationFormat::new(config.clone()).is_err());
        config.query_bits = 4;
        config.index_bits = 0;
        assert!(BinaryQuantizationFormat::new(config).is_err());
    }

    #[test]
    fn test_unscorable_query_bits_fail_at_search_time() {
        let config = FormatConfig {
            query_bits: 8,
            ..FormatConfig::default()
        };
        let format = BinaryQuantizationFormat::new(config).unwrap();
        let corpus = format
            .quantize_vectors(&[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]])
            .unwrap();
        assert!(matches!(
            format.search_nearest_neighbors(&[1.0, 0.0, 0.0, 0.0], &corpus, 1),
            Err(BinquantError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let format = BinaryQuantizationFormat::new(FormatConfig::default()).unwrap();
        assert!(matches!(
            format.quantize_vectors(&[]),
            Err(BinquantError::EmptyCorpus)
        ));
    }

    #[test]
    fn test_ragged_corpus_rejected() {
        let format = BinaryQuantizationFormat::new(FormatConfig::default()).unwrap();
        assert!(matches!(
            format.quantize_vectors(&[vec![1.0, 0.0], vec![1.0]]),
            Err(BinquantError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let format = BinaryQuantizationFormat::new(FormatConfig {
            quantizer: QuantizerConfig {
                similarity_function: SimilarityFunction::Euclidean,
                ..QuantizerConfig::default()
            },
            ..FormatConfig::default()
        })
        .unwrap();
        assert!(matches!(
            format.quantize_vectors(&[vec![1.0, f32::INFINITY]]),
            Err(BinquantError::InvalidComponent { dimension: 1, .. })
        ));
    }

    #[test]
    fn test_query_dimension_checked() {
        let format = BinaryQuantizationFormat::new(FormatConfig::default()).unwrap();
        let corpus = format
            .quantize_vectors(&[vec![1.0, 0.0, 0.0, 0.0]])
            .unwrap();
        assert!(matches!(
            format.search_nearest_neighbors(&[1.0, 0.0], &corpus, 1),
            Err(BinquantError::DimensionMismatch { expected: 4, got: 2 })
        ));
    }

    #[test]
    fn test_normalization_idempotence_for_cosine() {
        let format = BinaryQuantizationFormat::new(FormatConfig::default()).unwrap();

        let raw = vec![vec![3.0f32, 4.0, 0.0, 0.0], vec![0.0, 5.0, 12.0, 0.0]];
        let pre_normalized: Vec<Vec<f32>> = raw
            .iter()
            .map(|vector| {
                let mut copy = vector.clone();
                normalize(&mut copy);
                copy
            })
            .collect();

        let from_raw = format.quantize_vectors(&raw).unwrap();
        let from_normalized = format.quantize_vectors(&pre_normalized).unwrap();

        for ordinal in 0..from_raw.size() {
            assert_eq!(
                from_raw.unpacked_vector(ordinal).unwrap(),
                from_normalized.unpacked_vector(ordinal).unwrap()
            );
            assert_eq!(
                from_raw.corrective_terms(ordinal).unwrap(),
                from_normalized.corrective_terms(ordinal).unwrap()
            );
        }
    }
}
