//! Integration tests for corpus quantization and basic retrieval

use binquant::models::vector_utils::cosine_similarity;
use binquant::quantization::{pack_as_binary, packed_len, unpack_binary};
use binquant::{BinaryQuantizationFormat, FormatConfig, QuantizerConfig, SimilarityFunction};

mod helpers;
use helpers::gaussian_vectors;

fn cosine_format(query_bits: u8) -> BinaryQuantizationFormat {
    BinaryQuantizationFormat::new(FormatConfig {
        query_bits,
        index_bits: 1,
        quantizer: QuantizerConfig::default(),
    })
    .unwrap()
}

#[test]
fn test_identical_vector_ranks_first() {
    // one-hot corpus, querying with the first basis vector
    let format = cosine_format(1);
    let corpus = format
        .quantize_vectors(&[
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();

    let results = format
        .search_nearest_neighbors(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], &corpus, 2)
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].ordinal, 0);
    assert!(results[0].score > results[1].score);
}

#[test]
fn test_component_sum_recomputes_from_codes() {
    let format = cosine_format(4);
    let mut rng = fastrand::Rng::with_seed(31);
    let vectors = gaussian_vectors(&mut rng, 4, 128);
    let corpus = format.quantize_vectors(&vectors).unwrap();

    let query = &vectors[0];
    let (codes, terms) = format.quantize_query_vector(query, corpus.centroid()).unwrap();
    let recomputed: u32 = codes.iter().map(|&c| c as u32).sum();
    assert_eq!(terms.quantized_component_sum, recomputed);
    assert!(codes.iter().all(|&c| c <= 15));
}

#[test]
fn test_pack_round_trip_scenario() {
    let codes = [1u8, 0, 1, 0, 1, 1, 0, 1, 1, 0, 0, 0];
    let mut packed = vec![0u8; packed_len(codes.len())];
    pack_as_binary(&codes, &mut packed).unwrap();
    assert_eq!(packed, vec![0b1010_1101, 0b1000_0000]);

    let mut unpacked = vec![0u8; codes.len()];
    unpack_binary(&packed, &mut unpacked).unwrap();
    assert_eq!(unpacked, codes);
}

#[test]
fn test_single_vector_corpus() {
    let format = cosine_format(4);
    let corpus = format
        .quantize_vectors(&[vec![0.3, -0.4, 0.1, 0.9]])
        .unwrap();

    let results = format
        .search_nearest_neighbors(&[0.3, -0.4, 0.1, 0.9], &corpus, 5)
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ordinal, 0);
    assert!(results[0].score.is_finite());
}

#[test]
fn test_k_zero_returns_empty() {
    let format = cosine_format(4);
    let corpus = format
        .quantize_vectors(&[vec![1.0, 0.0], vec![0.0, 1.0]])
        .unwrap();
    let results = format
        .search_nearest_neighbors(&[1.0, 0.0], &corpus, 0)
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_k_larger_than_corpus_returns_all() {
    let format = cosine_format(4);
    let mut rng = fastrand::Rng::with_seed(17);
    let vectors = gaussian_vectors(&mut rng, 7, 16);
    let corpus = format.quantize_vectors(&vectors).unwrap();

    let results = format
        .search_nearest_neighbors(&vectors[3], &corpus, 100)
        .unwrap();

    assert_eq!(results.len(), 7);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_dimension_not_multiple_of_eight() {
    let format = cosine_format(4);
    let mut rng = fastrand::Rng::with_seed(13);
    let vectors = gaussian_vectors(&mut rng, 12, 21);
    let corpus = format.quantize_vectors(&vectors).unwrap();

    assert_eq!(corpus.dimension(), 21);
    assert_eq!(corpus.vector_value(0).unwrap().len(), 3);

    let results = format
        .search_nearest_neighbors(&vectors[5], &corpus, 4)
        .unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.score.is_finite()));
}

#[test]
fn test_zero_norm_vector_under_cosine() {
    assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);

    let format = cosine_format(4);
    let corpus = format
        .quantize_vectors(&[vec![0.0, 0.0, 0.0, 0.0], vec![0.5, 0.5, 0.5, 0.5]])
        .unwrap();

    // Searching with a zero query must not produce NaN scores.
    let results = format
        .search_nearest_neighbors(&[0.0, 0.0, 0.0, 0.0], &corpus, 2)
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.score.is_finite()));
}

#[test]
fn test_euclidean_and_mip_formats_build_and_search() {
    for similarity_function in [
        SimilarityFunction::Euclidean,
        SimilarityFunction::MaximumInnerProduct,
    ] {
        let format = BinaryQuantizationFormat::new(FormatConfig {
            query_bits: 4,
            index_bits: 1,
            quantizer: QuantizerConfig {
                similarity_function,
                ..QuantizerConfig::default()
            },
        })
        .unwrap();

        let mut rng = fastrand::Rng::with_seed(71);
        let vectors = gaussian_vectors(&mut rng, 30, 24);
        let corpus = format.quantize_vectors(&vectors).unwrap();
        let results = format
            .search_nearest_neighbors(&vectors[0], &corpus, 5)
            .unwrap();

        assert_eq!(results.len(), 5, "{similarity_function}");
        assert!(
            results.windows(2).all(|w| w[0].score >= w[1].score),
            "{similarity_function}"
        );
        assert!(
            results.iter().all(|r| r.score >= 0.0 && r.score.is_finite()),
            "{similarity_function}"
        );
    }
}
