//! Benchmarks for corpus quantization and quantized search

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use binquant::{
    BinaryQuantizationFormat, FormatConfig, OptimizedScalarQuantizer, QuantizerConfig,
};

fn random_vectors(seed: u64, count: usize, dimension: usize) -> Vec<Vec<f32>> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..count)
        .map(|_| (0..dimension).map(|_| rng.f32() * 2.0 - 1.0).collect())
        .collect()
}

fn benchmark_scalar_quantize(c: &mut Criterion) {
    let quantizer = OptimizedScalarQuantizer::new(&QuantizerConfig::default());
    let vector = random_vectors(1, 1, 768).remove(0);
    let centroid = vec![0.0f32; 768];
    let mut codes = vec![0u8; 768];

    c.bench_function("scalar_quantize_768d_1bit", |b| {
        b.iter(|| {
            quantizer
                .scalar_quantize(black_box(&vector), &mut codes, 1, &centroid)
                .unwrap()
        });
    });
}

fn benchmark_build(c: &mut Criterion) {
    let format = BinaryQuantizationFormat::new(FormatConfig::default()).unwrap();
    let vectors = random_vectors(2, 1000, 128);

    c.bench_function("quantize_corpus_1000x128", |b| {
        b.iter(|| format.quantize_vectors(black_box(&vectors)).unwrap());
    });
}

fn benchmark_search(c: &mut Criterion) {
    let format = BinaryQuantizationFormat::new(FormatConfig::default()).unwrap();
    let vectors = random_vectors(3, 1000, 128);
    let corpus = format.quantize_vectors(&vectors).unwrap();
    let query = random_vectors(4, 1, 128).remove(0);

    c.bench_function("search_top_10_of_1000", |b| {
        b.iter(|| {
            format
                .search_nearest_neighbors(black_box(&query), &corpus, 10)
                .unwrap()
        });
    });

    let one_bit = BinaryQuantizationFormat::new(FormatConfig {
        query_bits: 1,
        ..FormatConfig::default()
    })
    .unwrap();
    let one_bit_corpus = one_bit.quantize_vectors(&vectors).unwrap();
    c.bench_function("search_top_10_of_1000_1bit_query", |b| {
        b.iter(|| {
            one_bit
                .search_nearest_neighbors(black_box(&query), &one_bit_corpus, 10)
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    benchmark_scalar_quantize,
    benchmark_build,
    benchmark_search
);
criterion_main!(benches);
