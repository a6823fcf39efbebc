//! Synthetic-data demonstration of the quantization engine
//!
//! Generates a seeded Gaussian corpus plus queries, quantizes the corpus,
//! runs direct and oversampled searches across the queries in parallel,
//! and prints a JSON summary.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use rayon::prelude::*;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use binquant::{
    BinaryQuantizationFormat, FormatConfig, QuantizerConfig, SimilarityFunction, compute_accuracy,
    persistence,
};

#[derive(Parser, Debug)]
#[command(
    name = "binquant-demo",
    about = "Quantize a synthetic corpus and run sample searches"
)]
struct Args {
    /// Vector dimensionality
    #[arg(long, default_value_t = 128)]
    dimension: usize,

    /// Corpus size
    #[arg(long, default_value_t = 1000)]
    count: usize,

    /// Number of random queries
    #[arg(long, default_value_t = 10)]
    queries: usize,

    /// Neighbors returned per query
    #[arg(long, default_value_t = 10)]
    k: usize,

    /// Similarity function: euclidean, cosine, or max_inner_product
    #[arg(long, default_value = "cosine")]
    metric: SimilarityFunction,

    /// Query precision in bits (1 or 4)
    #[arg(long, default_value_t = 4)]
    query_bits: u8,

    /// Oversampling factor for the re-ranked search (0 disables it)
    #[arg(long, default_value_t = 4)]
    oversample: usize,

    /// Anisotropic loss weight
    #[arg(long, default_value_t = 0.1)]
    lambda: f32,

    /// Interval refinement iterations
    #[arg(long, default_value_t = 5)]
    iters: usize,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Save the quantized corpus to this path
    #[arg(long)]
    save: Option<PathBuf>,
}

fn gaussian_vectors(rng: &mut fastrand::Rng, count: usize, dimension: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|_| {
            (0..dimension)
                .map(|_| {
                    // Box-Muller over two uniforms
                    let u1 = rng.f64().max(f64::MIN_POSITIVE);
                    let u2 = rng.f64();
                    ((-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()) as f32
                })
                .collect()
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let mut rng = fastrand::Rng::with_seed(args.seed);
    let corpus_vectors = gaussian_vectors(&mut rng, args.count, args.dimension);
    let query_vectors = gaussian_vectors(&mut rng, args.queries, args.dimension);

    let format = BinaryQuantizationFormat::new(FormatConfig {
        query_bits: args.query_bits,
        index_bits: 1,
        quantizer: QuantizerConfig {
            similarity_function: args.metric,
            lambda: args.lambda,
            iters: args.iters,
        },
    })?;

    let build_start = Instant::now();
    let corpus = format.quantize_vectors(&corpus_vectors)?;
    let build_time = build_start.elapsed();
    info!(
        count = corpus.size(),
        dimension = corpus.dimension(),
        ?build_time,
        "corpus quantized"
    );

    // Queries are independent; the engine scores each one single-threaded
    // and the caller fans them out.
    let search_start = Instant::now();
    let direct: Vec<_> = query_vectors
        .par_iter()
        .map(|query| format.search_nearest_neighbors(query, &corpus, args.k))
        .collect::<binquant::Result<Vec<_>>>()?;
    let search_time = search_start.elapsed();

    let oversampled = if args.oversample > 0 {
        Some(
            query_vectors
                .par_iter()
                .map(|query| {
                    format.search_with_oversampling(
                        query,
                        &corpus,
                        &corpus_vectors,
                        args.k,
                        args.oversample,
                    )
                })
                .collect::<binquant::Result<Vec<_>>>()?,
        )
    } else {
        None
    };

    let paired = args.queries.min(args.count);
    let accuracy = compute_accuracy(
        &format,
        &corpus_vectors[..paired],
        &query_vectors[..paired],
    )?;

    if let Some(path) = &args.save {
        persistence::save_to_file(path, &corpus, args.metric)?;
        info!(path = %path.display(), "corpus saved");
    }

    let summary = json!({
        "dimension": args.dimension,
        "count": args.count,
        "queries": args.queries,
        "metric": args.metric.to_string(),
        "query_bits": args.query_bits,
        "build_ms": build_time.as_secs_f64() * 1000.0,
        "search_ms": search_time.as_secs_f64() * 1000.0,
        "first_query_top_hits": direct.first().map(|results| {
            results.iter().take(3).map(|hit| {
                json!({ "ordinal": hit.ordinal, "score": hit.score })
            }).collect::<Vec<_>>()
        }),
        "oversampled_first_query_top_hit": oversampled
            .as_ref()
            .and_then(|all| all.first())
            .and_then(|results| results.first())
            .map(|hit| json!({ "ordinal": hit.ordinal, "score": hit.score })),
        "accuracy": {
            "mean_error": accuracy.mean_error,
            "max_error": accuracy.max_error,
            "correlation": accuracy.correlation,
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
