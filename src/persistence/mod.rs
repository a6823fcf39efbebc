//! On-disk layout for binarized corpora
//!
//! A corpus file is a `u32` little-endian length prefix, a fixed-int
//! little-endian metadata record, then one record per vector: the packed
//! 1-bit codes followed by the four corrective scalars as `f32` LE. All
//! integer widths are fixed for a given file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::BinarizedValues;
use crate::error::{BinquantError, Result};
use crate::models::{CorrectiveTerms, SimilarityFunction};
use crate::quantization::packing::{packed_len, unpack_binary};

/// Bytes of corrective terms per vector record: four f32 values
const CORRECTION_BYTES: usize = 16;

/// Encoding ordinal of the packed 1-bit layout, the only one written
const ENCODING_PACKED_BINARY: u32 = 0;

fn codec_config() -> impl bincode::config::Config {
    bincode::config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
}

/// File-level metadata record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusMetadata {
    /// Field identifier for container formats; 0 in standalone files
    pub field_number: i32,
    /// Vector encoding ordinal
    pub vector_encoding: u32,
    /// Similarity function ordinal
    pub similarity: u32,
    /// Vector dimensionality
    pub dimension: u32,
    /// Offset of the first vector record from the start of the file
    pub vector_data_offset: u64,
    /// Total bytes of vector records
    pub vector_data_length: u64,
    /// Number of vector records
    pub vector_count: u32,
    /// Build centroid
    pub centroid: Vec<f32>,
    /// Centroid self-dot
    pub centroid_dp: f32,
}

/// Write a corpus and its similarity function into `writer`
pub fn write_corpus<W: Write>(
    writer: &mut W,
    corpus: &BinarizedValues,
    similarity: SimilarityFunction,
) -> Result<()> {
    let dimension = corpus.dimension();
    let width = packed_len(dimension);
    let record_len = width + CORRECTION_BYTES;

    let mut metadata = CorpusMetadata {
        field_number: 0,
        vector_encoding: ENCODING_PACKED_BINARY,
        similarity: similarity.ordinal(),
        dimension: dimension as u32,
        vector_data_offset: 0,
        vector_data_length: (corpus.size() * record_len) as u64,
        vector_count: corpus.size() as u32,
        centroid: corpus.centroid().to_vec(),
        centroid_dp: corpus.centroid_dp(None),
    };
    // Fixed-int encoding keeps the metadata length independent of the
    // offset value, so a dry encode sizes the header.
    let sizing = bincode::serde::encode_to_vec(&metadata, codec_config())?;
    metadata.vector_data_offset = (4 + sizing.len()) as u64;
    let encoded = bincode::serde::encode_to_vec(&metadata, codec_config())?;

    writer.write_all(&(encoded.len() as u32).to_le_bytes())?;
    writer.write_all(&encoded)?;

    for ordinal in 0..corpus.size() {
        writer.write_all(corpus.vector_value(ordinal)?)?;
        let terms = corpus.corrective_terms(ordinal)?;
        writer.write_all(&terms.lower_interval.to_le_bytes())?;
        writer.write_all(&terms.upper_interval.to_le_bytes())?;
        writer.write_all(&terms.additional_correction.to_le_bytes())?;
        writer.write_all(&(terms.quantized_component_sum as f32).to_le_bytes())?;
    }
    debug!(
        count = corpus.size(),
        dimension,
        bytes = metadata.vector_data_offset + metadata.vector_data_length,
        "corpus written"
    );
    Ok(())
}

/// Read a corpus written by [`write_corpus`]
pub fn read_corpus<R: Read>(reader: &mut R) -> Result<(BinarizedValues, SimilarityFunction)> {
    let mut length_bytes = [0u8; 4];
    reader.read_exact(&mut length_bytes)?;
    let header_len = u32::from_le_bytes(length_bytes) as usize;

    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let (metadata, consumed): (CorpusMetadata, usize) =
        bincode::serde::decode_from_slice(&header, codec_config())?;
    if consumed != header_len {
        return Err(BinquantError::Persistence(format!(
            "metadata record consumed {consumed} of {header_len} header bytes"
        )));
    }
    if metadata.vector_encoding != ENCODING_PACKED_BINARY {
        return Err(BinquantError::Persistence(format!(
            "unsupported vector encoding {}",
            metadata.vector_encoding
        )));
    }
    let similarity = SimilarityFunction::from_ordinal(metadata.similarity)?;
    let dimension = metadata.dimension as usize;
    if metadata.centroid.len() != dimension {
        return Err(BinquantError::Persistence(format!(
            "centroid length {} disagrees with dimension {dimension}",
            metadata.centroid.len()
        )));
    }
    let count = metadata.vector_count as usize;
    let width = packed_len(dimension);
    if metadata.vector_data_length != (count * (width + CORRECTION_BYTES)) as u64 {
        return Err(BinquantError::Persistence(format!(
            "vector data length {} disagrees with {count} records",
            metadata.vector_data_length
        )));
    }

    let mut packed = vec![0u8; count * width];
    let mut unpacked = vec![0u8; count * dimension];
    let mut corrections = Vec::with_capacity(count);
    for i in 0..count {
        let record = &mut packed[i * width..(i + 1) * width];
        reader.read_exact(record)?;
        unpack_binary(record, &mut unpacked[i * dimension..(i + 1) * dimension])?;
        corrections.push(CorrectiveTerms {
            lower_interval: read_f32(reader)?,
            upper_interval: read_f32(reader)?,
            additional_correction: read_f32(reader)?,
            quantized_component_sum: read_f32(reader)? as u32,
        });
    }

    let corpus = BinarizedValues::new(packed, unpacked, corrections, metadata.centroid, dimension)?;
    Ok((corpus, similarity))
}

/// Write a corpus to a file path
pub fn save_to_file<P: AsRef<Path>>(
    path: P,
    corpus: &BinarizedValues,
    similarity: SimilarityFunction,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_corpus(&mut writer, corpus, similarity)?;
    writer.flush()?;
    Ok(())
}

/// Read a corpus from a file path
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<(BinarizedValues, SimilarityFunction)> {
    let mut reader = BufReader::new(File::open(path)?);
    read_corpus(&mut reader)
}

fn read_f32<R: Read>(reader: &mut R) -> Result<f32> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(f32::from_le_bytes(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{BinaryQuantizationFormat, FormatConfig};

    fn sample_corpus() -> BinarizedValues {
        let format = BinaryQuantizationFormat::new(FormatConfig::default()).unwrap();
        let mut rng = fastrand::Rng::with_seed(11);
        let vectors: Vec<Vec<f32>> = (0..20)
            .map(|_| (0..33).map(|_| rng.f32() * 2.0 - 1.0).collect())
            .collect();
        format.quantize_vectors(&vectors).unwrap()
    }

    #[test]
    fn test_round_trip_preserves_corpus() {
        let corpus = sample_corpus();
        let mut buffer = Vec::new();
        write_corpus(&mut buffer, &corpus, SimilarityFunction::Cosine).unwrap();

        let (restored, similarity) = read_corpus(&mut buffer.as_slice()).unwrap();
        assert_eq!(similarity, SimilarityFunction::Cosine);
        assert_eq!(restored.size(), corpus.size());
        assert_eq!(restored.dimension(), corpus.dimension());
        assert_eq!(restored.centroid(), corpus.centroid());
        for ordinal in 0..corpus.size() {
            assert_eq!(
                restored.vector_value(ordinal).unwrap(),
                corpus.vector_value(ordinal).unwrap()
            );
            assert_eq!(
                restored.unpacked_vector(ordinal).unwrap(),
                corpus.unpacked_vector(ordinal).unwrap()
            );
            assert_eq!(
                restored.corrective_terms(ordinal).unwrap(),
                corpus.corrective_terms(ordinal).unwrap()
            );
        }
    }

    #[test]
    fn test_metadata_offset_points_at_first_record() {
        let corpus = sample_corpus();
        let mut buffer = Vec::new();
        write_corpus(&mut buffer, &corpus, SimilarityFunction::Euclidean).unwrap();

        let header_len = u32::from_le_bytes(buffer[0..4].try_into().unwrap()) as usize;
        let (metadata, _): (CorpusMetadata, usize) =
            bincode::serde::decode_from_slice(&buffer[4..4 + header_len], codec_config()).unwrap();

        assert_eq!(metadata.vector_data_offset as usize, 4 + header_len);
        assert_eq!(
            buffer.len(),
            metadata.vector_data_offset as usize + metadata.vector_data_length as usize
        );
        let width = packed_len(corpus.dimension());
        assert_eq!(
            &buffer[metadata.vector_data_offset as usize
                ..metadata.vector_data_offset as usize + width],
            corpus.vector_value(0).unwrap()
        );
    }

    #[test]
    fn test_truncated_file_fails() {
        let corpus = sample_corpus();
        let mut buffer = Vec::new();
        write_corpus(&mut buffer, &corpus, SimilarityFunction::Cosine).unwrap();
        buffer.truncate(buffer.len() - 3);
        assert!(read_corpus(&mut buffer.as_slice()).is_err());
    }

    #[test]
    fn test_unknown_similarity_ordinal_fails() {
        let corpus = sample_corpus();
        let mut buffer = Vec::new();
        write_corpus(&mut buffer, &corpus, SimilarityFunction::Cosine).unwrap();

        // corrupt the similarity ordinal in place: field_number(4) +
        // vector_encoding(4) put it at header offset 8
        buffer[4 + 8] = 9;
        assert!(read_corpus(&mut buffer.as_slice()).is_err());
    }
}
