//! Bit-level dot-product kernels
//!
//! Integer kernels between low-bit query codes and 1-bit index codes, in
//! single-target and batched forms. Lengths are validated; element ranges
//! are the caller's contract so the hot loops stay branch-free.

use crate::error::{BinquantError, Result};
use crate::quantization::packing::packed_len;

/// 1-bit x 1-bit dot product over unpacked {0,1} codes
#[inline]
pub fn int1_bit_dot_product(query: &[u8], target: &[u8]) -> Result<i32> {
    if query.len() != target.len() {
        return Err(BinquantError::DimensionMismatch {
            expected: query.len(),
            got: target.len(),
        });
    }
    Ok(query
        .iter()
        .zip(target)
        .map(|(&q, &t)| (q as i32) * (t as i32))
        .sum())
}

/// 4-bit x 1-bit dot product: transposed query bit-planes against an
/// unpacked 1-bit target, plane `p` weighted by `2^p`
#[inline]
pub fn int4_bit_dot_product(query_planes: &[u8], target: &[u8]) -> Result<i32> {
    let dimension = target.len();
    if query_planes.len() != 4 * dimension {
        return Err(BinquantError::DimensionMismatch {
            expected: 4 * dimension,
            got: query_planes.len(),
        });
    }
    let mut total = 0i32;
    for p in 0..4 {
        let plane = &query_planes[p * dimension..(p + 1) * dimension];
        let partial: i32 = plane
            .iter()
            .zip(target)
            .map(|(&q, &t)| (q as i32) * (t as i32))
            .sum();
        total += partial << p;
    }
    Ok(total)
}

/// Packed 1-bit x packed 1-bit dot product: AND the byte pair, popcount
/// the survivors. Equals [`int1_bit_dot_product`] on the unpacked codes
/// because trailing bits of the final byte are zero on both sides.
#[inline]
pub fn int1_bit_dot_product_packed(query: &[u8], target: &[u8]) -> Result<i32> {
    if query.len() != target.len() {
        return Err(BinquantError::DimensionMismatch {
            expected: query.len(),
            got: target.len(),
        });
    }
    Ok(query
        .iter()
        .zip(target)
        .map(|(&q, &t)| (q & t).count_ones() as i32)
        .sum())
}

/// Batched 1-bit dot products of one query against `count` unpacked
/// targets laid out contiguously at `targets[i * dimension + d]`.
///
/// Result index `i` corresponds to target `i`. The inner loop is unrolled
/// eight-wide over the main span with a scalar tail.
pub fn batch_int1_bit(
    query: &[u8],
    targets: &[u8],
    count: usize,
    dimension: usize,
) -> Result<Vec<i32>> {
    if query.len() != dimension {
        return Err(BinquantError::DimensionMismatch {
            expected: dimension,
            got: query.len(),
        });
    }
    if targets.len() != count * dimension {
        return Err(BinquantError::DimensionMismatch {
            expected: count * dimension,
            got: targets.len(),
        });
    }

    let main = dimension - dimension % 8;
    let mut results = vec![0i32; count];
    for (i, result) in results.iter_mut().enumerate() {
        let target = &targets[i * dimension..(i + 1) * dimension];
        let mut acc = 0i32;
        let mut d = 0;
        while d < main {
            acc += (query[d] as i32) * (target[d] as i32)
                + (query[d + 1] as i32) * (target[d + 1] as i32)
                + (query[d + 2] as i32) * (target[d + 2] as i32)
                + (query[d + 3] as i32) * (target[d + 3] as i32)
                + (query[d + 4] as i32) * (target[d + 4] as i32)
                + (query[d + 5] as i32) * (target[d + 5] as i32)
                + (query[d + 6] as i32) * (target[d + 6] as i32)
                + (query[d + 7] as i32) * (target[d + 7] as i32);
            d += 8;
        }
        for d in main..dimension {
            acc += (query[d] as i32) * (target[d] as i32);
        }
        *result = acc;
    }
    Ok(results)
}

/// Batched 4-bit dot products of one unpacked query against `count` packed
/// 1-bit targets laid out contiguously, `ceil(dimension / 8)` bytes each.
///
/// Each packed byte is decomposed MSB-first and weighted by the
/// corresponding query code; residual bits of a non-multiple-of-8
/// dimension are handled by the tail.
pub fn batch_int4_bit_packed(
    query: &[u8],
    packed_targets: &[u8],
    count: usize,
    dimension: usize,
) -> Result<Vec<i32>> {
    if query.len() != dimension {
        return Err(BinquantError::DimensionMismatch {
            expected: dimension,
            got: query.len(),
        });
    }
    let packed_dimension = packed_len(dimension);
    if packed_targets.len() != count * packed_dimension {
        return Err(BinquantError::DimensionMismatch {
            expected: count * packed_dimension,
            got: packed_targets.len(),
        });
    }

    let main_packed = dimension / 8;
    let mut results = vec![0i32; count];
    for (i, result) in results.iter_mut().enumerate() {
        let offset = i * packed_dimension;
        let mut acc = 0i32;
        for j in 0..main_packed {
            let byte = packed_targets[offset + j];
            let q = &query[j * 8..j * 8 + 8];
            acc += (q[0] as i32) * (((byte >> 7) & 1) as i32)
                + (q[1] as i32) * (((byte >> 6) & 1) as i32)
                + (q[2] as i32) * (((byte >> 5) & 1) as i32)
                + (q[3] as i32) * (((byte >> 4) & 1) as i32)
                + (q[4] as i32) * (((byte >> 3) & 1) as i32)
                + (q[5] as i32) * (((byte >> 2) & 1) as i32)
                + (q[6] as i32) * (((byte >> 1) & 1) as i32)
                + (q[7] as i32) * ((byte & 1) as i32);
        }
        let tail_start = main_packed * 8;
        if tail_start < dimension {
            let byte = packed_targets[offset + main_packed];
            for d in tail_start..dimension {
                acc += (query[d] as i32) * (((byte >> (7 - d % 8)) & 1) as i32);
            }
        }
        *result = acc;
    }
    Ok(results)
}
