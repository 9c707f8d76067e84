//! Fixed fan-out/fan-in over contiguous buffer chunks.
//!
//! The layer pipeline itself is strictly sequential; this helper exists for
//! bulk elementwise work on large buffers (normalization, dataset
//! preprocessing). It partitions a buffer into `chunks` contiguous
//! non-overlapping pieces, runs one closure per piece on the rayon pool,
//! and blocks until all pieces are done. No cancellation, no work stealing
//! across chunk boundaries.

use rayon::prelude::*;

use crate::{Error, Result};

fn chunk_len(len: usize, chunks: usize) -> Result<usize> {
    if chunks == 0 {
        return Err(Error::InvalidConfig(
            "chunk count must be > 0".to_owned(),
        ));
    }
    if chunks > len {
        return Err(Error::InvalidConfig(format!(
            "cannot split {len} values into {chunks} chunks"
        )));
    }
    Ok(len.div_ceil(chunks))
}

/// Apply `op` to each of `chunks` contiguous pieces of `data` in parallel.
pub fn for_each_chunk<F>(data: &mut [f32], chunks: usize, op: F) -> Result<()>
where
    F: Fn(&mut [f32]) + Sync + Send,
{
    let size = chunk_len(data.len(), chunks)?;
    data.par_chunks_mut(size).for_each(|chunk| op(chunk));
    Ok(())
}

/// Apply `op` to matching contiguous pieces of `dst` and `src` in parallel.
///
/// The slices must have equal length; pieces are aligned pairwise.
pub fn for_each_chunk_pair<F>(dst: &mut [f32], src: &[f32], chunks: usize, op: F) -> Result<()>
where
    F: Fn(&mut [f32], &[f32]) + Sync + Send,
{
    if dst.len() != src.len() {
        return Err(Error::DimensionMismatch(format!(
            "chunked pair: {} vs {} values",
            dst.len(),
            src.len()
        )));
    }
    let size = chunk_len(dst.len(), chunks)?;
    dst.par_chunks_mut(size)
        .zip(src.par_chunks(size))
        .for_each(|(d, s)| op(d, s));
    Ok(())
}
