//! Parallel sampling over rayon workers.
//!
//! Samples are independent, so the work splits into fixed-size chunks. Chunk `i`
//! draws from `ChaCha8Rng::seed_from_u64(seed)` on stream `i`: the streams do not
//! overlap, and the output depends only on `(seed, chunk_size)`, never on how many
//! threads rayon happens to use.

use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::sampler::{Geometric, SampleError};

/// RNG for chunk `stream` of a seeded run.
pub fn chunk_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Draw `n` outcomes in parallel, returned in chunk order.
///
/// # Panics
///
/// Panics if `chunk_size == 0`.
pub fn sample_parallel(
    sampler: &Geometric,
    n: usize,
    seed: u64,
    chunk_size: usize,
) -> Result<Vec<u64>, SampleError> {
    assert!(chunk_size > 0, "sample_parallel: chunk_size must be > 0");

    let n_chunks = n.div_ceil(chunk_size);
    debug!("sampling {n} outcomes in {n_chunks} chunks of <= {chunk_size}");

    let chunks: Vec<Vec<u64>> = (0..n_chunks)
        .into_par_iter()
        .map(|i| -> Result<Vec<u64>, SampleError> {
            let start = i * chunk_size;
            let len = chunk_size.min(n - start);
            let mut rng = chunk_rng(seed, i as u64);
            sampler.sample_iter(&mut rng).take(len).collect()
        })
        .collect::<Result<_, SampleError>>()?;

    Ok(chunks.concat())
}
