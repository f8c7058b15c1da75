//! Named, seeded random streams.
//!
//! Every source of randomness in the model is identified by a type created with
//! [`define_rng!`]. A stream's seed is `base_seed + hash(name)`, so adding a new stream never
//! perturbs the values drawn from an existing one. Parallel passes use [`RngStreams`], which
//! holds one generator per worker; worker `i` always gets stream `i`, so a run is reproducible
//! for a fixed seed and thread count.
mod macros;

pub use macros::define_rng;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use xxhash_rust::xxh3::xxh3_64;

use crate::log::trace;

pub trait RngId: Copy + Clone {
    type RngType: SeedableRng;
    fn get_name() -> &'static str;
}

/// Stable across platforms and releases, unlike `DefaultHasher`.
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Creates the generator for stream `R`.
pub fn named_rng<R: RngId>(base_seed: u64) -> R::RngType {
    let seed = base_seed.wrapping_add(hash_str(R::get_name()));
    trace!("creating rng {} (seed={seed})", R::get_name());
    R::RngType::seed_from_u64(seed)
}

/// Length of each contiguous chunk when `len` items are split across `workers`. Never zero, so
/// it can be passed straight to `par_chunks`.
pub fn chunk_len(len: usize, workers: usize) -> usize {
    len.div_ceil(workers.max(1)).max(1)
}

/// One generator per worker for a single concern (creation, infection, ...).
#[derive(Debug, Clone)]
pub struct RngStreams {
    streams: Vec<SmallRng>,
}

impl RngStreams {
    pub fn new<R: RngId<RngType = SmallRng>>(base_seed: u64, workers: usize) -> Self {
        let offset = base_seed.wrapping_add(hash_str(R::get_name()));
        let streams = (0..workers.max(1) as u64)
            .map(|worker| SmallRng::seed_from_u64(offset.wrapping_add(worker)))
            .collect();
        RngStreams { streams }
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn get_mut(&mut self, worker: usize) -> Option<&mut SmallRng> {
        self.streams.get_mut(worker)
    }

    pub fn as_mut_slice(&mut self) -> &mut [SmallRng] {
        &mut self.streams
    }
}
