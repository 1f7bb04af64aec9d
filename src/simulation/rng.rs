//! Per-worker random sources
//!
//! Every worker constructs its own generator; nothing is shared or global.
//! Unseeded generators draw their key from OS entropy, and failing to get
//! entropy is a host fault that panics inside `from_entropy`.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Random source owned by exactly one worker
pub type WorkerRng = ChaCha20Rng;

/// Build the generator for worker number `worker`
///
/// With a seed, workers share the key but each reads its own ChaCha stream,
/// so their draws never overlap.
pub fn worker_rng(seed: Option<u64>, worker: usize) -> WorkerRng {
    match seed {
        Some(seed) => {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            rng.set_stream(worker as u64);
            rng
        }
        None => ChaCha20Rng::from_entropy(),
    }
}
