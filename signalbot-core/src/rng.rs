//! RNG construction for signal generation.
//!
//! Production draws come from an entropy-seeded `StdRng`, so consecutive runs
//! never share a sequence. Tests and replays use a fixed seed instead, which
//! makes instrument and direction picks reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// RNG type used by the engine unless a caller injects another.
pub type SignalRng = StdRng;

/// Unpredictable RNG seeded from the operating system.
pub fn from_entropy() -> SignalRng {
    StdRng::from_entropy()
}

/// Deterministic RNG for tests and replays.
pub fn seeded(seed: u64) -> SignalRng {
    StdRng::seed_from_u64(seed)
}
