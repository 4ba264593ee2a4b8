//! Deterministic random sources for replayable sessions.
//!
//! A session seed plus a context label (say, `"check:mira:lockpicking"`)
//! always yields the same generator, on every platform, so a logged
//! session can be replayed roll for roll.

use rand::SeedableRng;
use rand::rngs::StdRng;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Fold a context label into a stable 64-bit value.
///
/// FNV-1a, spelled out rather than pulled from a hasher crate, because
/// the output must never change across releases or platforms.
fn fold_context(context: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in context.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derive a generator from a session seed and a context label.
///
/// Distinct labels under one seed give independent streams; the same
/// pair always gives the same stream.
pub fn rng_for(seed: u64, context: &str) -> StdRng {
    StdRng::seed_from_u64(seed ^ fold_context(context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn draw(rng: &mut StdRng, n: usize) -> Vec<u32> {
        (0..n).map(|_| rng.random_range(1..=10)).collect()
    }

    #[test]
    fn same_seed_and_context_reproduce_the_stream() {
        let a = draw(&mut rng_for(42, "check:mira:lockpicking"), 20);
        let b = draw(&mut rng_for(42, "check:mira:lockpicking"), 20);
        assert_eq!(a, b);
    }

    #[test]
    fn different_contexts_diverge() {
        let a = draw(&mut rng_for(42, "check:mira:lockpicking"), 20);
        let b = draw(&mut rng_for(42, "check:mira:stealth"), 20);
        assert_ne!(a, b);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = draw(&mut rng_for(42, "check:mira:lockpicking"), 20);
        let b = draw(&mut rng_for(43, "check:mira:lockpicking"), 20);
        assert_ne!(a, b);
    }

    #[test]
    fn context_fold_is_stable() {
        // Pinned so replay files recorded by older builds keep working.
        assert_eq!(fold_context(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fold_context("a"), 0xaf63_dc4c_8601_ec8c);
    }
}
