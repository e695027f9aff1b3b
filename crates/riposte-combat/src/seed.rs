//! Correlation seeds and the deterministic per-cue random stream.
//!
//! The side that decides to act picks a one-byte [`CorrelationSeed`]. It
//! identifies the action instance on the wire and, mixed with the cue index,
//! seeds a ChaCha8 stream from which every participant re-derives the same
//! secondary random values (sub-shot stagger, animation variant). Nothing
//! derived from the stream is ever transmitted.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// One-byte action correlation value.
pub type CorrelationSeed = u8;

/// Multiplier applied to the cue index when mixing it into the seed.
pub const CUE_SEED_STRIDE: u32 = 16;

/// Salt separating the animation-variant stream from shot streams.
const ANIMATION_STREAM_SALT: u64 = 0xA11A_0000;

/// Picks a fresh correlation seed from `rng`.
pub fn generate_seed<R: Rng + ?Sized>(rng: &mut R) -> CorrelationSeed {
    rng.random()
}

/// Picks a fresh correlation seed from the thread-local generator.
pub fn thread_seed() -> CorrelationSeed {
    generate_seed(&mut rand::rng())
}

/// Seed for one cue of one action: `seed + index * CUE_SEED_STRIDE`, wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplySeed(pub u32);

impl ApplySeed {
    /// Mixes `seed` with the zero-based cue `index`.
    pub fn for_cue(seed: CorrelationSeed, index: usize) -> Self {
        let index = index as u32;
        Self(u32::from(seed).wrapping_add(index.wrapping_mul(CUE_SEED_STRIDE)))
    }
}

/// Linear interpolation over `[-half, half]` with `t` in `[0, 1)`.
#[inline]
fn symmetric(half: f32, t: f32) -> f32 {
    -half + 2.0 * half * t
}

// ---------------------------------------------------------------------------
// ShotStream
// ---------------------------------------------------------------------------

/// Deterministic random stream for the sub-shots of one cue.
pub struct ShotStream {
    rng: ChaCha8Rng,
}

impl ShotStream {
    /// Creates the stream for `seed`. Identical seeds give identical streams
    /// on every platform.
    pub fn new(seed: ApplySeed) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(u64::from(seed.0)),
        }
    }

    /// Draws the next stagger vector within `±range` on x and y.
    pub fn next_stagger(&mut self, range: Vec2) -> Vec3 {
        let x = symmetric(range.x, self.rng.random::<f32>());
        let y = symmetric(range.y, self.rng.random::<f32>());
        Vec3::new(x, y, 0.0)
    }
}

/// All `spread + 1` stagger vectors for one cue.
pub fn staggers_for_cue(seed: ApplySeed, spread: u8, range: Vec2) -> Vec<Vec3> {
    let mut stream = ShotStream::new(seed);
    (0..=spread).map(|_| stream.next_stagger(range)).collect()
}

/// Deterministic animation variant in `0..variants` for an action seed.
pub fn animation_variant(seed: CorrelationSeed, variants: u32) -> u32 {
    if variants <= 1 {
        return 0;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(ANIMATION_STREAM_SALT | u64::from(seed));
    rng.random_range(0..variants)
}
