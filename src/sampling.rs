//! Simulated embedding key and message.
//!
//! No real message or key is embedded. Each channel sample gets an
//! independent selection draw standing in for the key stream, and each
//! selected sample gets a message-bit draw standing in for the encrypted
//! payload.
//!
//! All draws come from a single injected [`Rng`], so a seeded generator makes
//! every embedder reproducible.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Threshold below which a uniform draw becomes a `1` message bit or an
/// increment.
const COIN_THRESHOLD: f64 = 0.5;

/// Computes the requested embedding rate.
///
/// The result is not clamped: rates above one select every sample. A grid
/// without samples has rate zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn embedding_probability(message_len: u64, total_samples: usize) -> f64
{
    if total_samples == 0
    {
        return 0.0;
    }

    message_len as f64 / total_samples as f64
}

/// Builds the generator every embedder draws from.
///
/// A seed gives a reproducible run; without one the generator is seeded from
/// the thread-local generator.
#[must_use]
pub fn rng_from_seed(seed: Option<u64>) -> ChaCha20Rng
{
    seed.map_or_else(
        || ChaCha20Rng::from_rng(&mut rand::rng()),
        ChaCha20Rng::seed_from_u64,
    )
}

/// Draw source bound to one embedding rate.
#[derive(Debug)]
pub struct Sampler<R>
{
    rng: R,
    probability: f64,
}

impl<R: Rng> Sampler<R>
{
    pub const fn new(rng: R, probability: f64) -> Self
    {
        Self { rng, probability }
    }

    /// Selection draw: is the current sample picked by the key stream?
    pub fn select(&mut self) -> bool
    {
        self.rng.random::<f64>() <= self.probability
    }

    /// Message-bit draw, `0` or `1` with equal odds.
    pub fn message_bit(&mut self) -> u8
    {
        u8::from(self.rng.random::<f64>() <= COIN_THRESHOLD)
    }

    /// Direction draw for ±1 adjustments, `true` meaning increment.
    pub fn increment(&mut self) -> bool
    {
        self.rng.random::<f64>() <= COIN_THRESHOLD
    }
}
