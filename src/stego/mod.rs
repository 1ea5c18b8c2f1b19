//! Simulated embedding for the baseline LSB steganography methods.
//!
//! Every method mutates a [`PixelGrid`] in place using draws from a single
//! [`Rng`]. The message and the key are not real: a sample carries a message
//! bit whenever its selection draw falls under the embedding rate, and the
//! bit itself is a fair coin. The result has the statistical artifacts of the
//! real method, which is all a steganalysis experiment needs.
//!
//! # Methods
//!
//! - [`Method::Lsb`]: plain least significant bit replacement
//! - [`Method::LsbPlus`]: LSB+, replacement that restores the cover histogram
//! - [`Method::LsbPlusPlus`]: LSB++, LSB+ with majority locking
//! - [`Method::Matching`]: LSB matching, ±1 on parity mismatch
//! - [`Method::MatchingRevisited`]: two bits per sample pair, at most one ±1
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

use rand::Rng;
use tracing::{debug, info};

use crate::grid::PixelGrid;
use crate::sampling::{Sampler, embedding_probability};

mod lsb;
mod matching;
mod preserving;
mod revisited;

pub use preserving::{HistogramEngine, Locking, embed_plane};

/// An embedding method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method
{
    Lsb,
    LsbPlus,
    LsbPlusPlus,
    Matching,
    MatchingRevisited,
}

impl Method
{
    pub const ALL: [Self; 5] = [
        Self::Lsb,
        Self::LsbPlus,
        Self::LsbPlusPlus,
        Self::Matching,
        Self::MatchingRevisited,
    ];

    /// Short name used on the command line and in output file names.
    #[must_use]
    pub const fn tag(self) -> &'static str
    {
        match self
        {
            Self::Lsb => "LSB",
            Self::LsbPlus => "LSBP",
            Self::LsbPlusPlus => "LSBPP",
            Self::Matching => "LSBM",
            Self::MatchingRevisited => "LSBMR",
        }
    }

    /// Whether the method leaves every channel histogram unchanged.
    #[must_use]
    pub const fn preserves_histogram(self) -> bool
    {
        matches!(self, Self::LsbPlus | Self::LsbPlusPlus)
    }
}

impl fmt::Display for Method
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.tag())
    }
}

/// The method name is not one of the known tags
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown method {0:?}, expected one of LSB, LSBP, LSBPP, LSBM, LSBMR")]
pub struct UnknownMethod(pub Box<str>);

impl FromStr for Method
{
    type Err = UnknownMethod;

    /// Parses a tag, ignoring case and surrounding whitespace.
    fn from_str(name: &str) -> Result<Self, Self::Err>
    {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|method| method.tag().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownMethod(name.into()))
    }
}

/// Counters collected while embedding.
///
/// Reports of several channels add up with `+=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbedReport
{
    /// Channel samples scanned
    pub samples: usize,
    /// Samples (sample pairs, for matching revisited) that took message bits
    pub selected: usize,
    /// Samples whose value differs after embedding
    pub changed: usize,
    /// Selected samples that could not take a bit and pushed the attempt to
    /// the next sample
    pub rejected: usize,
    /// Samples excluded up front by majority locking
    pub locked: usize,
    /// Samples flipped back to restore the cover histogram
    pub restored: usize,
}

impl EmbedReport
{
    /// Fraction of the scanned samples that were selected.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn realized_rate(&self) -> f64
    {
        if self.samples == 0
        {
            return 0.0;
        }
        self.selected as f64 / self.samples as f64
    }
}

impl AddAssign for EmbedReport
{
    fn add_assign(&mut self, other: Self)
    {
        self.samples += other.samples;
        self.selected += other.selected;
        self.changed += other.changed;
        self.rejected += other.rejected;
        self.locked += other.locked;
        self.restored += other.restored;
    }
}

/// Simulates embedding a message of `message_len` bits into `grid`.
///
/// The embedding rate is `message_len` over the grid's channel sample count;
/// a length of zero leaves the grid untouched.
pub fn embed<R: Rng>(
    grid: &mut PixelGrid,
    method: Method,
    message_len: u64,
    rng: &mut R,
) -> EmbedReport
{
    let probability = embedding_probability(message_len, grid.sample_count());
    debug!(
        %method,
        message_len,
        probability,
        samples = grid.sample_count(),
        "embedding"
    );

    let mut sampler = Sampler::new(rng, probability);
    let report = match method
    {
        Method::Lsb => lsb::embed(grid.samples_mut(), &mut sampler),
        Method::Matching => matching::embed(grid.samples_mut(), &mut sampler),
        Method::MatchingRevisited =>
        {
            let width = grid.width() as usize;
            let channels = grid.channel_count();
            revisited::embed(grid.samples_mut(), width, channels, &mut sampler)
        },
        Method::LsbPlus =>
        {
            preserving::embed(grid, Locking::Disabled, &mut sampler)
        },
        Method::LsbPlusPlus =>
        {
            preserving::embed(grid, Locking::Majority, &mut sampler)
        },
    };

    info!(
        %method,
        selected = report.selected,
        changed = report.changed,
        rejected = report.rejected,
        locked = report.locked,
        restored = report.restored,
        realized_rate = report.realized_rate(),
        "embedding finished"
    );

    report
}

/// Least significant bit of a sample.
const fn parity(value: u8) -> u8
{
    value & 1
}

/// `value` with its least significant bit replaced by `bit`.
const fn with_parity(value: u8, bit: u8) -> u8
{
    (value & !1) | (bit & 1)
}

/// Moves `value` one step towards the requested direction.
///
/// The extremes only move inwards, whatever was requested.
const fn step(value: u8, increment: bool) -> u8
{
    match value
    {
        0 => 1,
        u8::MAX => u8::MAX - 1,
        _ if increment => value + 1,
        _ => value - 1,
    }
}
