//! LSB+ and LSB++: LSB replacement that leaves the histogram untouched.
//!
//! Each channel plane goes through the same phases:
//!
//! 1. count the cover histogram, before anything is written
//! 2. (LSB++ only) lock enough samples of the more frequent value of every
//!    `{2k, 2k+1}` bin that both values have the same unlocked population
//! 3. mark a bin available while both of its values occur in the cover
//! 4. embed in raster order; a selected sample that is locked or sits in an
//!    unavailable bin is skipped and the selection carries over to the next
//!    sample; a bin closes once the writes producing one of its values reach
//!    that value's cover count
//! 5. recount, then flip untouched samples inside their bin until every count
//!    is back to the cover count
//!
//! Samples written in phase 4 are never touched by phase 5, so every embedded
//! bit survives.
use rand::Rng;
use tracing::{debug, error, warn};

use super::{EmbedReport, with_parity};
use crate::analysis::{BIN_COUNT, Histogram, VALUE_COUNT};
use crate::grid::PixelGrid;
use crate::sampling::Sampler;

/// Whether samples are locked before embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locking
{
    /// LSB+
    Disabled,
    /// LSB++: lock the surplus of every bin's majority value
    Majority,
}

/// Bin of a sample value.
const fn bin_of(value: u8) -> usize
{
    (value >> 1) as usize
}

/// Histogram-preserving embedding state for one channel plane.
///
/// The phases are separate steps so that they can be inspected; use
/// [`embed_plane`] to run all of them.
#[derive(Debug)]
pub struct HistogramEngine<'plane>
{
    plane: &'plane mut [u8],
    /// Histogram of the plane before embedding
    cover: Histogram,
    /// Writes producing each value during the main pass
    embedded: Histogram,
    available: [bool; BIN_COUNT],
    locked: Vec<bool>,
    used: Vec<bool>,
    report: EmbedReport,
}

impl<'plane> HistogramEngine<'plane>
{
    /// Counts the cover histogram and opens every bin whose two values both
    /// occur.
    pub fn new(plane: &'plane mut [u8]) -> Self
    {
        let cover = Histogram::from_samples(&*plane);

        let mut available = [false; BIN_COUNT];
        for (k, open) in available.iter_mut().enumerate()
        {
            let (even, odd) = cover.bin(k);
            *open = even > 0 && odd > 0;
        }

        if !plane.is_empty() && !available.contains(&true)
        {
            warn!("no bin holds both of its values, nothing can be embedded");
        }

        let len = plane.len();
        Self {
            plane,
            cover,
            embedded: Histogram::default(),
            available,
            locked: vec![false; len],
            used: vec![false; len],
            report: EmbedReport {
                samples: len,
                ..EmbedReport::default()
            },
        }
    }

    /// Locks the first `|count[2k] - count[2k+1]|` samples, in raster order,
    /// holding the majority value of bin `k`.
    pub fn lock_majority(&mut self)
    {
        let mut surplus = [0u64; VALUE_COUNT];
        for k in 0..BIN_COUNT
        {
            let (even, odd) = self.cover.bin(k);
            if even > odd
            {
                surplus[2 * k] = even - odd;
            }
            else
            {
                surplus[2 * k + 1] = odd - even;
            }
        }

        for (&value, locked) in self.plane.iter().zip(self.locked.iter_mut())
        {
            let remaining = &mut surplus[usize::from(value)];
            if *remaining > 0
            {
                *remaining -= 1;
                *locked = true;
                self.report.locked += 1;
            }
        }

        debug!(locked = self.report.locked, "locked majority samples");
    }

    /// Main pass: replaces the parity of selected usable samples.
    pub fn embed<R: Rng>(&mut self, sampler: &mut Sampler<R>)
    {
        let mut pending_retry = false;

        for (index, sample) in self.plane.iter_mut().enumerate()
        {
            // the selection draw happens even when a retry is pending
            let drawn = sampler.select();
            if !drawn && !pending_retry
            {
                continue;
            }

            let bin = bin_of(*sample);
            if self.locked[index] || !self.available[bin]
            {
                pending_retry = true;
                self.report.rejected += 1;
                continue;
            }

            pending_retry = false;
            let embedded = with_parity(*sample, sampler.message_bit());
            if embedded != *sample
            {
                *sample = embedded;
                self.report.changed += 1;
            }

            self.used[index] = true;
            self.report.selected += 1;
            self.embedded[embedded] += 1;
            if self.embedded[embedded] == self.cover[embedded]
            {
                self.available[bin] = false;
            }
        }

        debug!(
            selected = self.report.selected,
            rejected = self.report.rejected,
            "main pass finished"
        );
    }

    /// Flips untouched samples until the plane's histogram equals the cover
    /// histogram again.
    pub fn restore(&mut self)
    {
        let mut stego = Histogram::from_samples(&*self.plane);

        for (sample, &used) in self.plane.iter_mut().zip(&self.used)
        {
            if used
            {
                continue;
            }

            let even = *sample & !1;
            let odd = even | 1;
            let (from, to) = if *sample == odd
            {
                (odd, even)
            }
            else
            {
                (even, odd)
            };

            if stego[from] > self.cover[from]
            {
                *sample = to;
                stego[from] -= 1;
                stego[to] += 1;
                self.report.restored += 1;
                self.report.changed += 1;
            }
        }

        if stego != self.cover
        {
            error!(
                ?stego,
                cover = ?self.cover,
                "restoration did not reach the cover histogram"
            );
        }
        debug_assert_eq!(stego, self.cover);
        debug!(restored = self.report.restored, "histogram restored");
    }

    #[must_use]
    pub const fn cover(&self) -> &Histogram
    {
        &self.cover
    }

    /// Whether bin `k`, values `2k` and `2k + 1`, still accepts writes.
    #[must_use]
    pub fn is_available(&self, k: usize) -> bool
    {
        self.available[k]
    }

    #[must_use]
    pub fn is_locked(&self, index: usize) -> bool
    {
        self.locked[index]
    }

    /// Whether the sample at `index` took a message bit.
    #[must_use]
    pub fn is_used(&self, index: usize) -> bool
    {
        self.used[index]
    }

    #[must_use]
    pub const fn report(&self) -> EmbedReport
    {
        self.report
    }
}

/// Runs every phase over one channel plane.
pub fn embed_plane<R: Rng>(
    plane: &mut [u8],
    locking: Locking,
    sampler: &mut Sampler<R>,
) -> EmbedReport
{
    let mut engine = HistogramEngine::new(plane);
    if locking == Locking::Majority
    {
        engine.lock_majority();
    }
    engine.embed(sampler);
    engine.restore();
    engine.report()
}

/// Runs every phase over each channel of the grid in turn.
pub(super) fn embed<R: Rng>(
    grid: &mut PixelGrid,
    locking: Locking,
    sampler: &mut Sampler<R>,
) -> EmbedReport
{
    let mut report = EmbedReport::default();
    for &channel in grid.channels()
    {
        let mut plane = grid.plane(channel);
        let channel_report = embed_plane(&mut plane, locking, sampler);
        debug!(?channel, ?channel_report, "channel embedded");
        report += channel_report;
        grid.store_plane(channel, &plane);
    }
    report
}
