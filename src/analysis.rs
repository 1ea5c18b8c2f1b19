//! Evaluation helpers: per-channel histograms and cover/stego distortion.
//!
//! None of this is used to decide what gets embedded, apart from
//! [`Histogram`] which the histogram-preserving embedder also uses for its
//! bookkeeping.
use std::ops::{Index, IndexMut};

use thiserror::Error;

use crate::grid::{Channel, PixelGrid};

/// Number of distinct 8-bit sample values.
pub const VALUE_COUNT: usize = 256;
/// Number of `{2k, 2k+1}` bins in an 8-bit channel.
pub const BIN_COUNT: usize = VALUE_COUNT / 2;

/// Errors that can be emitted while comparing grids
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError
{
    /// The grids do not have the same width and height
    #[error(
        "cover is {cover_width}x{cover_height} but stego is \
         {stego_width}x{stego_height}"
    )]
    DimensionMismatch
    {
        cover_width: u32,
        cover_height: u32,
        stego_width: u32,
        stego_height: u32,
    },

    /// One grid is grayscale and the other is colour
    #[error("cover and stego do not have the same number of channels")]
    LayoutMismatch,
}

/// Occurrence count of every value `0..=255` over one channel.
#[derive(Clone, PartialEq, Eq)]
pub struct Histogram([u64; VALUE_COUNT]);

impl Histogram
{
    /// Counts the values of a channel plane.
    #[must_use]
    pub fn from_samples(samples: &[u8]) -> Self
    {
        let mut histogram = Self::default();
        for &value in samples
        {
            histogram[value] += 1;
        }
        histogram
    }

    /// Sum of all counts, equal to the number of samples counted.
    #[must_use]
    pub fn total(&self) -> u64
    {
        self.0.iter().sum()
    }

    /// Counts of the even and odd member of bin `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k` is not below [`BIN_COUNT`].
    #[must_use]
    pub fn bin(&self, k: usize) -> (u64, u64)
    {
        (self.0[2 * k], self.0[2 * k + 1])
    }
}

impl Default for Histogram
{
    fn default() -> Self
    {
        Self([0; VALUE_COUNT])
    }
}

impl Index<u8> for Histogram
{
    type Output = u64;

    fn index(&self, value: u8) -> &Self::Output
    {
        &self.0[usize::from(value)]
    }
}

impl IndexMut<u8> for Histogram
{
    fn index_mut(&mut self, value: u8) -> &mut Self::Output
    {
        &mut self.0[usize::from(value)]
    }
}

// Only the occupied values, 256 zeros are unreadable
impl std::fmt::Debug for Histogram
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_map()
            .entries(
                self.0
                    .iter()
                    .enumerate()
                    .filter(|(_, count)| **count > 0),
            )
            .finish()
    }
}

/// Extracts the histogram of one channel of a grid.
#[must_use]
pub fn histogram(grid: &PixelGrid, channel: Channel) -> Histogram
{
    match grid
    {
        PixelGrid::Gray(_) => Histogram::from_samples(grid.samples()),
        PixelGrid::Rgb(_) => Histogram::from_samples(&grid.plane(channel)),
    }
}

/// Sum of squared differences between two grids.
///
/// Samples are compared pixel by pixel in raster order, blue then green then
/// red for colour grids. The total is not divided by anything.
///
/// # Errors
///
/// Returns [`AnalysisError::DimensionMismatch`] when the grids differ in size
/// and [`AnalysisError::LayoutMismatch`] when only one of them is grayscale.
pub fn distortion(
    cover: &PixelGrid,
    stego: &PixelGrid,
) -> Result<u64, AnalysisError>
{
    if cover.dimensions() != stego.dimensions()
    {
        return Err(AnalysisError::DimensionMismatch {
            cover_width: cover.width(),
            cover_height: cover.height(),
            stego_width: stego.width(),
            stego_height: stego.height(),
        });
    }

    if cover.is_grayscale() != stego.is_grayscale()
    {
        return Err(AnalysisError::LayoutMismatch);
    }

    let channels = cover.channel_count();
    let total = cover
        .samples()
        .chunks_exact(channels)
        .zip(stego.samples().chunks_exact(channels))
        .flat_map(|(cover_pixel, stego_pixel)| {
            // blue, green, red
            cover_pixel.iter().rev().zip(stego_pixel.iter().rev())
        })
        .map(|(&before, &after)| {
            let delta = u64::from(before.abs_diff(after));
            delta * delta
        })
        .sum();

    Ok(total)
}
