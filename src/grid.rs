//! Pixel grids handed to the embedders.
//!
//! A grid is either a single-channel grayscale buffer or an interleaved RGB
//! buffer. Grayscale is never expanded into three equal channels here; that
//! only happens, if at all, at the encoder.
use image::{ColorType, DynamicImage, GrayImage, RgbImage};

/// One channel of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel
{
    Gray,
    Red,
    Green,
    Blue,
}

impl Channel
{
    /// Offset of the channel inside an interleaved RGB pixel.
    ///
    /// `Gray` maps to the blue slot: in a grayscale pixel all three slots
    /// carry the same value, and the blue one is the one read back.
    const fn rgb_offset(self) -> usize
    {
        match self
        {
            Self::Red => 0,
            Self::Green => 1,
            Self::Gray | Self::Blue => 2,
        }
    }
}

/// An owned in-memory image, grayscale or colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelGrid
{
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl PixelGrid
{
    #[must_use]
    pub fn width(&self) -> u32
    {
        match self
        {
            Self::Gray(image) => image.width(),
            Self::Rgb(image) => image.width(),
        }
    }

    #[must_use]
    pub fn height(&self) -> u32
    {
        match self
        {
            Self::Gray(image) => image.height(),
            Self::Rgb(image) => image.height(),
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32)
    {
        (self.width(), self.height())
    }

    #[must_use]
    pub const fn is_grayscale(&self) -> bool
    {
        matches!(self, Self::Gray(_))
    }

    /// Number of channel samples per pixel.
    #[must_use]
    pub const fn channel_count(&self) -> usize
    {
        match self
        {
            Self::Gray(_) => 1,
            Self::Rgb(_) => 3,
        }
    }

    /// Logical channels of the grid.
    ///
    /// The order is the one the histogram-preserving embedder walks colour
    /// images in.
    #[must_use]
    pub const fn channels(&self) -> &'static [Channel]
    {
        match self
        {
            Self::Gray(_) => &[Channel::Gray],
            Self::Rgb(_) => &[Channel::Green, Channel::Blue, Channel::Red],
        }
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize
    {
        (self.width() as usize) * (self.height() as usize)
    }

    /// Total number of channel samples, pixels times channels.
    #[must_use]
    pub fn sample_count(&self) -> usize
    {
        self.pixel_count() * self.channel_count()
    }

    /// Every channel sample in raster order, interleaved for colour grids.
    #[must_use]
    pub fn samples(&self) -> &[u8]
    {
        match self
        {
            Self::Gray(image) => &**image,
            Self::Rgb(image) => &**image,
        }
    }

    /// Mutable access to every channel sample in raster order.
    pub fn samples_mut(&mut self) -> &mut [u8]
    {
        match self
        {
            Self::Gray(image) => &mut **image,
            Self::Rgb(image) => &mut **image,
        }
    }

    /// Copies one channel out into a contiguous buffer in raster order.
    #[must_use]
    pub fn plane(&self, channel: Channel) -> Vec<u8>
    {
        match self
        {
            Self::Gray(image) => image.as_raw().clone(),
            Self::Rgb(image) => image
                .pixels()
                .map(|pixel| pixel.0[channel.rgb_offset()])
                .collect(),
        }
    }

    /// Writes a buffer produced by [`PixelGrid::plane`] back into the grid.
    ///
    /// # Panics
    ///
    /// Panics if `plane` does not hold exactly one sample per pixel.
    pub fn store_plane(&mut self, channel: Channel, plane: &[u8])
    {
        assert_eq!(
            plane.len(),
            self.pixel_count(),
            "plane length must match the pixel count"
        );

        match self
        {
            Self::Gray(image) => image.copy_from_slice(plane),
            Self::Rgb(image) =>
            {
                let offset = channel.rgb_offset();
                for (pixel, &value) in image.pixels_mut().zip(plane)
                {
                    pixel.0[offset] = value;
                }
            },
        }
    }
}

impl From<DynamicImage> for PixelGrid
{
    /// Luma images stay single-channel; everything else is converted to 8-bit
    /// RGB and loses its alpha channel.
    fn from(image: DynamicImage) -> Self
    {
        match image.color()
        {
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 =>
            {
                Self::Gray(image.into_luma8())
            },
            _ => Self::Rgb(image.into_rgb8()),
        }
    }
}
