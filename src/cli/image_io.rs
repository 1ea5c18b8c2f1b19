//! CLI image helpers.
//!
//! Normalizes extensions, names stego outputs, and reads and writes the BMP
//! files the embedders work on.
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::{
    DynamicImage, ExtendedColorType, GrayImage, ImageFormat, ImageReader, Luma,
    RgbImage,
};

use super::AppError;
use crate::grid::PixelGrid;
use crate::stego::Method;

/// Extension of both cover and stego images.
pub(super) const BMP_EXTENSION: &str = "bmp";

/// Size of the file header in front of the DIB header.
const FILE_HEADER_LEN: usize = 14;
/// DIB header size of the old OS/2 `BITMAPCOREHEADER`.
const CORE_HEADER_LEN: u32 = 12;

/// Normalizes the extension of a path to lowercase.
///
/// # Example
///
/// ```ignore
/// let ext = normalized_extension(Path::new("image.BMP"));
///
/// assert_eq!(ext, Some("bmp".into()));
/// ```
pub(super) fn normalized_extension(path: impl AsRef<Path>) -> Option<String>
{
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Path of the stego image for a cover: `<cover>.<METHOD>.bmp`, next to the
/// cover.
pub(super) fn stego_path(cover: impl AsRef<Path>, method: Method) -> PathBuf
{
    let mut path = cover.as_ref().as_os_str().to_owned();
    path.push(".");
    path.push(method.tag());
    path.push(".");
    path.push(BMP_EXTENSION);
    PathBuf::from(path)
}

/// Loads a BMP image from the specified path.
///
/// The format is sniffed from the content. Palette images whose colours are
/// all gray come back as grayscale grids; everything else is RGB.
///
/// # Errors
///
/// Returns:
/// * [`AppError::Read`] when the file cannot be read
/// * [`AppError::UnsupportedFormat`] when the content is another image format
/// * [`AppError::ImageOpen`] when the image cannot be decoded
pub(super) fn load_bmp(path: impl AsRef<Path>) -> Result<PixelGrid, AppError>
{
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| AppError::Read {
        path: path.into(),
        source,
    })?;

    let reader = ImageReader::with_format(Cursor::new(&bytes), ImageFormat::Bmp)
        .with_guessed_format()
        .map_err(|source| AppError::Read {
            path: path.into(),
            source,
        })?;
    if reader.format() != Some(ImageFormat::Bmp)
    {
        return Err(AppError::UnsupportedFormat { path: path.into() });
    }

    let image = reader.decode().map_err(|source| AppError::ImageOpen {
        path: path.into(),
        source,
    })?;

    let grid = match image
    {
        DynamicImage::ImageRgb8(rgb) if is_gray_palette(&bytes, &rgb) =>
        {
            // all three slots are equal, any one of them is the gray value
            let (width, height) = rgb.dimensions();
            PixelGrid::Gray(GrayImage::from_fn(width, height, |x, y| {
                Luma([rgb.get_pixel(x, y).0[0]])
            }))
        },
        other => PixelGrid::from(other),
    };

    Ok(grid)
}

/// Whether a decoded BMP came from a palette of grays.
///
/// The decoder expands palettes to RGB, so the bit depth has to be read from
/// the header.
fn is_gray_palette(bytes: &[u8], image: &RgbImage) -> bool
{
    bits_per_pixel(bytes).is_some_and(|bits| bits <= 8)
        && image
            .pixels()
            .all(|pixel| pixel.0[0] == pixel.0[1] && pixel.0[1] == pixel.0[2])
}

/// Bit depth declared in the DIB header.
fn bits_per_pixel(bytes: &[u8]) -> Option<u16>
{
    let header = bytes.get(FILE_HEADER_LEN..)?;
    let header_len = u32::from_le_bytes(header.get(..4)?.try_into().ok()?);
    let offset = if header_len == CORE_HEADER_LEN { 10 } else { 14 };
    let bits = header.get(offset..offset + 2)?;
    Some(u16::from_le_bytes(bits.try_into().ok()?))
}

/// Writes the grid as a BMP file.
///
/// Grayscale grids become 8-bit palette images, colour grids 24-bit images.
///
/// # Errors
///
/// Returns:
/// * [`AppError::Write`] when the file cannot be created or flushed
/// * [`AppError::ImageEncode`] when the image cannot be encoded
pub(super) fn write_bmp(
    grid: &PixelGrid,
    output: impl AsRef<Path>,
) -> Result<(), AppError>
{
    let output = output.as_ref();
    let file = File::create(output).map_err(|source| AppError::Write {
        path: output.into(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let color_type = if grid.is_grayscale()
    {
        ExtendedColorType::L8
    }
    else
    {
        ExtendedColorType::Rgb8
    };

    BmpEncoder::new(&mut writer)
        .encode(grid.samples(), grid.width(), grid.height(), color_type)
        .map_err(|source| AppError::ImageEncode {
            path: output.into(),
            target_format: BMP_EXTENSION.into(),
            source,
        })?;

    writer.flush().map_err(|source| AppError::Write {
        path: output.into(),
        source,
    })
}
