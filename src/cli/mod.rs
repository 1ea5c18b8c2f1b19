//! Command line interface for the application.
//!
//! Validates the `<METHOD> <FILE> <MESSAGE_LENGTH>` arguments, runs the
//! embedder on the cover image and writes the stego image next to it.
mod image_io;

use std::ffi::OsString;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use const_format::formatcp;
use thiserror::Error;
use tracing::{debug, info};

use self::image_io::{
    BMP_EXTENSION, load_bmp, normalized_extension, stego_path, write_bmp,
};
use crate::analysis::{AnalysisError, distortion};
use crate::sampling::rng_from_seed;
use crate::stego::{Method, UnknownMethod, embed};

/// Process status of a successful run.
///
/// Not zero: existing scripts around the tool expect `1` on success.
pub const SUCCESS_EXIT_CODE: i32 = 1;
/// Process status of any failed run.
pub const FAILURE_EXIT_CODE: i32 = -1;

/// Errors that can be emitted while handling the CLI
#[derive(Debug, Error)]
pub enum AppError
{
    /// Required arguments are missing
    #[error("{help}")]
    Usage
    {
        /// Rendered long help
        help: String,
    },

    /// The arguments could not be parsed
    #[error(transparent)]
    InvalidArguments(#[from] clap::Error),

    /// The method name is not recognized
    #[error(transparent)]
    UnknownMethod(#[from] UnknownMethod),

    /// The cover path does not exist
    #[error("{} does not exist", .path.display())]
    FileNotFound
    {
        path: Box<Path>
    },

    /// The cover path is not a regular file
    #[error("{} is not a regular file", .path.display())]
    NotAFile
    {
        path: Box<Path>
    },

    /// The cover is not a bitmap image
    #[error("only bitmap (.bmp) images are accepted: {}", .path.display())]
    UnsupportedFormat
    {
        path: Box<Path>
    },

    /// The message length is not a non-negative integer
    #[error("message length must be a non-negative integer, got {value:?}")]
    InvalidMessageLength
    {
        value: Box<str>,
        #[source]
        source: ParseIntError,
    },

    /// Reading the cover failed
    #[error("failed to read {}: {source}", .path.display())]
    Read
    {
        path: Box<Path>,
        #[source]
        source: std::io::Error,
    },

    /// Decoding the cover failed
    #[error("failed to decode {}: {source}", .path.display())]
    ImageOpen
    {
        path: Box<Path>,
        #[source]
        source: image::ImageError,
    },

    /// Encoding the stego image failed
    #[error(
        "failed to encode {} as {target_format}: {source}",
        .path.display()
    )]
    ImageEncode
    {
        path: Box<Path>,
        target_format: Box<str>,
        #[source]
        source: image::ImageError,
    },

    /// Writing the stego image failed
    #[error("failed to write {}: {source}", .path.display())]
    Write
    {
        path: Box<Path>,
        #[source]
        source: std::io::Error,
    },

    /// Comparing cover and stego failed
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// The main CLI parser
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Simulate the embedding of baseline LSB steganography methods",
    long_about = "Simulate the embedding of baseline LSB steganography \
                  methods.\n\nA random message and a random embedding key \
                  stand in for real ones, so the stego image carries exactly \
                  the statistical artifacts of the chosen method.",
    arg_required_else_help = true,
    after_long_help = AFTER_LONG_HELP
)]
struct Cli
{
    /// Embedding method: LSB, LSBP (LSB+), LSBPP (LSB++), LSBM (LSB
    /// matching) or LSBMR (LSB matching revisited). Case-insensitive.
    #[arg(value_name = "METHOD")]
    method: String,
    /// Cover bitmap image. The stego image is written next to it.
    #[arg(value_name = "FILE")]
    file: Box<Path>,
    /// Message length in bits.
    #[arg(value_name = "MESSAGE_LENGTH", allow_hyphen_values = true)]
    message_length: String,
    /// Seed for the simulated key and message. Random when omitted.
    #[arg(long, value_name = "NUMBER", env = "STEGOBASE_SEED")]
    seed: Option<u64>,
}

const AFTER_LONG_HELP: &str = formatcp!(
    "Output:\n  <FILE>.<METHOD>.{BMP_EXTENSION}\
     \n  e.g. test.bmp.LSBPP.{BMP_EXTENSION}\
     \n\nExamples:\
     \n  stegobase LSB test.bmp 1000\
     \n  stegobase LSBP /data/test.bmp 2000\
     \n  stegobase LSBPP /data/test.bmp 1500 --seed 7\
     \n  stegobase LSBM /data/test.bmp 2000\
     \n  stegobase LSBMR test.bmp 1000\
     \n\nIf you use the LSB+/LSB++ simulation in your research, please cite:\
     \n  * Qazanfari, K. and Safabakhsh, R. A new steganography method which \
     preserves histogram: Generalization of LSB++. Information Sciences 277 \
     (2014): 90-101.\
     \n  * Ghazanfari, K., Ghaemmaghami, S. and Khosravi, S. R. LSB++: an \
     improvement to LSB+ steganography. TENCON 2011, IEEE Region 10 \
     Conference. IEEE, 2011."
);

/// A validated embedding request.
#[derive(Debug, PartialEq, Eq)]
struct Request
{
    method: Method,
    cover: Box<Path>,
    message_len: u64,
    seed: Option<u64>,
}

impl Cli
{
    /// Checks the arguments in order: method, file, extension, length.
    ///
    /// Nothing touches the file system beyond metadata lookups, so a failure
    /// here never leaves an output file behind.
    fn validate(self) -> Result<Request, AppError>
    {
        let method: Method = self.method.parse()?;

        if !self.file.exists()
        {
            return Err(AppError::FileNotFound { path: self.file });
        }
        if !self.file.is_file()
        {
            return Err(AppError::NotAFile { path: self.file });
        }
        if normalized_extension(&self.file).as_deref() != Some(BMP_EXTENSION)
        {
            return Err(AppError::UnsupportedFormat { path: self.file });
        }

        let message_len = self.message_length.trim().parse().map_err(
            |source| AppError::InvalidMessageLength {
                value: self.message_length.as_str().into(),
                source,
            },
        )?;

        Ok(Request {
            method,
            cover: self.file,
            message_len,
            seed: self.seed,
        })
    }
}

/// Parses the process arguments and executes the embedding.
///
/// Returns the path of the written stego image.
///
/// # Errors
///
/// Returns [`AppError`] when the arguments are invalid, or when reading,
/// embedding into, or writing the image fails.
pub fn run() -> Result<PathBuf, AppError>
{
    run_from(std::env::args_os())
}

/// Same as [`run`] with explicit arguments, the first one being the program
/// name.
///
/// # Errors
///
/// See [`run`].
pub fn run_from<I, T>(args: I) -> Result<PathBuf, AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let request = parse_args(args)?.validate()?;
    handle_embed(&request)
}

/// Maps the outcome of a run to the process status.
#[must_use]
pub const fn exit_code<T>(result: &Result<T, AppError>) -> i32
{
    match result
    {
        Ok(_) => SUCCESS_EXIT_CODE,
        Err(_) => FAILURE_EXIT_CODE,
    }
}

/// Parses the arguments, turning missing arguments into the long help.
fn parse_args<I, T>(args: I) -> Result<Cli, AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|err| match err.kind()
    {
        ErrorKind::MissingRequiredArgument
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        | ErrorKind::DisplayHelp => AppError::Usage {
            help: Cli::command().render_long_help().to_string(),
        },
        ErrorKind::DisplayVersion => AppError::Usage {
            help: err.to_string(),
        },
        _ => AppError::InvalidArguments(err),
    })
}

/// Handles the embedding of a simulated message into the cover.
///
/// # Errors
///
/// Returns [`AppError`] when reading, comparing or writing images fails.
fn handle_embed(request: &Request) -> Result<PathBuf, AppError>
{
    let cover = load_bmp(&request.cover)?;
    debug!(
        path = %request.cover.display(),
        width = cover.width(),
        height = cover.height(),
        grayscale = cover.is_grayscale(),
        "cover loaded"
    );

    let mut stego = cover.clone();
    let mut rng = rng_from_seed(request.seed);
    // Embedding the message happens here
    embed(&mut stego, request.method, request.message_len, &mut rng);

    let total = distortion(&cover, &stego)?;
    debug!(distortion = total, "squared error between cover and stego");

    let output = stego_path(&request.cover, request.method);
    write_bmp(&stego, &output)?;
    info!(output = %output.display(), "stego image written");

    Ok(output)
}

#[cfg(test)]
mod tests
{
    use std::fmt::{Debug, Formatter, Result};
    use std::fs;

    use clap::CommandFactory;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use tempfile::TempDir;

    use super::*;
    use crate::analysis::histogram;
    use crate::grid::PixelGrid;

    // Debug impl is only needed in tests
    impl Debug for Cli
    {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result
        {
            f.debug_struct("Cli")
                .field("method", &self.method)
                .field("file", &self.file)
                .field("message_length", &self.message_length)
                .field("seed", &self.seed)
                .finish()
        }
    }

    /// A directory holding one cover image.
    struct Workspace
    {
        dir: TempDir,
        cover: PathBuf,
    }

    impl Workspace
    {
        fn with_cover(name: &str, grid: &PixelGrid) -> Self
        {
            let dir = TempDir::new().expect("failed to create tempdir");
            let cover = dir.path().join(name);
            write_bmp(grid, &cover).expect("failed to write cover");
            Self { dir, cover }
        }

        fn entries(&self) -> usize
        {
            fs::read_dir(self.dir.path())
                .expect("failed to list tempdir")
                .count()
        }

        fn run(
            &self,
            method: &str,
            length: &str,
        ) -> std::result::Result<PathBuf, AppError>
        {
            let cover = self.cover.to_str().expect("utf-8 temp path");
            run_from(["stegobase", method, cover, length, "--seed", "7"])
        }
    }

    fn colour_cover() -> PixelGrid
    {
        PixelGrid::Rgb(RgbImage::from_fn(32, 24, |x, y| {
            let x = u8::try_from(x).expect("small image");
            let y = u8::try_from(y).expect("small image");
            Rgb([x.wrapping_mul(7) ^ y, y.wrapping_mul(5), x / 3 + y / 2])
        }))
    }

    #[test]
    fn clap_configuration_is_sound()
    {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_positionals_and_seed()
    {
        let cli = Cli::try_parse_from([
            "stegobase",
            "lsbpp",
            "cover.bmp",
            "1500",
            "--seed",
            "42",
        ])
        .expect("expected valid arguments");

        assert_eq!(cli.method, "lsbpp");
        assert_eq!(cli.file.as_ref(), Path::new("cover.bmp"));
        assert_eq!(cli.message_length, "1500");
        assert_eq!(cli.seed, Some(42));
    }

    #[test]
    fn negative_length_reaches_validation()
    {
        let cli = Cli::try_parse_from(["stegobase", "LSB", "cover.bmp", "-5"])
            .expect("hyphen values are accepted");
        assert_eq!(cli.message_length, "-5");
    }

    #[test]
    fn missing_arguments_print_usage()
    {
        for args in [
            vec!["stegobase"],
            vec!["stegobase", "LSB"],
            vec!["stegobase", "LSB", "cover.bmp"],
        ]
        {
            let result = run_from(args);
            assert_eq!(exit_code(&result), FAILURE_EXIT_CODE);
            match result
            {
                Err(AppError::Usage { help }) =>
                {
                    assert!(help.contains("LSBMR"));
                    assert!(help.contains("LSB++"));
                },
                other => panic!("expected usage, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_method_creates_nothing()
    {
        let workspace = Workspace::with_cover("cover.bmp", &colour_cover());

        let result = workspace.run("BOGUS", "10");

        assert_eq!(exit_code(&result), FAILURE_EXIT_CODE);
        assert!(matches!(result, Err(AppError::UnknownMethod(_))));
        assert_eq!(workspace.entries(), 1);
    }

    #[test]
    fn non_bmp_extension_creates_nothing()
    {
        let workspace = Workspace::with_cover("cover.png", &colour_cover());

        let result = workspace.run("LSB", "10");

        assert_eq!(exit_code(&result), FAILURE_EXIT_CODE);
        assert!(matches!(result, Err(AppError::UnsupportedFormat { .. })));
        assert_eq!(workspace.entries(), 1);
    }

    #[test]
    fn missing_file_is_reported()
    {
        let dir = TempDir::new().expect("failed to create tempdir");
        let missing = dir.path().join("missing.bmp");
        let missing = missing.to_str().expect("utf-8 temp path");

        let result = run_from(["stegobase", "LSB", missing, "10"]);

        assert!(matches!(result, Err(AppError::FileNotFound { .. })));
        assert_eq!(exit_code(&result), FAILURE_EXIT_CODE);
    }

    #[test]
    fn directory_is_not_a_cover()
    {
        let dir = TempDir::new().expect("failed to create tempdir");
        let folder = dir.path().join("folder.bmp");
        fs::create_dir(&folder).expect("failed to create directory");
        let folder = folder.to_str().expect("utf-8 temp path");

        let result = run_from(["stegobase", "LSBM", folder, "10"]);

        assert!(matches!(result, Err(AppError::NotAFile { .. })));
    }

    #[test]
    fn non_integer_length_creates_nothing()
    {
        let workspace = Workspace::with_cover("cover.bmp", &colour_cover());

        for length in ["ten", "-5", "1.5", ""]
        {
            let result = workspace.run("LSBMR", length);
            assert!(
                matches!(result, Err(AppError::InvalidMessageLength { .. })),
                "{length:?} was accepted"
            );
        }
        assert_eq!(workspace.entries(), 1);
    }

    #[test]
    fn every_method_writes_a_named_stego_image()
    {
        let cover = colour_cover();
        let workspace = Workspace::with_cover("cover.BMP", &cover);

        for method in Method::ALL
        {
            let name = method.tag().to_ascii_lowercase();
            let result = workspace.run(&name, "900");
            assert_eq!(exit_code(&result), SUCCESS_EXIT_CODE);

            let output = result.expect("embedding should succeed");
            assert_eq!(
                output,
                PathBuf::from(format!(
                    "{}.{}.bmp",
                    workspace.cover.display(),
                    method.tag()
                ))
            );

            let stego = load_bmp(&output).expect("stego should load");
            assert_eq!(stego.dimensions(), cover.dimensions());
            assert!(!stego.is_grayscale());
            if method.preserves_histogram()
            {
                for &channel in cover.channels()
                {
                    assert_eq!(
                        histogram(&stego, channel),
                        histogram(&cover, channel)
                    );
                }
            }
        }
        assert_eq!(workspace.entries(), 1 + Method::ALL.len());
    }

    #[test]
    fn grayscale_cover_stays_grayscale()
    {
        let cover = PixelGrid::Gray(GrayImage::from_fn(20, 20, |x, y| {
            Luma([u8::try_from((x * 13 + y * 7) % 64).expect("in range")])
        }));
        let workspace = Workspace::with_cover("gray.bmp", &cover);

        let output = workspace
            .run("LSBP", "200")
            .expect("embedding should succeed");
        let stego = load_bmp(&output).expect("stego should load");

        assert!(stego.is_grayscale());
        assert_eq!(
            histogram(&stego, crate::grid::Channel::Gray),
            histogram(&cover, crate::grid::Channel::Gray)
        );
    }

    #[test]
    fn zero_length_copies_the_cover()
    {
        let cover = colour_cover();
        let workspace = Workspace::with_cover("cover.bmp", &cover);

        for method in Method::ALL
        {
            let output = workspace
                .run(method.tag(), "0")
                .expect("embedding should succeed");
            let stego = load_bmp(&output).expect("stego should load");
            assert_eq!(stego, cover, "{method} touched the cover");
        }
    }

    #[test]
    fn same_seed_same_output()
    {
        let workspace = Workspace::with_cover("cover.bmp", &colour_cover());

        let first = workspace.run("LSBM", "1000").expect("first run");
        let first = fs::read(first).expect("first output");
        let second = workspace.run("LSBM", "1000").expect("second run");
        let second = fs::read(second).expect("second output");

        assert_eq!(first, second);
    }
}
