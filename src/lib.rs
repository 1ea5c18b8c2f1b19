//! Baseline steganography simulator for images.
//!
//! Embeds a random message of a given length into a cover bitmap with LSB,
//! LSB+, LSB++, LSB matching or LSB matching revisited, and writes the
//! resulting stego image for steganalysis experiments.
pub mod analysis;
pub mod cli;
pub mod grid;
pub mod sampling;
pub mod stego;
