//! TIFF writing module
//!
//! This module provides TIFF file writing capabilities with various compression options.

mod standard_tiff_writer;
pub mod types;
mod writer;

#[cfg(test)]
mod tests;

pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{ConversionConfig, ConversionConfigBuilder, TiffCompression};
pub use writer::TiffWriter;
