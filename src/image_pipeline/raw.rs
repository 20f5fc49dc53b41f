//! RAW image reading module
//!
//! This module provides format-agnostic RAW image reading and decoding
//! into pixel arrays.

mod options;
mod rawloader_reader;
mod reader;
mod source;
pub mod types;


pub use options::{ColorSpace, DecodeOptions, DecodeOptionsBuilder, DemosaicAlgorithm};
pub use rawloader_reader::RawLoaderReader;
pub use reader::RawImageReader;
pub use source::RawSource;
pub use types::{CfaPattern, RawGeometry, RawImageData};
