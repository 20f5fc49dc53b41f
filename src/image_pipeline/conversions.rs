//! Pipeline conversions module
//!
//! This module contains orchestration logic for the supported conversions:
//! RAW to TIFF, and channel merge/split between FITS units and pixel arrays.

mod compositor;
mod raw_to_tiff;


pub use compositor::{
    Compositor, FITS_EXTENSION, SplitOutputs, merge_source_path, split_output_path,
};
pub use raw_to_tiff::RawToTiffPipeline;
