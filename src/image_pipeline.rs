//! Image processing pipeline module
//!
//! This module provides a structured approach to astronomical image handling,
//! with separate modules for RAW decoding, demosaicing, FITS channel units,
//! TIFF writing, and conversion orchestration.

pub mod common;
pub mod conversions;
pub mod debayer;
pub mod fits;
pub mod pixels;
pub mod raw;
pub mod tiff;

pub use common::{
    ConversionError,
    ImageSource,
    Result,
    SourceInfo,
};

pub use pixels::{
    Channel,
    PixelArray,
    Plane,
    SampleType,
};

pub use raw::{
    ColorSpace,
    DecodeOptions,
    DemosaicAlgorithm,
    RawImageData,
    RawImageReader,
    RawLoaderReader,
    RawSource,
};

pub use debayer::CpuDebayer;

pub use fits::{
    AstroUnit,
    ObservationMeta,
    UnitHeader,
    WriteOptions,
};

pub use tiff::{
    TiffCompression,
    ConversionConfig,
    ConversionConfigBuilder,
    TiffWriter,
    StandardTiffWriter,
};

pub use conversions::{
    Compositor,
    RawToTiffPipeline,
    SplitOutputs,
};
