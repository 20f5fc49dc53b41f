//! RAW image reader implementation using the rawloader library.
//!
//! This module provides support for reading various RAW image formats (NEF, ARW, CR2, DNG, etc.)
//! using the rawloader library. It decodes the sensor data and copies out the metadata
//! needed to crop, demosaic and color-correct it.

use std::io::Cursor;

use rawloader::{Orientation, RawImageData as RawloaderImageData};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::raw::reader::RawImageReader;
use crate::image_pipeline::raw::types::{CfaPattern, RawImageData};

/// RAW image reader that uses the rawloader library for decoding.
///
/// This reader supports any RAW format that rawloader can decode, including but not limited to:
/// - Nikon NEF
/// - Sony ARW
/// - Canon CR2
/// - Adobe DNG
pub struct RawLoaderReader;

/// Default bit depth when no white level information is available from the RAW file.
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

/// The bit width of the u16 data type, used for calculating actual bits per sample.
const U16_BITS: u32 = 16;

impl RawImageReader for RawLoaderReader {
    /// Reads and decodes RAW image data from a byte array.
    ///
    /// This method:
    /// 1. Decodes the RAW file using rawloader
    /// 2. Converts the data to u16 format (handles both integer and float RAW data)
    /// 3. Calculates the actual bits per sample from the sensor's white level metadata
    /// 4. Resolves the color filter layout, margins and orientation
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use astro_rgb::image_pipeline::{RawImageReader, RawLoaderReader};
    ///
    /// let reader = RawLoaderReader;
    /// let raw_bytes = std::fs::read("image.nef").unwrap();
    /// let image_data = reader.read_raw(&raw_bytes).unwrap();
    /// ```
    fn read_raw(&self, data: &[u8]) -> Result<RawImageData> {
        debug!("Decoding RAW image, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;

        debug!(
            make = %decoded.clean_make,
            model = %decoded.clean_model,
            "Decoded image: {}x{} ({} cpp)",
            decoded.width,
            decoded.height,
            decoded.cpp
        );

        // Float data is normalized to 0.0-1.0, scale it to the u16 range
        // and treat it as having no black offset.
        let (samples, blacklevels, whitelevels) = match &decoded.data {
            RawloaderImageData::Integer(values) => {
                (values.clone(), decoded.blacklevels, decoded.whitelevels)
            }
            RawloaderImageData::Float(values) => (
                values
                    .iter()
                    .map(|&v| (v.clamp(0.0, 1.0) * u16::MAX as f32) as u16)
                    .collect(),
                [0; 4],
                [u16::MAX; 4],
            ),
        };

        // The white level is the largest value the sensor can produce, which gives
        // its real bit depth (e.g. 4095 -> 12 bits, 16383 -> 14 bits).
        let max_white_level = whitelevels.iter().max().copied().unwrap_or(u16::MAX);
        let bits_per_sample = if max_white_level == 0 {
            DEFAULT_BITS_PER_SAMPLE
        } else {
            U16_BITS - max_white_level.leading_zeros()
        };

        debug!(
            "Calculated bits_per_sample: {} (max white level: {})",
            bits_per_sample, max_white_level
        );

        let cfa = if decoded.cpp == 1 {
            CfaPattern::from_quad([
                decoded.cfa.color_at(0, 0),
                decoded.cfa.color_at(0, 1),
                decoded.cfa.color_at(1, 0),
                decoded.cfa.color_at(1, 1),
            ])
        } else {
            None
        };
        debug!("CFA {:?} -> {:?}", decoded.cfa.name, cfa);

        let flip = !matches!(decoded.orientation, Orientation::Normal | Orientation::Unknown);

        Ok(RawImageData {
            width: decoded.width,
            height: decoded.height,
            data: samples,
            bits_per_sample,
            cpp: decoded.cpp,
            crops: decoded.crops,
            blacklevels,
            whitelevels,
            wb_coeffs: decoded.wb_coeffs,
            cam_to_xyz: decoded.cam_to_xyz_normalized(),
            cfa,
            // rawloader only handles square-pixel sensors
            pixel_aspect: 1.0,
            flip,
        })
    }
}
