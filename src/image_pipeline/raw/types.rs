//! RAW image data types

use crate::image_pipeline::common::error::{ConversionError, Result};

/// 2x2 color filter layout, named by its top-left quad read row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfaPattern {
    Rggb,
    Bggr,
    Grbg,
    Gbrg,
}

impl CfaPattern {
    /// Builds the pattern from the colors of the top-left quad
    /// (0 = red, 1 = green, 2 = blue), in the order
    /// `[(0,0), (0,1), (1,0), (1,1)]`.
    pub fn from_quad(quad: [usize; 4]) -> Option<Self> {
        match quad {
            [0, 1, 1, 2] => Some(CfaPattern::Rggb),
            [2, 1, 1, 0] => Some(CfaPattern::Bggr),
            [1, 0, 2, 1] => Some(CfaPattern::Grbg),
            [1, 2, 0, 1] => Some(CfaPattern::Gbrg),
            _ => None,
        }
    }

    pub fn quad(self) -> [usize; 4] {
        match self {
            CfaPattern::Rggb => [0, 1, 1, 2],
            CfaPattern::Bggr => [2, 1, 1, 0],
            CfaPattern::Grbg => [1, 0, 2, 1],
            CfaPattern::Gbrg => [1, 2, 0, 1],
        }
    }

    /// Pattern seen from a crop origin at `(left, top)`.
    pub fn shifted(self, left: usize, top: usize) -> Self {
        let [a, b, c, d] = self.quad();
        let (a, b, c, d) = if left % 2 == 1 { (b, a, d, c) } else { (a, b, c, d) };
        let quad = if top % 2 == 1 { [c, d, a, b] } else { [a, b, c, d] };
        // a shifted Bayer quad is still a Bayer quad
        Self::from_quad(quad).unwrap_or(self)
    }
}

/// Represents decoded RAW sensor data
#[derive(Debug, Clone)]
pub struct RawImageData {
    /// Full sensor width in pixels, margins included
    pub width: usize,
    /// Full sensor height in pixels, margins included
    pub height: usize,
    /// Sensor samples, `cpp` per pixel, row-major
    pub data: Vec<u16>,
    /// Actual bits per sample from the sensor (e.g., 12, 14, or 16)
    pub bits_per_sample: u32,
    /// Components per pixel: 1 for mosaic sensors, 3 for already interpolated data
    pub cpp: usize,
    /// Masked border as `[top, right, bottom, left]`
    pub crops: [usize; 4],
    pub blacklevels: [u16; 4],
    pub whitelevels: [u16; 4],
    /// Camera white balance multipliers, `[R, G, B, E]`
    pub wb_coeffs: [f32; 4],
    pub cam_to_xyz: [[f32; 4]; 3],
    /// Filter layout of the full sensor, `None` when not a Bayer sensor
    pub cfa: Option<CfaPattern>,
    pub pixel_aspect: f64,
    /// Whether the camera asks for the image to be rotated or mirrored
    pub flip: bool,
}

/// Sensor and visible-area dimensions of a RAW file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawGeometry {
    pub raw_height: usize,
    pub raw_width: usize,
    pub height: usize,
    pub width: usize,
    pub top_margin: usize,
    pub left_margin: usize,
    pub bottom_margin: usize,
    pub right_margin: usize,
    pub pixel_aspect: f64,
    pub flip: bool,
}

impl RawGeometry {
    pub fn from_raw(raw: &RawImageData) -> Result<Self> {
        let [top, right, bottom, left] = raw.crops;

        let width = raw.width.saturating_sub(left + right);
        let height = raw.height.saturating_sub(top + bottom);
        if width == 0 || height == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        if raw.cpp == 0 || raw.data.len() < raw.width * raw.height * raw.cpp {
            return Err(ConversionError::DecodeError(format!(
                "sensor data holds {} samples, expected {}x{}x{}",
                raw.data.len(),
                raw.width,
                raw.height,
                raw.cpp
            )));
        }

        Ok(Self {
            raw_height: raw.height,
            raw_width: raw.width,
            height,
            width,
            top_margin: top,
            left_margin: left,
            bottom_margin: bottom,
            right_margin: right,
            pixel_aspect: raw.pixel_aspect,
            flip: raw.flip,
        })
    }
}
