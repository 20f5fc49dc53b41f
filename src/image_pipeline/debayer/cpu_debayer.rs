use std::io::Cursor;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use tracing::{debug, info};

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::pixels::{CHANNELS, PixelArray, SampleType};
use crate::image_pipeline::raw::{
    CfaPattern, ColorSpace, DecodeOptions, DemosaicAlgorithm, RawGeometry, RawImageData,
};

/// Standard XYZ to sRGB D65 illuminant matrix
const XYZ_TO_SRGB: [[f32; 3]; 3] = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

/// Share of the brightest samples clipped by automatic brightness.
const AUTO_BRIGHT_CLIP: f32 = 0.01;

impl From<CfaPattern> for CFA {
    fn from(pattern: CfaPattern) -> Self {
        match pattern {
            CfaPattern::Rggb => CFA::RGGB,
            CfaPattern::Bggr => CFA::BGGR,
            CfaPattern::Grbg => CFA::GRBG,
            CfaPattern::Gbrg => CFA::GBRG,
        }
    }
}

impl From<DemosaicAlgorithm> for Demosaic {
    fn from(algorithm: DemosaicAlgorithm) -> Self {
        match algorithm {
            DemosaicAlgorithm::NearestNeighbour => Demosaic::NearestNeighbour,
            DemosaicAlgorithm::Linear => Demosaic::Linear,
            DemosaicAlgorithm::Cubic => Demosaic::Cubic,
        }
    }
}

/// Turns sensor data into a pixel array on the CPU.
pub struct CpuDebayer;

impl CpuDebayer {
    pub fn new() -> Self {
        Self
    }

    pub fn process(&self, raw_image: &RawImageData, options: &DecodeOptions) -> Result<PixelArray> {
        let sample_type = match options.bit_depth {
            8 | 16 => SampleType::from_bits(options.bit_depth)?,
            other => {
                return Err(ConversionError::UnsupportedFormat(format!(
                    "output bit depth {} (expected 8 or 16)",
                    other
                )));
            }
        };

        let geometry = RawGeometry::from_raw(raw_image)?;
        let (width, height) = (geometry.width, geometry.height);
        info!("Starting CPU debayering for image {}x{}", width, height);

        let visible = crop(raw_image, &geometry);
        let rgb = match raw_image.cpp {
            1 => {
                let cfa = raw_image
                    .cfa
                    .ok_or_else(|| {
                        ConversionError::DecodeError("sensor is not a Bayer mosaic".to_string())
                    })?
                    .shifted(geometry.left_margin, geometry.top_margin);
                demosaic(&visible, width, height, cfa, options.demosaic)?
            }
            3 => visible,
            cpp => {
                return Err(ConversionError::DecodeError(format!(
                    "unsupported {} components per pixel",
                    cpp
                )));
            }
        };

        let mut linear = to_linear(raw_image, &rgb, options);

        if !options.no_auto_bright {
            let scale = auto_bright_scale(&linear);
            debug!("Auto brightness scale: {:.3}", scale);
            linear.iter_mut().for_each(|v| *v *= scale);
        }

        let max = sample_type.max_value() as f32;
        let data: Vec<u32> = linear
            .iter()
            .map(|&v| (v * max).round().clamp(0.0, max) as u32)
            .collect();

        PixelArray::new(width, height, sample_type, data)
    }
}

impl Default for CpuDebayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies the visible area out of the full sensor frame.
fn crop(raw_image: &RawImageData, geometry: &RawGeometry) -> Vec<u16> {
    let cpp = raw_image.cpp;
    let row_len = geometry.width * cpp;
    let mut visible = Vec::with_capacity(row_len * geometry.height);

    for row in geometry.top_margin..geometry.top_margin + geometry.height {
        let start = (row * raw_image.width + geometry.left_margin) * cpp;
        visible.extend_from_slice(&raw_image.data[start..start + row_len]);
    }
    visible
}

fn demosaic(
    mosaic: &[u16],
    width: usize,
    height: usize,
    cfa: CfaPattern,
    algorithm: DemosaicAlgorithm,
) -> Result<Vec<u16>> {
    let bayer_bytes: Vec<u8> = mosaic.iter().flat_map(|&val| val.to_le_bytes()).collect();
    let mut output_buf = vec![0u8; width * height * CHANNELS * 2];

    debug!(
        "Running demosaic with CFA={:?}, algo={:?}, input bytes: {}",
        cfa,
        algorithm,
        bayer_bytes.len()
    );

    {
        let mut output_raster = RasterMut::new(width, height, RasterDepth::Depth16, &mut output_buf);
        bayer::run_demosaic(
            &mut Cursor::new(&bayer_bytes[..]),
            BayerDepth::Depth16LE,
            cfa.into(),
            algorithm.into(),
            &mut output_raster,
        )
        .map_err(|e| ConversionError::DecodeError(format!("Demosaic failed: {:?}", e)))?;
    }

    Ok(output_buf
        .chunks_exact(2)
        .map(|bytes| u16::from_ne_bytes([bytes[0], bytes[1]]))
        .collect())
}

/// Black level, white balance and color matrix, giving values where
/// 1.0 is the sensor white point.
fn to_linear(raw_image: &RawImageData, rgb: &[u16], options: &DecodeOptions) -> Vec<f32> {
    let black: [f32; 3] = std::array::from_fn(|c| raw_image.blacklevels[c] as f32);
    let range: [f32; 3] = std::array::from_fn(|c| {
        (raw_image.whitelevels[c] as f32 - black[c]).max(1.0)
    });
    let wb = if options.use_camera_wb {
        white_balance(&raw_image.wb_coeffs)
    } else {
        [1.0; 3]
    };
    let matrix = match options.color_space {
        ColorSpace::Raw => None,
        ColorSpace::Srgb => Some(cam_to_srgb(&raw_image.cam_to_xyz)),
    };

    rgb.chunks_exact(CHANNELS)
        .flat_map(|pixel| {
            let lin: [f32; 3] = std::array::from_fn(|c| {
                ((pixel[c] as f32 - black[c]).max(0.0) / range[c]) * wb[c]
            });
            match &matrix {
                Some(m) => std::array::from_fn::<f32, 3, _>(|r| {
                    m[r][0] * lin[0] + m[r][1] * lin[1] + m[r][2] * lin[2]
                }),
                None => lin,
            }
        })
        .collect()
}

/// Camera multipliers normalized to green; unknown coefficients count as 1.
fn white_balance(coeffs: &[f32; 4]) -> [f32; 3] {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !valid(coeffs[1]) {
        return [1.0; 3];
    }
    std::array::from_fn(|c| {
        if valid(coeffs[c]) {
            coeffs[c] / coeffs[1]
        } else {
            1.0
        }
    })
}

/// Combined camera -> XYZ -> sRGB matrix with rows scaled so that camera
/// white stays white. Falls back to identity when the camera has no matrix.
fn cam_to_srgb(cam_to_xyz: &[[f32; 4]; 3]) -> [[f32; 3]; 3] {
    let mut m = [[0.0f32; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            m[r][c] = (0..3).map(|k| XYZ_TO_SRGB[r][k] * cam_to_xyz[k][c]).sum();
        }
    }

    for row in m.iter_mut() {
        let sum: f32 = row.iter().sum();
        if !sum.is_finite() || sum.abs() < f32::EPSILON {
            return [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        }
        row.iter_mut().for_each(|v| *v /= sum);
    }
    m
}

/// Scale that maps the brightest channel's 99th percentile to white.
fn auto_bright_scale(linear: &[f32]) -> f32 {
    let mut white = 0.0f32;
    for c in 0..CHANNELS {
        let mut values: Vec<f32> = linear.iter().skip(c).step_by(CHANNELS).copied().collect();
        if values.is_empty() {
            continue;
        }
        values.sort_by(|a, b| a.total_cmp(b));
        let idx = ((values.len() as f32) * (1.0 - AUTO_BRIGHT_CLIP)) as usize;
        white = white.max(values[idx.min(values.len() - 1)]);
    }

    if white > 0.0 { 1.0 / white } else { 1.0 }
}
