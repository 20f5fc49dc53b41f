//! RAW decoding configuration types

/// Output color space of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Camera native space, no color matrix applied
    Raw,
    /// Camera space converted through XYZ to sRGB primaries
    Srgb,
}

/// Interpolation used to rebuild full color from the sensor mosaic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemosaicAlgorithm {
    /// Copies the nearest sample of each color (fastest)
    NearestNeighbour,
    /// Bilinear interpolation
    Linear,
    /// Bicubic interpolation (slower, sharper edges)
    Cubic,
}

/// Configuration for decoding a RAW file into a pixel array
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Output bits per sample, 8 or 16
    pub bit_depth: u32,
    pub color_space: ColorSpace,
    pub demosaic: DemosaicAlgorithm,
    /// Apply the white balance recorded by the camera
    pub use_camera_wb: bool,
    /// Keep sensor levels instead of stretching the histogram
    pub no_auto_bright: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            bit_depth: 16,
            color_space: ColorSpace::Raw,
            demosaic: DemosaicAlgorithm::Linear,
            use_camera_wb: true,
            no_auto_bright: true,
        }
    }
}

impl DecodeOptions {
    pub fn builder() -> DecodeOptionsBuilder {
        DecodeOptionsBuilder::default()
    }
}

/// Builder for DecodeOptions
#[derive(Default)]
pub struct DecodeOptionsBuilder {
    bit_depth: Option<u32>,
    color_space: Option<ColorSpace>,
    demosaic: Option<DemosaicAlgorithm>,
    use_camera_wb: Option<bool>,
    no_auto_bright: Option<bool>,
}

impl DecodeOptionsBuilder {
    pub fn bit_depth(mut self, bits: u32) -> Self {
        self.bit_depth = Some(bits);
        self
    }

    pub fn color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = Some(color_space);
        self
    }

    pub fn demosaic(mut self, algorithm: DemosaicAlgorithm) -> Self {
        self.demosaic = Some(algorithm);
        self
    }

    pub fn use_camera_wb(mut self, enable: bool) -> Self {
        self.use_camera_wb = Some(enable);
        self
    }

    pub fn no_auto_bright(mut self, enable: bool) -> Self {
        self.no_auto_bright = Some(enable);
        self
    }

    pub fn build(self) -> DecodeOptions {
        let default = DecodeOptions::default();
        DecodeOptions {
            bit_depth: self.bit_depth.unwrap_or(default.bit_depth),
            color_space: self.color_space.unwrap_or(default.color_space),
            demosaic: self.demosaic.unwrap_or(default.demosaic),
            use_camera_wb: self.use_camera_wb.unwrap_or(default.use_camera_wb),
            no_auto_bright: self.no_auto_bright.unwrap_or(default.no_auto_bright),
        }
    }
}
