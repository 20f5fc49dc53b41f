//! Single-channel sample grid

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::pixels::sample::SampleType;

/// Row-major 2-D grid of unsigned samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    width: usize,
    height: usize,
    sample_type: SampleType,
    data: Vec<u32>,
}

impl Plane {
    pub fn new(width: usize, height: usize, sample_type: SampleType, data: Vec<u32>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(ConversionError::InvalidDimensions(width, height));
        }
        sample_type.check_range(&data)?;

        Ok(Self {
            width,
            height,
            sample_type,
            data,
        })
    }

    /// Skips validation; the caller guarantees the invariants.
    pub(crate) fn new_unchecked(
        width: usize,
        height: usize,
        sample_type: SampleType,
        data: Vec<u32>,
    ) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            sample_type,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn samples(&self) -> &[u32] {
        &self.data
    }

    pub fn into_samples(self) -> Vec<u32> {
        self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.data[row * self.width + col])
    }
}
