//! Three-channel pixel array

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::pixels::{channel::Channel, plane::Plane, sample::SampleType};

/// Number of channels in a [`PixelArray`].
pub const CHANNELS: usize = 3;

/// Height x width x 3 grid of unsigned samples.
///
/// Samples are interleaved `[R, G, B, R, G, B, ...]` in row-major order.
/// The array is immutable once built: both constructors check the
/// dimensions and that every sample fits the declared sample type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelArray {
    width: usize,
    height: usize,
    sample_type: SampleType,
    data: Vec<u32>,
}

impl PixelArray {
    pub fn new(width: usize, height: usize, sample_type: SampleType, data: Vec<u32>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height * CHANNELS {
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

    /// Interleaves three planes into one array.
    ///
    /// All planes must agree on height, width and sample type. The array
    /// takes the red plane's sample type.
    pub fn from_planes(red: &Plane, green: &Plane, blue: &Plane) -> Result<Self> {
        for (channel, plane) in [(Channel::Green, green), (Channel::Blue, blue)] {
            if plane.shape() != red.shape() {
                return Err(ConversionError::ShapeMismatchError(format!(
                    "{} plane is {}x{} but red plane is {}x{}",
                    channel,
                    plane.height(),
                    plane.width(),
                    red.height(),
                    red.width()
                )));
            }
            if plane.sample_type() != red.sample_type() {
                return Err(ConversionError::ShapeMismatchError(format!(
                    "{} plane holds {:?} samples but red plane holds {:?}",
                    channel,
                    plane.sample_type(),
                    red.sample_type()
                )));
            }
        }

        let data: Vec<u32> = red
            .samples()
            .iter()
            .zip(green.samples())
            .zip(blue.samples())
            .flat_map(|((&r, &g), &b)| [r, g, b])
            .collect();

        Ok(Self {
            width: red.width(),
            height: red.height(),
            sample_type: red.sample_type(),
            data,
        })
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

    pub fn channels(&self) -> usize {
        CHANNELS
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn samples(&self) -> &[u32] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize, channel: Channel) -> Option<u32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.data[(row * self.width + col) * CHANNELS + channel.index()])
    }

    /// Copies one channel out as an independent plane.
    pub fn plane(&self, channel: Channel) -> Plane {
        let data: Vec<u32> = self
            .data
            .iter()
            .skip(channel.index())
            .step_by(CHANNELS)
            .copied()
            .collect();

        Plane::new_unchecked(self.width, self.height, self.sample_type, data)
    }
}
