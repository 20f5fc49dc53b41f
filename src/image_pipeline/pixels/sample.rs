use crate::image_pipeline::common::error::{ConversionError, Result};

/// Width of an unsigned sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    U16,
    U32,
}

impl SampleType {
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(SampleType::U8),
            16 => Ok(SampleType::U16),
            32 => Ok(SampleType::U32),
            other => Err(ConversionError::UnsupportedFormat(format!(
                "{} bits per sample",
                other
            ))),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            SampleType::U8 => 8,
            SampleType::U16 => 16,
            SampleType::U32 => 32,
        }
    }

    /// Largest value a sample of this type can hold, `2^bits - 1`.
    pub fn max_value(self) -> u32 {
        match self {
            SampleType::U8 => u8::MAX as u32,
            SampleType::U16 => u16::MAX as u32,
            SampleType::U32 => u32::MAX,
        }
    }

    pub(crate) fn check_range(self, samples: &[u32]) -> Result<()> {
        let max = self.max_value();
        match samples.iter().find(|&&v| v > max) {
            Some(&value) => Err(ConversionError::SampleOutOfRange {
                value,
                bits: self.bits(),
            }),
            None => Ok(()),
        }
    }
}
