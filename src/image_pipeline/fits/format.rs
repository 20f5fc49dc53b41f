//! On-disk layout shared by the FITS reader and writer.

use crate::image_pipeline::pixels::SampleType;

pub(crate) const FITS_BLOCK_SIZE: usize = 2880;
pub(crate) const FITS_CARD_SIZE: usize = 80;
/// Longest keyword of a value card.
pub(crate) const MAX_KEY_LEN: usize = 8;
/// Largest axis length a header may declare.
pub(crate) const MAX_AXIS_LEN: i64 = i32::MAX as i64;

/// Number of bytes needed to pad `len` up to a whole block.
pub(crate) fn block_padding(len: usize) -> usize {
    (FITS_BLOCK_SIZE - len % FITS_BLOCK_SIZE) % FITS_BLOCK_SIZE
}

/// BITPIX under which samples of `sample_type` are stored.
pub(crate) fn bitpix(sample_type: SampleType) -> i64 {
    match sample_type {
        SampleType::U8 => 8,
        SampleType::U16 => 16,
        SampleType::U32 => 32,
    }
}

/// Sample type read back from an integer BITPIX.
pub(crate) fn sample_type(bitpix: i64) -> Option<SampleType> {
    match bitpix {
        8 => Some(SampleType::U8),
        16 => Some(SampleType::U16),
        32 => Some(SampleType::U32),
        _ => None,
    }
}

/// BZERO of the unsigned convention: 16 and 32-bit data is stored signed,
/// shifted down by half its range.
pub(crate) fn unsigned_zero(sample_type: SampleType) -> i64 {
    match sample_type {
        SampleType::U8 => 0,
        SampleType::U16 => 1 << 15,
        SampleType::U32 => 1 << 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_padding() {
        assert_eq!(block_padding(0), 0);
        assert_eq!(block_padding(80), 2800);
        assert_eq!(block_padding(FITS_BLOCK_SIZE), 0);
        assert_eq!(block_padding(FITS_BLOCK_SIZE + 1), FITS_BLOCK_SIZE - 1);
    }

    #[test]
    fn test_unsigned_convention() {
        for sample_type in [SampleType::U8, SampleType::U16, SampleType::U32] {
            assert_eq!(super::sample_type(bitpix(sample_type)), Some(sample_type));
        }
        assert_eq!(unsigned_zero(SampleType::U16), 32768);
        assert_eq!(unsigned_zero(SampleType::U32), 2_147_483_648);
        assert_eq!(super::sample_type(-32), None);
    }
}
