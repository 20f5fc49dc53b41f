use std::io::{Cursor, Write};

use tiff::encoder::colortype::{RGB8, RGB16, RGB32};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::pixels::{PixelArray, SampleType};
use crate::image_pipeline::tiff::types::{ConversionConfig, TiffCompression};
use crate::image_pipeline::tiff::writer::TiffWriter;

/// Encodes pixel arrays as interleaved RGB TIFF files, keeping the sample width.
pub struct StandardTiffWriter;

impl StandardTiffWriter {
    fn encoder<'a>(
        &self,
        buffer: &'a mut Vec<u8>,
        config: &ConversionConfig,
    ) -> Result<TiffEncoder<Cursor<&'a mut Vec<u8>>>> {
        let compression = match config.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        let mut encoder = TiffEncoder::new(Cursor::new(buffer))
            .map_err(|e| ConversionError::EncodeError(e.to_string()))?
            .with_compression(compression);

        if let Some(predictor_val) = config.predictor {
            let predictor = match predictor_val {
                2 => Predictor::Horizontal,
                _ => Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        Ok(encoder)
    }
}

/// TIFF stores dimensions as 32-bit values.
pub(crate) fn tiff_dimensions(width: usize, height: usize) -> Result<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(ConversionError::InvalidDimensions(width, height)),
    }
}

impl TiffWriter for StandardTiffWriter {
    fn write_tiff(&self, image: &PixelArray, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        debug!(
            "Encoding TIFF image: {}x{} ({:?})",
            image.width(),
            image.height(),
            image.sample_type()
        );

        let mut buffer = Vec::new();
        let (width, height) = tiff_dimensions(image.width(), image.height())?;

        {
            let mut encoder = self.encoder(&mut buffer, config)?;

            // Constructors guarantee every sample fits its declared width,
            // so the narrowing casts are lossless.
            let written = match image.sample_type() {
                SampleType::U8 => {
                    let samples: Vec<u8> = image.samples().iter().map(|&v| v as u8).collect();
                    encoder.write_image::<RGB8>(width, height, &samples)
                }
                SampleType::U16 => {
                    let samples: Vec<u16> = image.samples().iter().map(|&v| v as u16).collect();
                    encoder.write_image::<RGB16>(width, height, &samples)
                }
                SampleType::U32 => encoder.write_image::<RGB32>(width, height, image.samples()),
            };
            written.map_err(|e| ConversionError::EncodeError(e.to_string()))?;
        }

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }
}
