use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{info, instrument};

use crate::image_pipeline::{
    common::error::{ConversionError, Result},
    pixels::PixelArray,
    raw::{RawImageReader, RawLoaderReader, RawSource},
    tiff::{ConversionConfig, StandardTiffWriter, TiffWriter},
};

pub struct RawToTiffPipeline<R: RawImageReader, W: TiffWriter> {
    reader: R,
    writer: W,
    config: ConversionConfig,
}

impl RawToTiffPipeline<RawLoaderReader, StandardTiffWriter> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            reader: RawLoaderReader,
            writer: StandardTiffWriter,
            config,
        }
    }
}

impl<R: RawImageReader, W: TiffWriter> RawToTiffPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: ConversionConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 || width > u32::MAX as usize || height > u32::MAX as usize {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    /// Opens and demosaics a RAW file, releasing the decoder before returning.
    #[instrument(skip(self, input_path), fields(input = %input_path.as_ref().display()))]
    pub fn decode_file<P: AsRef<Path>>(&self, input_path: P) -> Result<PixelArray> {
        let mut source = {
            let _span = tracing::info_span!("open_raw").entered();
            RawSource::open_with(input_path, &self.reader)?
        };

        let decoded = {
            let _span = tracing::info_span!("decode_raw").entered();
            source.decode(&self.config.decode)
        };
        source.release()?;

        decoded
    }

    #[instrument(skip(self, image, output), fields(width = image.width(), height = image.height()))]
    pub fn convert(&self, image: &PixelArray, output: &mut dyn Write) -> Result<()> {
        {
            let _span = tracing::info_span!("validate_dimensions").entered();
            self.validate_dimensions(image.width(), image.height())?;
        }

        {
            let _span = tracing::info_span!("encode_tiff").entered();
            self.writer.write_tiff(image, output, &self.config)?;
        }

        info!(
            width = image.width(),
            height = image.height(),
            "Conversion complete"
        );
        Ok(())
    }

    /// Saves an array (decoded or merged) as a TIFF file.
    #[instrument(skip(self, image, output_path), fields(output = %output_path.as_ref().display()))]
    pub fn write_array<Q: AsRef<Path>>(&self, image: &PixelArray, output_path: Q) -> Result<()> {
        let output_path = output_path.as_ref();

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            self.create_output(output_path).map_err(|e| {
                ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };

        self.convert(image, &mut output_file)
    }

    /// Decodes `input_path` and saves it to `output_path`, returning the
    /// decoded array for further use.
    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<PixelArray> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let image = self.decode_file(input_path)?;
        self.write_array(&image, output_path)?;

        Ok(image)
    }

    fn create_output(&self, path: &Path) -> std::io::Result<File> {
        if self.config.overwrite {
            File::create(path)
        } else {
            OpenOptions::new().write(true).create_new(true).open(path)
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.config = config;
    }
}
