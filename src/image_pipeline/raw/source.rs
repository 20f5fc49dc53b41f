//! A RAW file opened for decoding.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::common::source::{ImageSource, SourceInfo};
use crate::image_pipeline::debayer::CpuDebayer;
use crate::image_pipeline::pixels::PixelArray;
use crate::image_pipeline::raw::options::DecodeOptions;
use crate::image_pipeline::raw::rawloader_reader::RawLoaderReader;
use crate::image_pipeline::raw::reader::RawImageReader;
use crate::image_pipeline::raw::types::{RawGeometry, RawImageData};

/// Decoded sensor data of one RAW file, plus its geometry.
///
/// The geometry is read once when the source is opened. The sensor data is
/// kept until [`RawSource::release`] is called (or the source is dropped);
/// decoding a released source fails with
/// [`ConversionError::UseAfterCloseError`].
///
/// Decoding is repeatable but not cached, keep the returned array if it is
/// needed more than once.
#[derive(Debug)]
pub struct RawSource {
    info: SourceInfo,
    geometry: RawGeometry,
    sensor: Option<RawImageData>,
}

impl RawSource {
    /// Opens a RAW file with the rawloader decoder.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &RawLoaderReader)
    }

    #[instrument(skip(path, reader), fields(path = %path.as_ref().display(), reader = reader.name()))]
    pub fn open_with<P: AsRef<Path>, R: RawImageReader>(path: P, reader: &R) -> Result<Self> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| {
            ConversionError::DecodeError(format!("{}: {}", path.display(), e))
        })?;
        let sensor = reader.read_raw(&bytes)?;
        let geometry = RawGeometry::from_raw(&sensor)?;

        info!(
            raw_width = geometry.raw_width,
            raw_height = geometry.raw_height,
            width = geometry.width,
            height = geometry.height,
            "Opened RAW source"
        );

        Ok(Self {
            info: SourceInfo::new(path, geometry.height, geometry.width),
            geometry,
            sensor: Some(sensor),
        })
    }

    /// Visible image size as `(height, width)`, margins excluded.
    pub fn geometry(&self) -> (usize, usize) {
        (self.geometry.height, self.geometry.width)
    }

    pub fn raw_geometry(&self) -> &RawGeometry {
        &self.geometry
    }

    pub fn bits_per_sample(&self) -> Result<u32> {
        Ok(self.sensor()?.bits_per_sample)
    }

    /// Demosaics the sensor data into a full resolution pixel array.
    #[instrument(skip(self, options), fields(path = %self.info.path.display()))]
    pub fn decode(&self, options: &DecodeOptions) -> Result<PixelArray> {
        let sensor = self.sensor()?;
        debug!(?options, "Decoding RAW source");
        CpuDebayer::new().process(sensor, options)
    }

    /// Frees the sensor data. Only the first call succeeds.
    pub fn release(&mut self) -> Result<()> {
        match self.sensor.take() {
            Some(_) => {
                debug!(path = %self.info.path.display(), "Released RAW source");
                Ok(())
            }
            None => Err(self.released_error()),
        }
    }

    pub fn is_released(&self) -> bool {
        self.sensor.is_none()
    }

    fn sensor(&self) -> Result<&RawImageData> {
        self.sensor.as_ref().ok_or_else(|| self.released_error())
    }

    fn released_error(&self) -> ConversionError {
        ConversionError::UseAfterCloseError(self.info.path.display().to_string())
    }
}

impl ImageSource for RawSource {
    fn source_info(&self) -> &SourceInfo {
        &self.info
    }
}
