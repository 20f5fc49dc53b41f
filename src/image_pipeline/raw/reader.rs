use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raw::types::RawImageData;

/// Decodes the bytes of a camera RAW file into sensor data.
pub trait RawImageReader {
    fn read_raw(&self, data: &[u8]) -> Result<RawImageData>;

    /// Name reported in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
