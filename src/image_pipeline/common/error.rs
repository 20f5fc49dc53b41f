use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to decode RAW image: {0}")]
    DecodeError(String),

    #[error("Failed to read image unit: {0}")]
    UnitReadError(String),

    #[error("Failed to write image unit: {0}")]
    UnitWriteError(String),

    #[error("Decoder handle already released: {0}")]
    UseAfterCloseError(String),

    #[error("Channel grids do not match: {0}")]
    ShapeMismatchError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Sample value {value} does not fit in {bits} bits")]
    SampleOutOfRange { value: u32, bits: u32 },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
