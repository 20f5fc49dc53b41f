//! Common utilities module
//!
//! This module contains the error type and the source descriptor shared
//! across the image pipeline.

pub mod error;
pub mod source;

pub use error::{ConversionError, Result};
pub use source::{ImageSource, SourceInfo};
