//! In-memory pixel representation
//!
//! Every source (RAW mosaics, single-channel FITS units) is normalized into
//! a [`PixelArray`] or a [`Plane`] of unsigned samples.

mod array;
mod channel;
mod plane;
mod sample;


pub use array::{CHANNELS, PixelArray};
pub use channel::Channel;
pub use plane::Plane;
pub use sample::SampleType;
