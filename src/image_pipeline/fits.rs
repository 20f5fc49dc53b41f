//! FITS unit module
//!
//! Reads and writes single-channel astronomical images stored as the
//! primary unit of a FITS file.

mod format;
mod header;
mod observation;
mod reader;
mod unit;
mod writer;

#[cfg(test)]
mod tests;

pub use header::{CardValue, UnitHeader};
pub use observation::{LATITUDE_KEY, LONGITUDE_KEY, NOT_INFORMED, ObservationMeta};
pub use reader::read_unit;
pub use unit::AstroUnit;
pub use writer::{WriteOptions, write_unit};
