use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::source::{ImageSource, SourceInfo};
use crate::image_pipeline::fits::header::UnitHeader;
use crate::image_pipeline::fits::reader::read_unit;
use crate::image_pipeline::fits::writer::{WriteOptions, write_unit};
use crate::image_pipeline::pixels::Plane;

/// Single-channel astronomical image: one sample grid and its header.
///
/// A unit read from disk keeps no file handle, only copies of the grid and
/// header cards.
#[derive(Debug, Clone, PartialEq)]
pub struct AstroUnit {
    info: SourceInfo,
    header: UnitHeader,
    grid: Plane,
}

impl AstroUnit {
    /// Builds a unit to be written to `path`.
    pub fn new(path: impl Into<PathBuf>, grid: Plane, header: UnitHeader) -> Self {
        let (height, width) = grid.shape();
        Self {
            info: SourceInfo::new(path, height, width),
            header,
            grid,
        }
    }

    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let (grid, header) = read_unit(path)?;

        info!(
            width = grid.width(),
            height = grid.height(),
            sample_type = ?grid.sample_type(),
            "Read FITS unit"
        );
        Ok(Self::new(path, grid, header))
    }

    pub fn write(&self, options: &WriteOptions) -> Result<()> {
        write_unit(&self.grid, &self.info.path, &self.header, options)
    }

    pub fn grid(&self) -> &Plane {
        &self.grid
    }

    pub fn header(&self) -> &UnitHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut UnitHeader {
        &mut self.header
    }

    pub fn into_parts(self) -> (Plane, UnitHeader) {
        (self.grid, self.header)
    }
}

impl ImageSource for AstroUnit {
    fn source_info(&self) -> &SourceInfo {
        &self.info
    }
}
