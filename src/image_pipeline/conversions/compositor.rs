//! Merging three single-channel FITS units into one pixel array, and
//! splitting a pixel array back into three units.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::fits::{AstroUnit, ObservationMeta, WriteOptions, write_unit};
use crate::image_pipeline::pixels::{Channel, PixelArray};

pub const FITS_EXTENSION: &str = "fits";

fn append_to_path(base: &Path, suffix: &str) -> PathBuf {
    let mut path: OsString = base.as_os_str().to_os_string();
    path.push(suffix);
    PathBuf::from(path)
}

/// Input file of `channel` for a merge: `<base>red.fits`, `<base>green.fits`, ...
pub fn merge_source_path(base: &Path, channel: Channel) -> PathBuf {
    append_to_path(base, &format!("{}.{}", channel.name(), FITS_EXTENSION))
}

/// Output file of `channel` for a split: `<base>_red.fits`, `<base>_green.fits`, ...
pub fn split_output_path(base: &Path, channel: Channel) -> PathBuf {
    append_to_path(base, &format!("_{}.{}", channel.name(), FITS_EXTENSION))
}

/// Files written by [`Compositor::split`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutputs {
    pub red: PathBuf,
    pub green: PathBuf,
    pub blue: PathBuf,
}

impl SplitOutputs {
    pub fn path(&self, channel: Channel) -> &Path {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Compositor {
    options: WriteOptions,
}

impl Compositor {
    pub fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Reads three single-channel units and stacks them as red, green, blue.
    #[instrument(skip(self, red, green, blue), fields(red = %red.as_ref().display()))]
    pub fn merge<P: AsRef<Path>>(&self, red: P, green: P, blue: P) -> Result<PixelArray> {
        let red = AstroUnit::read(red)?;
        let green = AstroUnit::read(green)?;
        let blue = AstroUnit::read(blue)?;
        self.merge_units(&red, &green, &blue)
    }

    /// Merges `<base>red.fits`, `<base>green.fits` and `<base>blue.fits`.
    pub fn merge_dir<P: AsRef<Path>>(&self, base: P) -> Result<PixelArray> {
        let base = base.as_ref();
        self.merge(
            merge_source_path(base, Channel::Red),
            merge_source_path(base, Channel::Green),
            merge_source_path(base, Channel::Blue),
        )
    }

    /// Fails with `ShapeMismatchError` unless all three grids agree on
    /// height, width and sample type.
    pub fn merge_units(&self, red: &AstroUnit, green: &AstroUnit, blue: &AstroUnit) -> Result<PixelArray> {
        let array = PixelArray::from_planes(red.grid(), green.grid(), blue.grid())?;
        info!(
            width = array.width(),
            height = array.height(),
            sample_type = ?array.sample_type(),
            "Merged channels"
        );
        Ok(array)
    }

    /// Writes each channel of `array` to its own FITS unit, all three
    /// carrying the same observation cards.
    ///
    /// Units are written red, green, blue. A failure stops the split and
    /// leaves already written units in place.
    #[instrument(skip(self, array, output_base, meta), fields(base = %output_base.as_ref().display()))]
    pub fn split<P: AsRef<Path>>(
        &self,
        array: &PixelArray,
        output_base: P,
        meta: &ObservationMeta,
    ) -> Result<SplitOutputs> {
        let base = output_base.as_ref();
        let header = meta.to_header();

        for channel in Channel::ALL {
            let path = split_output_path(base, channel);
            write_unit(&array.plane(channel), &path, &header, &self.options)?;
            info!(%channel, path = %path.display(), "Wrote channel");
        }

        Ok(SplitOutputs {
            red: split_output_path(base, Channel::Red),
            green: split_output_path(base, Channel::Green),
            blue: split_output_path(base, Channel::Blue),
        })
    }
}
