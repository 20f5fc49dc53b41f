//! Attributes shared by every image source, whatever its file format.

use std::path::{Path, PathBuf};

/// Location and visible size of an image source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub height: usize,
    pub width: usize,
}

impl SourceInfo {
    pub fn new(path: impl Into<PathBuf>, height: usize, width: usize) -> Self {
        Self {
            path: path.into(),
            height,
            width,
        }
    }

    /// `(height, width)` of the visible image.
    pub fn size(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

/// Anything backed by a file on disk that knows its visible size.
pub trait ImageSource {
    fn source_info(&self) -> &SourceInfo;

    fn path(&self) -> &Path {
        &self.source_info().path
    }

    fn size(&self) -> (usize, usize) {
        self.source_info().size()
    }
}
