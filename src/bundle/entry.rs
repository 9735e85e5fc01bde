//! Content entries of a bundle

use std::path::PathBuf;

/// Where the bytes of an entry live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLocator {
    /// Position of the entry in the archive directory
    Zip(usize),
    /// Absolute path of a loose file
    File(PathBuf),
}

/// One file shipped by a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    /// Path below `content/` or `platform/<id>/`, `/` separated
    pub path: String,
    pub size: u64,
    pub locator: ContentLocator,
}

impl ContentEntry {
    pub fn new(path: impl Into<String>, size: u64, locator: ContentLocator) -> Self {
        Self {
            path: path.into(),
            size,
            locator,
        }
    }
}
