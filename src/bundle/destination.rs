//! Mapping bundle content onto the application layout
//!
//! The first component of a content path names the destination root, the
//! rest is the path below it: `PlugIns/viewer.so` lands in the plug-in
//! directory, `Help/viewer/index.html` in `<home>/Help/viewer/index.html`.

use std::path::PathBuf;

use super::ContentEntry;
use crate::config::Layout;
use crate::error::{Result, bundle};

/// Destination of a single content path
pub fn destination_for(layout: &Layout, relative: &str) -> Result<PathBuf> {
    let invalid = || bundle::invalid_content_path(relative);

    let (component, rest) = relative.split_once('/').ok_or_else(invalid)?;
    let mut destination = layout.root_for(component).ok_or_else(invalid)?;
    if rest.is_empty() {
        return Err(invalid());
    }
    for part in rest.split('/') {
        if part.is_empty() || part == "." || part == ".." {
            return Err(invalid());
        }
        destination.push(part);
    }
    Ok(destination)
}

/// Destinations for every entry; one unmappable entry fails the whole set
pub fn map_destinations(layout: &Layout, entries: &[ContentEntry]) -> Result<Vec<PathBuf>> {
    entries
        .iter()
        .map(|entry| destination_for(layout, &entry.path))
        .collect()
}
