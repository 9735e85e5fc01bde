//! The `pendinguninstall` file
//!
//! Newline separated extension ids (or directory names) scheduled for
//! removal. The line `+all` schedules every installed extension.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{Result, fs as fs_error};

/// Sentinel line scheduling every installed extension for removal
pub const ALL: &str = "+all";

/// Scheduled ids in file order; a missing file schedules nothing
pub fn read(path: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(fs_error::read_failed(path, e)),
    }
}

/// Schedule `id` for removal
pub fn append(path: &Path, id: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| fs_error::write_failed(path, e))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| fs_error::write_failed(path, e))?;
    writeln!(file, "{id}")
        .and_then(|()| file.sync_data())
        .map_err(|e| fs_error::write_failed(path, e))
}

/// Drop the file once everything in it was processed
pub fn clear(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(fs_error::write_failed(path, e)),
    }
}
