//! Common file system operations

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

fn same_path(a: &Path, b: &Path) -> bool {
    dunce::simplified(a) == dunce::simplified(b)
}

/// Remove the now empty directories above `file`
///
/// Stops at the first directory that is protected, not empty, or cannot be
/// removed. Failures here never fail the caller.
pub fn remove_empty_parents(file: &Path, protected: &[PathBuf]) {
    let mut current = file.parent();
    while let Some(dir) = current {
        if dir.as_os_str().is_empty() || protected.iter().any(|root| same_path(root, dir)) {
            break;
        }
        let is_empty = fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(false);
        if !is_empty {
            break;
        }
        if let Err(e) = fs::remove_dir(dir) {
            warn!(dir = %dir.display(), error = %e, "could not remove empty directory");
            break;
        }
        debug!(dir = %dir.display(), "removed empty directory");
        current = dir.parent();
    }
}

/// Delete `dir` with everything below it
///
/// Files go first, then directories deepest first, then `dir` itself. A
/// missing directory is not an error.
pub fn purge_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for sub in dirs {
        fs::remove_dir(&sub)?;
    }
    fs::remove_dir(dir)
}

/// Remove `dir` only if it exists and is empty
pub fn remove_dir_if_empty(dir: &Path) {
    if fs::read_dir(dir).is_ok_and(|mut d| d.next().is_none()) {
        let _ = fs::remove_dir(dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{create_temp_dir, create_test_files};

    #[test]
    fn test_remove_empty_parents_stops_at_protected_root() {
        let temp = create_temp_dir();
        let root = temp.path().join("PlugIns");
        let file = root.join("viewer/lib/a.so");
        create_test_files(temp.path(), &[("PlugIns/viewer/lib/a.so", b"x")]);
        fs::remove_file(&file).unwrap();

        remove_empty_parents(&file, &[root.clone()]);
        assert!(!root.join("viewer").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_remove_empty_parents_keeps_shared_dirs() {
        let temp = create_temp_dir();
        let root = temp.path().join("PlugIns");
        create_test_files(
            temp.path(),
            &[("PlugIns/viewer/lib/a.so", b"x"), ("PlugIns/viewer/b.so", b"y")],
        );
        let file = root.join("viewer/lib/a.so");
        fs::remove_file(&file).unwrap();

        remove_empty_parents(&file, &[root.clone()]);
        assert!(!root.join("viewer/lib").exists());
        assert!(root.join("viewer/b.so").exists());
    }

    #[test]
    fn test_purge_dir() {
        let temp = create_temp_dir();
        create_test_files(
            temp.path(),
            &[("ext/install.rdf", b"x"), ("ext/images/a/icon.png", b"y")],
        );
        purge_dir(&temp.path().join("ext")).unwrap();
        assert!(!temp.path().join("ext").exists());
        purge_dir(&temp.path().join("ext")).unwrap();
    }
}
