//! Test fixtures for building bundles and installer homes.
//!
//! Bundles are assembled from `(path, bytes)` pairs either as a zip archive
//! or as a loose directory tree, with a manifest generated by
//! [`manifest_text`].
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{create_temp_dir, manifest_text, write_zip_bundle};
//!
//! let temp = create_temp_dir();
//! let rdf = manifest_text("viewer@example.com", "1.0", "");
//! let path = write_zip_bundle(temp.path(), "viewer", &rdf, &[
//!     ("content/PlugIns/viewer.so", b"plugin"),
//! ]);
//! ```

#![allow(clippy::expect_used)]

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::config::InstallerConfig;
use crate::domain::{HostApplication, Identifier, Platform, Version};

/// Host id every fixture manifest targets
pub const HOST_ID: &str = "6a0cf0a4-7c1e-4b42-9d49-1f1b0d5d9e21";

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Host application matching [`manifest_text`]'s target application
#[must_use]
pub fn host() -> HostApplication {
    HostApplication {
        id: Identifier::new(HOST_ID),
        version: Version::parse("4.5.0"),
        platform: Platform::current(),
    }
}

/// Configuration rooted at `home` for the fixture host
#[must_use]
pub fn config(home: &Path) -> InstallerConfig {
    let mut config = InstallerConfig {
        home: Some(home.to_path_buf()),
        ..InstallerConfig::default()
    };
    config.host.id = Some(HOST_ID.to_string());
    config.host.version = Some("4.5.0".to_string());
    config
}

/// Manifest text for a valid extension, with `extra` statements appended
#[must_use]
pub fn manifest_text(id: &str, version: &str, extra: &str) -> String {
    format!(
        r#"@prefix aebl: <urn:2008:03:aebl-syntax-ns#> .
@prefix ext: <urn:2008:03:opticks-aebl-extension-ns#> .
<urn:aebl:install-manifest> aebl:id "{id}" .
<urn:aebl:install-manifest> aebl:version "{version}" .
<urn:aebl:install-manifest> aebl:type "2" .
<urn:aebl:install-manifest> aebl:name "Extension {id}" .
<urn:aebl:install-manifest> aebl:targetApplication _:app .
_:app aebl:id "{{{HOST_ID}}}" .
_:app aebl:minVersion "4.0" .
_:app aebl:maxVersion "4.*" .
{extra}"#
    )
}

/// `requires` statements for `id` in `[min, max]`
#[must_use]
pub fn requires(id: &str, min: &str, max: &str) -> String {
    relation("requires", id, min, max)
}

/// `incompatible` statements for `id` in `[min, max]`
#[must_use]
pub fn incompatible(id: &str, min: &str, max: &str) -> String {
    relation("incompatible", id, min, max)
}

fn relation(predicate: &str, id: &str, min: &str, max: &str) -> String {
    let node = format!("_:{predicate}{}", id.replace(['@', '.', '-'], "_"));
    format!(
        r#"<urn:aebl:install-manifest> aebl:{predicate} {node} .
{node} aebl:id "{id}" .
{node} aebl:minVersion "{min}" .
{node} aebl:maxVersion "{max}" .
"#
    )
}

/// Write a zip bundle `<dir>/<name>.aeb` holding the manifest and `files`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn write_zip_bundle(dir: &Path, name: &str, manifest: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(format!("{name}.aeb"));
    let file = std::fs::File::create(&path).expect("Failed to create bundle");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default();
    zip.start_file("install.rdf", options)
        .expect("Failed to add manifest");
    zip.write_all(manifest.as_bytes())
        .expect("Failed to write manifest");
    for (entry, bytes) in files {
        zip.start_file(*entry, options)
            .expect("Failed to add bundle entry");
        zip.write_all(bytes).expect("Failed to write bundle entry");
    }
    zip.finish().expect("Failed to finish bundle");
    path
}

/// Write a loose bundle directory `<dir>/<name>/` and return its `install.rdf`.
///
/// # Panics
///
/// Panics if any file cannot be created.
pub fn write_loose_bundle(dir: &Path, name: &str, manifest: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let root = dir.join(name);
    create_test_files(&root, &[("install.rdf", manifest.as_bytes())]);
    create_test_files(&root, files);
    root.join("install.rdf")
}

/// Create files below `base` from `(path, bytes)` pairs.
///
/// # Panics
///
/// Panics if any file cannot be created.
pub fn create_test_files(base: &Path, files: &[(&str, &[u8])]) {
    for (path, content) in files {
        let full_path = base.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&full_path, content).expect("Failed to write test file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_loose_bundle() {
        let temp = create_temp_dir();
        let rdf = write_loose_bundle(
            temp.path(),
            "viewer",
            "x",
            &[("content/Bin/tool", b"bin")],
        );
        assert!(rdf.is_file());
        assert!(temp.path().join("viewer/content/Bin/tool").is_file());
    }

    #[test]
    fn test_relation_nodes_are_distinct() {
        let a = requires("a@example.com", "1", "2");
        let b = requires("b@example.com", "1", "2");
        assert_ne!(a.lines().next(), b.lines().next());
    }
}
