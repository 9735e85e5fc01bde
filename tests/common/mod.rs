//! Common test utilities for aeb integration tests

#![allow(dead_code, clippy::expect_used)]

use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::FileOptions;

/// Host id the test configuration declares
pub const HOST_ID: &str = "0b6f8d7e-3c2a-4f51-9e0d-7a1b2c3d4e5f";

/// An application home plus a directory for bundles
pub struct TestHome {
    /// Temporary directory
    pub temp: TempDir,
    /// Application home
    pub home: PathBuf,
    /// Where test bundles are written
    pub bundles: PathBuf,
    /// Configuration file pointing at `home`
    pub config: PathBuf,
}

impl TestHome {
    /// Create a new home with a configuration for host version 4.5
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let home = temp.path().join("app");
        let bundles = temp.path().join("bundles");
        std::fs::create_dir_all(&bundles).expect("Failed to create bundles directory");

        let config = temp.path().join("aeb.yaml");
        std::fs::write(
            &config,
            format!(
                "home: {}\nhost:\n  id: \"{{{HOST_ID}}}\"\n  version: \"4.5\"\n",
                home.display()
            ),
        )
        .expect("Failed to write configuration");

        Self {
            temp,
            home,
            bundles,
            config,
        }
    }

    /// `aeb` command bound to this home
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("aeb").expect("Failed to find aeb binary");
        cmd.env_remove("AEB_HOME")
            .env_remove("AEB_LOG")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    /// Write `<bundles>/<name>.aeb` for extension `<name>@example.com`
    pub fn bundle(&self, name: &str, extra: &str, files: &[(&str, &[u8])]) -> PathBuf {
        let manifest = manifest_text(&format!("{name}@example.com"), "1.0", extra);
        write_zip(&self.bundles.join(format!("{name}.aeb")), &manifest, files)
    }

    /// Path below the application home
    pub fn path(&self, relative: &str) -> PathBuf {
        self.home.join(relative)
    }

    /// Check if a file exists below the application home
    pub fn file_exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    /// Directory of an installed extension
    pub fn extension_dir(&self, name: &str) -> PathBuf {
        self.home.join("extensions").join(format!("{name}@example.com"))
    }
}

impl Default for TestHome {
    fn default() -> Self {
        Self::new()
    }
}

/// Manifest text for a valid extension targeting the test host
pub fn manifest_text(id: &str, version: &str, extra: &str) -> String {
    format!(
        r#"@prefix aebl: <urn:2008:03:aebl-syntax-ns#> .
@prefix ext: <urn:2008:03:opticks-aebl-extension-ns#> .
<urn:aebl:install-manifest> aebl:id "{id}" .
<urn:aebl:install-manifest> aebl:version "{version}" .
<urn:aebl:install-manifest> aebl:type "2" .
<urn:aebl:install-manifest> aebl:name "Extension {id}" .
<urn:aebl:install-manifest> aebl:description "Test extension" .
<urn:aebl:install-manifest> aebl:targetApplication _:app .
_:app aebl:id "{{{HOST_ID}}}" .
_:app aebl:minVersion "4.0" .
_:app aebl:maxVersion "4.*" .
{extra}"#
    )
}

/// `requires` statements for `id` in `[min, max]`
pub fn requires(id: &str, min: &str, max: &str) -> String {
    let node = format!("_:req{}", id.replace(['@', '.', '-'], "_"));
    format!(
        r#"<urn:aebl:install-manifest> aebl:requires {node} .
{node} aebl:id "{id}" .
{node} aebl:minVersion "{min}" .
{node} aebl:maxVersion "{max}" .
"#
    )
}

/// Write a zip bundle holding the manifest and `files`
pub fn write_zip(path: &Path, manifest: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let file = std::fs::File::create(path).expect("Failed to create bundle");
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
    path.to_path_buf()
}
