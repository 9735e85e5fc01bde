//! Read-only views the host application consumes at startup

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use tracing::warn;
use url::Url;

use super::InstallCoordinator;
use crate::bundle::{BundleReader, resolve_url};
use crate::domain::Identifier;
use crate::manifest::Manifest;

impl InstallCoordinator {
    /// Remember bundles offered for installation
    ///
    /// Bundles that cannot be read or are invalid for this host are skipped.
    /// Replaces any earlier set.
    pub fn set_pending_install(&mut self, paths: &[PathBuf]) {
        self.pending_install.clear();
        for path in paths {
            let loaded = BundleReader::open(path, &self.host.platform)
                .and_then(|reader| reader.manifest());
            match loaded {
                Ok(manifest) if manifest.validate(&self.host) => {
                    self.pending_install.insert(manifest.id.clone(), manifest);
                }
                Ok(manifest) => warn!(
                    bundle = %path.display(),
                    reason = manifest.validation_error(&self.host).unwrap_or_default(),
                    "skipping invalid bundle"
                ),
                Err(err) => warn!(bundle = %path.display(), error = %err, "skipping unreadable bundle"),
            }
        }
    }

    pub fn pending_install(&self) -> impl Iterator<Item = &Manifest> {
        self.pending_install.values()
    }

    pub fn pending_install_extension(&self, id: &Identifier) -> Option<&Manifest> {
        self.pending_install.get(id)
    }

    /// Installed splash screen images, in extension order
    pub fn splash_screen_paths(&self) -> Vec<PathBuf> {
        self.extensions
            .values()
            .flat_map(|manifest| {
                let dir = self.layout.extension_dir(&manifest.id);
                manifest
                    .splash_screen_urls
                    .iter()
                    .filter_map(move |url| resolve_url(url).ok().map(|rel| dir.join(rel)))
            })
            .collect()
    }

    /// Help entry name to resolved location, merged across extensions
    ///
    /// `aeb:///Help/...` points into the application's help tree, other
    /// `aeb:` and `file:` URLs into the extension directory. Anything else is
    /// returned as written.
    pub fn help_entries(&self) -> BTreeMap<String, String> {
        let mut entries = BTreeMap::new();
        for manifest in self.extensions.values() {
            let dir = self.layout.extension_dir(&manifest.id);
            for (name, target) in &manifest.help_entries {
                entries.insert(name.clone(), self.resolve_help(&dir, target));
            }
        }
        entries
    }

    fn resolve_help(&self, ext_dir: &Path, target: &str) -> String {
        let Ok(url) = Url::parse(target) else {
            return target.to_string();
        };
        let path = percent_decode_str(url.path()).decode_utf8_lossy().into_owned();
        match url.scheme() {
            "aeb" => {
                let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
                let resolved = if parts.len() > 1 && parts[0] == "Help" {
                    self.layout.home.join(parts.join("/"))
                } else {
                    ext_dir.join(parts.join("/"))
                };
                resolved.display().to_string()
            }
            "file" => ext_dir.join(path).display().to_string(),
            _ => target.to_string(),
        }
    }
}
