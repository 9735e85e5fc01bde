//! Extension manifests
//!
//! A [`Manifest`] is the metadata record of one extension: identity, target
//! applications, descriptive metadata and the `requires`/`incompatible`
//! relations used to gate installs and uninstalls. Manifests are read from a
//! bundle's `install.rdf` (see [`io`]) and written back next to the installed
//! extension once an install commits.

pub mod io;
pub mod rdf;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::{HostApplication, Identifier, Requirement, Version};

/// A relation entry: optional host filter plus the requirement it guards
///
/// A `None` filter applies to every host.
pub type Relation = (Option<Requirement>, Requirement);

/// Metadata of one extension bundle
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub id: Identifier,
    pub version: Version,
    pub name: String,
    pub target_applications: Vec<Requirement>,
    pub description: Option<String>,
    pub creator: Option<String>,
    pub developers: Vec<String>,
    pub translators: Vec<String>,
    pub contributors: Vec<String>,
    pub homepage_url: Option<String>,
    pub icon_url: Option<String>,
    pub license_urls: Vec<String>,
    /// License texts, parallel to `license_urls`
    pub licenses: Vec<String>,
    pub hidden: bool,
    pub platforms: Vec<String>,
    pub requires: Vec<Relation>,
    pub incompatible: Vec<Relation>,
    pub update_key: Option<String>,
    pub update_url: Option<String>,
    pub splash_screen_urls: Vec<String>,
    /// Help entry name to URL
    pub help_entries: BTreeMap<String, String>,
    /// Bundle file the manifest was loaded from
    pub source: Option<PathBuf>,
}

impl Manifest {
    /// Structural validity against the host; never consults other extensions
    pub fn validate(&self, host: &HostApplication) -> bool {
        self.id.is_valid()
            && self.version.is_valid()
            && !self.name.is_empty()
            && self.check_target_application(host).is_ok()
            && self.license_urls.len() == self.licenses.len()
    }

    /// Explains why the extension cannot run on `host`, if it cannot
    pub fn check_target_application(&self, host: &HostApplication) -> Result<(), String> {
        if self.target_applications.is_empty() {
            return Err("No target application is specified.".to_string());
        }
        if self
            .target_applications
            .iter()
            .any(|app| app.matches(&host.id, &host.version))
        {
            return Ok(());
        }
        match self.target_applications.iter().find(|app| *app.id() == host.id) {
            Some(app) => Err(format!(
                "This extension requires application version {} through {} but this is version {}.",
                app.min(),
                app.max(),
                host.version
            )),
            None => Err("This extension does not support this application.".to_string()),
        }
    }

    /// Human readable reason for a failed [`validate`](Self::validate)
    pub fn validation_error(&self, host: &HostApplication) -> Option<String> {
        if !self.id.is_valid() {
            return Some("Missing or invalid identifier.".to_string());
        }
        if !self.version.is_valid() {
            return Some("Missing or invalid version.".to_string());
        }
        if self.name.is_empty() {
            return Some("Missing name.".to_string());
        }
        if let Err(reason) = self.check_target_application(host) {
            return Some(reason);
        }
        if self.license_urls.len() != self.licenses.len() {
            return Some("Every license URL must have a license text.".to_string());
        }
        None
    }

    /// Relations of `relations` that apply on `host`
    fn applicable<'a>(
        relations: &'a [Relation],
        host: &'a HostApplication,
    ) -> impl Iterator<Item = &'a Requirement> + 'a {
        relations
            .iter()
            .filter(move |(filter, _)| host.is_selected_by(filter.as_ref()))
            .map(|(_, target)| target)
    }

    /// Check every applicable `requires` entry against the installed extensions
    pub fn meets_requirements(
        &self,
        host: &HostApplication,
        installed: &BTreeMap<Identifier, Manifest>,
    ) -> Result<(), String> {
        for target in Self::applicable(&self.requires, host) {
            let Some(dependency) = installed.get(target.id()) else {
                return Err(format!(
                    "Required extension [{}] version {} through {} is not installed.",
                    target.id(),
                    target.min(),
                    target.max()
                ));
            };
            if !dependency.validate(host) || !target.meets(&dependency.version) {
                return Err(format!(
                    "Installed extension [{}] version {} does not meet the requirement for version {} through {}.",
                    dependency.name,
                    dependency.version,
                    target.min(),
                    target.max()
                ));
            }
        }
        Ok(())
    }

    /// Whether this extension declares `other` incompatible on `host`
    pub fn is_incompatible(&self, host: &HostApplication, other: &Manifest) -> bool {
        other.validate(host)
            && Self::applicable(&self.incompatible, host)
                .any(|target| target.matches(&other.id, &other.version))
    }

    /// Whether this extension needs `other` to stay installed on `host`
    pub fn requires_extension(&self, host: &HostApplication, other: &Manifest) -> bool {
        Self::applicable(&self.requires, host).any(|target| target.matches(&other.id, &other.version))
    }

    /// Display name, falling back to the identifier
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}
