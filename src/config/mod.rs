//! Installer configuration
//!
//! The installer reads an optional YAML file describing the host application
//! and where its directories live:
//!
//! ```yaml
//! home: /opt/viewer
//! plugins: /opt/viewer/PlugIns
//! platform: linux-x86_64
//! host:
//!   id: "{6a0cf0a4-7c1e-4b42-9d49-1f1b0d5d9e21}"
//!   version: "4.5.0"
//! ```
//!
//! Every key is optional. Relative paths are resolved against `home`, and
//! `home` itself defaults to the per-user data directory.

pub mod layout;

pub use layout::Layout;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{HostApplication, Identifier, Platform, Version};
use crate::error::{Result, config as config_error};

/// Identifier of the host application when the configuration names none
pub const DEFAULT_HOST_ID: &str = "6a0cf0a4-7c1e-4b42-9d49-1f1b0d5d9e21";
/// Version of the host application when the configuration names none
pub const DEFAULT_HOST_VERSION: &str = "4.5.0";

/// Installer configuration file (`aeb.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Application home directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,

    /// Root holding one directory per installed extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_files: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wizards: Option<PathBuf>,

    /// Platform id used for `platform/<id>/` content and `targetPlatform`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    pub host: HostConfig,
}

/// Identity of the host application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl InstallerConfig {
    /// Parse configuration from a YAML string
    #[cfg(test)]
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(config_error::not_found(path.display().to_string()));
        }
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| crate::error::fs::read_failed(path, e))?;
        serde_yaml::from_str(&yaml)
            .map_err(|e| config_error::parse_failed(path.display().to_string(), e.to_string()))
    }

    /// Override the home directory, e.g. from the command line
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        if home.is_some() {
            self.home = home;
        }
        self
    }

    /// Resolve every directory of the installation
    pub fn layout(&self) -> Result<Layout> {
        let home = match &self.home {
            Some(home) => home.clone(),
            None => dirs::data_dir()
                .map(|dir| dir.join("aeb"))
                .ok_or_else(|| config_error::invalid("no home directory configured and no data directory available"))?,
        };
        let home = if home.is_absolute() {
            home
        } else {
            std::env::current_dir()?.join(home)
        };

        let mut layout = Layout::from_home(&home);
        let resolve = |path: &PathBuf| {
            if path.is_absolute() {
                path.clone()
            } else {
                home.join(path)
            }
        };
        if let Some(path) = &self.extensions {
            layout.extensions = resolve(path);
        }
        if let Some(path) = &self.plugins {
            layout.plugins = resolve(path);
        }
        if let Some(path) = &self.templates {
            layout.templates = resolve(path);
        }
        if let Some(path) = &self.support_files {
            layout.support_files = resolve(path);
        }
        if let Some(path) = &self.wizards {
            layout.wizards = resolve(path);
        }
        Ok(layout)
    }

    /// The host application extensions are checked against
    pub fn host(&self) -> Result<HostApplication> {
        let raw_id = self.host.id.as_deref().unwrap_or(DEFAULT_HOST_ID);
        let id = Identifier::new(raw_id);
        if !id.is_valid() {
            return Err(config_error::invalid(format!("invalid host id '{raw_id}'")));
        }
        let raw_version = self.host.version.as_deref().unwrap_or(DEFAULT_HOST_VERSION);
        let version = Version::parse(raw_version);
        if !version.is_valid() {
            return Err(config_error::invalid(format!(
                "invalid host version '{raw_version}'"
            )));
        }
        Ok(HostApplication {
            id,
            version,
            platform: self.platform.clone().unwrap_or_default(),
        })
    }
}
