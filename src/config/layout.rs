//! Resolved directory layout of the host application

use std::path::{Path, PathBuf};

use crate::domain::Identifier;

/// Content components installed directly below the application home
pub const HOME_COMPONENTS: [&str; 4] = ["Bin", "Doc", "Help", "DefaultSettings"];

/// Every directory the installer writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub home: PathBuf,
    pub extensions: PathBuf,
    pub plugins: PathBuf,
    pub templates: PathBuf,
    pub support_files: PathBuf,
    pub wizards: PathBuf,
}

impl Layout {
    pub fn from_home(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            extensions: home.join("extensions"),
            plugins: home.join("PlugIns"),
            templates: home.join("Templates"),
            support_files: home.join("SupportFiles"),
            wizards: home.join("Wizards"),
        }
    }

    /// Destination root for the first component of a content path
    pub fn root_for(&self, component: &str) -> Option<PathBuf> {
        match component {
            c if HOME_COMPONENTS.contains(&c) => Some(self.home.join(c)),
            "PlugIns" => Some(self.plugins.clone()),
            "Templates" => Some(self.templates.clone()),
            "SupportFiles" => Some(self.support_files.clone()),
            "Wizards" => Some(self.wizards.clone()),
            _ => None,
        }
    }

    /// Root directory of every content component
    pub fn destination_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = HOME_COMPONENTS
            .iter()
            .map(|c| self.home.join(c))
            .collect();
        roots.extend([
            self.plugins.clone(),
            self.templates.clone(),
            self.support_files.clone(),
            self.wizards.clone(),
        ]);
        roots
    }

    /// Directories that are never removed when emptied by a rollback
    pub fn protected_roots(&self) -> Vec<PathBuf> {
        let mut roots = self.destination_roots();
        roots.extend([self.home.clone(), self.extensions.clone()]);
        roots
    }

    pub fn extension_dir(&self, id: &Identifier) -> PathBuf {
        self.extensions.join(id.as_str())
    }

    pub fn pending_uninstall_file(&self) -> PathBuf {
        self.extensions.join("pendinguninstall")
    }

    pub fn refcount_file(&self) -> PathBuf {
        self.extensions.join("refcounts.db")
    }
}
