//! Install coordination
//!
//! The [`InstallCoordinator`] owns the registry of installed extensions and
//! drives every state change of the installation:
//!
//! - installing a bundle: checks, file transactions, then registration
//! - scheduling removals in the `pendinguninstall` file
//! - processing scheduled removals and recovering interrupted installs
//!
//! Each extension owns `<extensions>/<id>/`, which holds its installed
//! `install.rdf`, its `transactionlog.txt` and any manifest-referenced files
//! (icon, licenses, splash screens).

pub mod pending;
pub mod queries;
pub mod uninstall;


use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::bundle::{BundleReader, MANIFEST_NAME, map_destinations, resolve_url};
use crate::common::fs::remove_dir_if_empty;
use crate::config::{InstallerConfig, Layout};
use crate::domain::{HostApplication, Identifier};
use crate::error::{Result, bundle, deps, fs as fs_error, transaction};
use crate::manifest::{Manifest, io as manifest_io};
use crate::progress::{Progress, ProgressLevel};
use crate::refcount::ReferenceCountDatabase;
use crate::transaction::{Transaction, TransactionLog};

/// File name of the per-extension transaction log
pub const LOG_NAME: &str = "transactionlog.txt";

/// Registry of installed extensions plus the operations that change it
#[derive(Debug)]
pub struct InstallCoordinator {
    layout: Layout,
    host: HostApplication,
    refcounts: ReferenceCountDatabase,
    extensions: BTreeMap<Identifier, Manifest>,
    /// Raw entries of the `pendinguninstall` file
    pending_uninstall: BTreeSet<String>,
    pending_install: BTreeMap<Identifier, Manifest>,
}

impl InstallCoordinator {
    /// Load the installation described by `config`
    ///
    /// Every extension directory is scanned. Directories without a loadable
    /// manifest, or holding only a transaction log, are left behind by an
    /// interrupted install and are scheduled for removal.
    pub fn new(config: &InstallerConfig) -> Result<Self> {
        let layout = config.layout()?;
        let host = config.host()?;
        Self::open(layout, host)
    }

    pub fn open(layout: Layout, host: HostApplication) -> Result<Self> {
        fs::create_dir_all(&layout.extensions)
            .map_err(|e| fs_error::write_failed(&layout.extensions, e))?;
        let refcounts = ReferenceCountDatabase::load(&layout.refcount_file(), &layout.home)?;
        let pending_uninstall = pending::read(&layout.pending_uninstall_file())?
            .into_iter()
            .collect();

        let mut coordinator = Self {
            layout,
            host,
            refcounts,
            extensions: BTreeMap::new(),
            pending_uninstall,
            pending_install: BTreeMap::new(),
        };
        coordinator.scan()?;
        debug!(
            installed = coordinator.extensions.len(),
            pending = coordinator.pending_uninstall.len(),
            "installation loaded"
        );
        Ok(coordinator)
    }

    fn scan(&mut self) -> Result<()> {
        let root = self.layout.extensions.clone();
        let mut dirs: Vec<PathBuf> = fs::read_dir(&root)
            .map_err(|e| fs_error::read_failed(&root, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            let Some(name) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let manifest_path = dir.join(MANIFEST_NAME);
            let loaded = if manifest_path.is_file() {
                self.load_installed(&manifest_path)
            } else {
                None
            };

            match loaded {
                Some(manifest) => {
                    self.extensions.insert(manifest.id.clone(), manifest);
                }
                None => {
                    if !manifest_path.is_file() && !dir.join(LOG_NAME).is_file() {
                        continue;
                    }
                    warn!(dir = %dir.display(), "incomplete extension scheduled for removal");
                    if !self.pending_uninstall.contains(&name) {
                        pending::append(&self.layout.pending_uninstall_file(), &name)?;
                        self.pending_uninstall.insert(name);
                    }
                }
            }
        }
        Ok(())
    }

    fn load_installed(&self, manifest_path: &Path) -> Option<Manifest> {
        let result = BundleReader::open(manifest_path, &self.host.platform)
            .and_then(|reader| reader.manifest());
        match result {
            Ok(manifest) if manifest.validate(&self.host) => Some(manifest),
            Ok(manifest) => {
                warn!(
                    path = %manifest_path.display(),
                    reason = manifest.validation_error(&self.host).unwrap_or_default(),
                    "installed extension is invalid"
                );
                None
            }
            Err(err) => {
                warn!(path = %manifest_path.display(), error = %err, "cannot load installed extension");
                None
            }
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn host(&self) -> &HostApplication {
        &self.host
    }

    /// Install the bundle at `path`
    ///
    /// Nothing is left behind on failure: applied transactions are rolled
    /// back and the extension directory removed. Failures are reported on
    /// `progress` at error level as well as returned.
    pub fn install_extension(
        &mut self,
        path: &Path,
        progress: &mut dyn Progress,
    ) -> Result<Identifier> {
        match self.install(path, progress) {
            Ok(id) => Ok(id),
            Err(err) => {
                error!(bundle = %path.display(), error = %err, "install failed");
                progress.update(&err.to_string(), 0, ProgressLevel::Error);
                Err(err)
            }
        }
    }

    fn install(&mut self, path: &Path, progress: &mut dyn Progress) -> Result<Identifier> {
        let reader = Rc::new(BundleReader::open(path, &self.host.platform)?);
        let manifest = reader.manifest()?;
        self.check_installable(&manifest)?;

        let ext_dir = self.layout.extension_dir(&manifest.id);
        let log_path = ext_dir.join(LOG_NAME);
        if fs::symlink_metadata(&log_path).is_ok() {
            return Err(transaction::unresolved_log(&log_path));
        }
        let mut log = self.build_log(&reader, &manifest, &ext_dir)?;
        let created_roots: Vec<PathBuf> = self
            .layout
            .destination_roots()
            .into_iter()
            .filter(|root| fs::symlink_metadata(root).is_err())
            .collect();

        let message = format!("Installing {}", manifest.display_name());
        info!(id = %manifest.id, version = %manifest.version, files = log.len(), "installing extension");
        if let Err(err) = log.execute(&log_path, &message, &mut self.refcounts, progress) {
            self.abort(&mut log, &ext_dir, &created_roots, progress)?;
            return Err(err);
        }
        if let Err(err) = manifest_io::write_to_file(&manifest, &ext_dir.join(MANIFEST_NAME)) {
            self.abort(&mut log, &ext_dir, &created_roots, progress)?;
            return Err(err);
        }

        let id = manifest.id.clone();
        self.pending_install.remove(&id);
        self.extensions.insert(id.clone(), manifest);
        info!(id = %id, "extension installed");
        Ok(id)
    }

    /// Every precondition that does not touch the file system
    fn check_installable(&self, manifest: &Manifest) -> Result<()> {
        if let Some(reason) = manifest.validation_error(&self.host) {
            return Err(bundle::validation_failed(reason));
        }
        if self.extensions.contains_key(&manifest.id) {
            return Err(deps::already_installed(manifest.id.as_str()));
        }
        if self.is_pending_uninstall(&manifest.id) {
            return Err(deps::pending_removal(manifest.id.as_str()));
        }

        let active: BTreeMap<Identifier, Manifest> = self
            .extensions
            .iter()
            .filter(|(id, _)| !self.is_pending_uninstall(id))
            .map(|(id, m)| (id.clone(), m.clone()))
            .collect();
        manifest
            .meets_requirements(&self.host, &active)
            .map_err(deps::requirement_not_met)?;

        for installed in self.extensions.values() {
            if installed.is_incompatible(&self.host, manifest)
                || manifest.is_incompatible(&self.host, installed)
            {
                return Err(deps::incompatible(installed.display_name()));
            }
        }
        Ok(())
    }

    /// Content transactions followed by the manifest-referenced files
    fn build_log(
        &self,
        reader: &Rc<BundleReader>,
        manifest: &Manifest,
        ext_dir: &Path,
    ) -> Result<TransactionLog> {
        let entries = reader.content_entries()?;
        let destinations = map_destinations(&self.layout, &entries)?;

        let mut log = TransactionLog::new();
        for (entry, destination) in entries.into_iter().zip(destinations) {
            log.add_transaction(Transaction::new(Rc::clone(reader), entry, destination))?;
        }

        let referenced = manifest
            .icon_url
            .iter()
            .chain(&manifest.license_urls)
            .chain(&manifest.splash_screen_urls);
        for url in referenced {
            let entry = reader.entry(url)?;
            let destination = ext_dir.join(resolve_url(url)?);
            log.add_transaction(Transaction::new(Rc::clone(reader), entry, destination))?;
        }
        Ok(log)
    }

    /// Undo a failed install and remove what it created
    ///
    /// `created_roots` are the destination roots that did not exist before
    /// the install; they go too once empty. The log file is kept when the
    /// rollback itself fails so a later recovery can finish it.
    fn abort(
        &mut self,
        log: &mut TransactionLog,
        ext_dir: &Path,
        created_roots: &[PathBuf],
        progress: &mut dyn Progress,
    ) -> Result<()> {
        let protected = self.layout.protected_roots();
        log.rollback("Rolling back", &mut self.refcounts, &protected, progress)?;

        for file in [MANIFEST_NAME, LOG_NAME] {
            let path = ext_dir.join(file);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "cannot remove file"),
            }
        }
        remove_dir_if_empty(ext_dir);
        for root in created_roots {
            remove_dir_if_empty(root);
        }
        Ok(())
    }

    /// Installed extension by id
    pub fn extension(&self, id: &Identifier) -> Option<&Manifest> {
        self.extensions.get(id)
    }

    /// Installed extensions ordered by id
    pub fn extensions(&self) -> impl Iterator<Item = &Manifest> {
        self.extensions.values()
    }

    /// Whether `id` is scheduled for removal, individually or through `+all`
    pub fn is_pending_uninstall(&self, id: &Identifier) -> bool {
        self.pending_uninstall.contains(pending::ALL)
            || self.pending_uninstall.contains(id.as_str())
    }
}

impl Drop for InstallCoordinator {
    fn drop(&mut self) {
        if let Err(err) = self.refcounts.save() {
            warn!(error = %err, "cannot save reference counts");
        }
    }
}
