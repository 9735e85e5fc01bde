//! Scheduling and processing extension removals
//!
//! Uninstalling only records the id in the `pendinguninstall` file. The files
//! are removed by [`InstallCoordinator::process_pending`], normally before
//! the host application loads any extension.

use std::path::{Component, Path};

use tracing::{info, warn};

use super::{InstallCoordinator, LOG_NAME, pending};
use crate::common::fs::purge_dir;
use crate::domain::Identifier;
use crate::error::{Result, deps, transaction};
use crate::progress::{Progress, ProgressLevel};
use crate::transaction::TransactionLog;

impl InstallCoordinator {
    /// Schedule `id` for removal
    ///
    /// Refused while another installed extension requires it. Scheduling an
    /// extension twice is a no-op.
    pub fn uninstall_extension(&mut self, id: &Identifier) -> Result<()> {
        let Some(target) = self.extensions.get(id) else {
            return Err(deps::not_installed(id.as_str()));
        };
        if self.is_pending_uninstall(id) {
            return Ok(());
        }

        let dependant = self
            .extensions
            .iter()
            .filter(|(other, _)| *other != id && !self.is_pending_uninstall(other))
            .find(|(_, other)| other.requires_extension(&self.host, target));
        if let Some((_, other)) = dependant {
            return Err(deps::required_by(other.display_name()));
        }

        pending::append(&self.layout.pending_uninstall_file(), id.as_str())?;
        self.pending_uninstall.insert(id.as_str().to_string());
        info!(id = %id, "extension scheduled for removal");
        Ok(())
    }

    /// Schedule every installed extension for removal
    pub fn uninstall_all(&mut self) -> Result<()> {
        if self.pending_uninstall.contains(pending::ALL) {
            return Ok(());
        }
        pending::append(&self.layout.pending_uninstall_file(), pending::ALL)?;
        self.pending_uninstall.insert(pending::ALL.to_string());
        info!("all extensions scheduled for removal");
        Ok(())
    }

    /// Scheduled removals in file order
    pub fn pending_uninstalls(&self) -> Result<Vec<String>> {
        pending::read(&self.layout.pending_uninstall_file())
    }

    /// Remove every scheduled extension
    ///
    /// Stops at the first failure and keeps the schedule so the remaining
    /// entries are retried later. Entries already processed are harmless to
    /// process again.
    pub fn process_pending(&mut self, progress: &mut dyn Progress) -> Result<()> {
        let path = self.layout.pending_uninstall_file();
        for raw in pending::read(&path)? {
            if raw == pending::ALL {
                while let Some(id) = self.extensions.keys().next().cloned() {
                    self.perform_uninstall(id.as_str(), progress)?;
                }
                continue;
            }
            self.perform_uninstall(&raw, progress)?;
        }

        pending::clear(&path)?;
        self.pending_uninstall.clear();
        Ok(())
    }

    /// Roll back the log of one extension directory and delete the directory
    fn perform_uninstall(&mut self, name: &str, progress: &mut dyn Progress) -> Result<()> {
        let mut parts = Path::new(name).components();
        if !matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None)) {
            warn!(entry = name, "ignoring invalid removal entry");
            progress.update(&format!("Ignoring invalid removal entry '{name}'"), 100, ProgressLevel::Warning);
            return Ok(());
        }

        let id = Identifier::new(name);
        let installed = self
            .extensions
            .get(&id)
            .map(|manifest| manifest.display_name().to_string());
        let dir = self.layout.extensions.join(name);
        if installed.is_none() && !dir.exists() {
            return Ok(());
        }

        let log_path = dir.join(LOG_NAME);
        let mut log = match TransactionLog::deserialize(&log_path) {
            Ok(log) => log,
            Err(err) => {
                progress.update(&err.to_string(), 0, ProgressLevel::Error);
                return Err(err);
            }
        };
        if log.is_empty() {
            warn!(entry = name, "no transaction log, removing the extension directory only");
            progress.update(
                &format!("No transaction log for {name}; its installed files stay in place"),
                0,
                ProgressLevel::Warning,
            );
        }
        let message = match &installed {
            Some(display) => format!("Uninstalling extension {display}"),
            None => format!("Recovering from partially installed extension {name}"),
        };
        let protected = self.layout.protected_roots();
        log.rollback(&message, &mut self.refcounts, &protected, progress)?;

        if let Err(e) = purge_dir(&dir) {
            let err = transaction::indeterminate(format!("cannot remove {}: {e}", dir.display()));
            progress.update(&err.to_string(), 100, ProgressLevel::Error);
            return Err(err);
        }

        self.extensions.remove(&id);
        self.pending_uninstall.remove(name);
        info!(entry = name, files = log.len(), "extension removed");
        Ok(())
    }
}
