//! Reversible file installs
//!
//! A [`Transaction`] installs one file from a bundle. Executing it either
//! copies the file into place or, when an identical file is already there,
//! raises the file's reference count. Rolling it back undoes exactly that:
//! the count is lowered and the file is only deleted once nothing else
//! shares it.
//!
//! Transactions are grouped in a [`TransactionLog`], which records every step
//! on disk before and after it happens so an interrupted install can be
//! rolled back after a crash.

pub mod log;


pub use log::TransactionLog;

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, error};

use crate::bundle::{BundleReader, ContentEntry};
use crate::common::fs::remove_empty_parents;
use crate::error::{Result, transaction};
use crate::refcount::ReferenceCountDatabase;

/// A single file install
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Absent for transactions rebuilt from a log
    source: Option<(Rc<BundleReader>, ContentEntry)>,
    destination: PathBuf,
}

impl Transaction {
    pub fn new(reader: Rc<BundleReader>, entry: ContentEntry, destination: PathBuf) -> Self {
        Self {
            source: Some((reader, entry)),
            destination,
        }
    }

    /// Transaction that can only be rolled back
    pub fn from_destination(destination: PathBuf) -> Self {
        Self {
            source: None,
            destination,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn source(&self) -> Option<&ContentEntry> {
        self.source.as_ref().map(|(_, entry)| entry)
    }

    /// Put the file in place
    ///
    /// An existing destination must be byte-identical to the source; it is
    /// then shared and its reference count raised.
    pub fn execute(&self, refcounts: &mut ReferenceCountDatabase) -> Result<()> {
        let Some((reader, entry)) = &self.source else {
            return Err(transaction::failed(format!(
                "no source for {}",
                self.destination.display()
            )));
        };

        if fs::symlink_metadata(&self.destination).is_ok() {
            if !reader.compare_file(entry, &self.destination)? {
                return Err(transaction::failed(format!(
                    "{} already exists with different contents",
                    self.destination.display()
                )));
            }
            let count = refcounts.increment(&self.destination)?;
            debug!(path = %self.destination.display(), count, "shared existing file");
            return Ok(());
        }

        reader.install_file(entry, &self.destination)?;
        if let Err(err) = refcounts.reset(&self.destination) {
            // Not recorded as done, so rollback would never see this copy
            let _ = fs::remove_file(&self.destination);
            return Err(err);
        }
        debug!(path = %self.destination.display(), "installed file");
        Ok(())
    }

    /// Undo [`execute`](Self::execute)
    ///
    /// The file is deleted when its count reaches zero, followed by any
    /// parent directories left empty below the `protected` roots. A file that
    /// is already gone counts as reverted.
    pub fn rollback(
        &self,
        refcounts: &mut ReferenceCountDatabase,
        protected: &[PathBuf],
    ) -> Result<()> {
        let count = refcounts.decrement(&self.destination)?;
        if count > 0 {
            debug!(path = %self.destination.display(), count, "released shared file");
            return Ok(());
        }

        match fs::remove_file(&self.destination) {
            Ok(()) => {
                debug!(path = %self.destination.display(), "removed file");
                remove_empty_parents(&self.destination, protected);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!(path = %self.destination.display(), error = %e, "cannot remove file");
                Err(transaction::indeterminate(format!(
                    "cannot remove {}: {e}",
                    self.destination.display()
                )))
            }
        }
    }
}
