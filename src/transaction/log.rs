//! Write-ahead log of file transactions
//!
//! The log file is plain text with one record per line:
//!
//! ```text
//! intent	/app/PlugIns/viewer.so
//! done	/app/PlugIns/viewer.so
//! intent	/app/Help/viewer/index.html
//! ```
//!
//! An `intent` is written and flushed before a transaction runs, a `done`
//! after it succeeded. After a crash the log is read back and every
//! transaction up to the last `done` record is rolled back. Intents past it
//! mark the crash point and are treated as never executed.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::Transaction;
use crate::error::{AebError, Result, fs as fs_error, transaction};
use crate::progress::{Progress, ProgressLevel, percent};
use crate::refcount::ReferenceCountDatabase;

const INTENT: &str = "intent";
const DONE: &str = "done";

/// Ordered transactions plus the number already applied
#[derive(Debug, Default)]
pub struct TransactionLog {
    transactions: Vec<Transaction>,
    next: usize,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction; only possible before anything has run
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<()> {
        if self.next != 0 {
            return Err(transaction::failed(
                "cannot add to a transaction log that has already run",
            ));
        }
        self.transactions.push(transaction);
        Ok(())
    }

    #[cfg(test)]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Number of transactions applied
    pub fn next(&self) -> usize {
        self.next
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Run the remaining transactions, recording each in `log_path`
    ///
    /// Fails without touching anything if `log_path` already exists. Stops at
    /// the first failing transaction; the caller is expected to roll back.
    pub fn execute(
        &mut self,
        log_path: &Path,
        message: &str,
        refcounts: &mut ReferenceCountDatabase,
        progress: &mut dyn Progress,
    ) -> Result<()> {
        if fs::symlink_metadata(log_path).is_ok() {
            return Err(transaction::unresolved_log(log_path));
        }
        if let Some(dir) = log_path.parent() {
            fs::create_dir_all(dir).map_err(|e| fs_error::write_failed(log_path, e))?;
        }
        let mut file = OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(log_path)
            .map_err(|e| fs_error::write_failed(log_path, e))?;

        let total = self.transactions.len();
        progress.update(message, percent(self.next, total), ProgressLevel::Normal);

        while self.next < total {
            let current = &self.transactions[self.next];
            let destination = current.destination().to_string_lossy().into_owned();
            if destination.contains(['\n', '\r']) {
                let err = transaction::failed(format!("unsupported file name: {destination:?}"));
                progress.update(&err.to_string(), percent(self.next, total), ProgressLevel::Error);
                return Err(err);
            }

            record(&mut file, log_path, INTENT, &destination)?;
            if let Err(err) = current.execute(refcounts) {
                warn!(path = %destination, error = %err, "transaction failed");
                progress.update(&err.to_string(), percent(self.next, total), ProgressLevel::Error);
                return Err(err);
            }
            record(&mut file, log_path, DONE, &destination)?;

            self.next += 1;
            progress.update(message, percent(self.next, total), ProgressLevel::Normal);
        }

        info!(count = total, log = %log_path.display(), "transactions applied");
        Ok(())
    }

    /// Undo every applied transaction in reverse order
    ///
    /// Any failure leaves the installation in an indeterminate state.
    pub fn rollback(
        &mut self,
        message: &str,
        refcounts: &mut ReferenceCountDatabase,
        protected: &[PathBuf],
        progress: &mut dyn Progress,
    ) -> Result<()> {
        let total = self.next;
        progress.update(message, 0, ProgressLevel::Normal);

        while self.next > 0 {
            let current = &self.transactions[self.next - 1];
            if let Err(err) = current.rollback(refcounts, protected) {
                let err = match err {
                    AebError::IndeterminateState { .. } => err,
                    other => transaction::indeterminate(other.to_string()),
                };
                progress.update(&err.to_string(), percent(total - self.next, total), ProgressLevel::Error);
                return Err(err);
            }
            self.next -= 1;
            progress.update(message, percent(total - self.next, total), ProgressLevel::Normal);
        }

        debug!(count = total, "transactions rolled back");
        Ok(())
    }

    /// Rebuild a log from its file
    ///
    /// The rebuilt transactions have no source and can only be rolled back. A
    /// missing file yields an empty log. A final line without a newline is a
    /// record that was cut off mid-write and is ignored.
    pub fn deserialize(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(fs_error::read_failed(path, e)),
        };

        let complete = match text.rfind('\n') {
            Some(end) => &text[..=end],
            None => "",
        };
        if complete.len() < text.len() {
            warn!(log = %path.display(), "ignoring truncated final record");
        }

        let mut log = Self::new();
        for (index, line) in complete.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let invalid = |reason: String| transaction::invalid_log(path, format!("line {}: {reason}", index + 1));
            let (kind, destination) = line
                .split_once('\t')
                .ok_or_else(|| invalid("malformed record".to_string()))?;

            match kind {
                // Intents after the last completion were never applied
                INTENT => log
                    .transactions
                    .push(Transaction::from_destination(PathBuf::from(destination))),
                // A completion closes the latest intent, and only once every
                // earlier intent is closed
                DONE => match log.transactions.last() {
                    Some(last)
                        if log.next + 1 == log.transactions.len()
                            && last.destination() == Path::new(destination) =>
                    {
                        log.next += 1;
                    }
                    _ => {
                        return Err(invalid(format!(
                            "completion of {destination} does not match its intent"
                        )));
                    }
                },
                other => return Err(invalid(format!("unknown record '{other}'"))),
            }
        }
        Ok(log)
    }
}

fn record(file: &mut fs::File, log_path: &Path, kind: &str, destination: &str) -> Result<()> {
    writeln!(file, "{kind}\t{destination}")
        .and_then(|()| file.flush())
        .and_then(|()| file.sync_data())
        .map_err(|e| fs_error::write_failed(log_path, e))
}
