//! Reference counts for content shared between extensions
//!
//! When two extensions ship a byte-identical file at the same destination the
//! file is installed once and its count raised. A file is only deleted when
//! its count drops to zero.
//!
//! Only counts above one are stored. A path without an entry counts 1 when
//! the file exists and 0 when it does not, so files installed by a single
//! extension never touch the database. An empty table has no file.
//!
//! On-disk format (`refcounts.db`):
//!
//! ```text
//! [8 bytes: "AEBREFC1"][u32 LE: entry count]
//! per entry: [u32 LE: path length][UTF-8 path][u32 LE: count]
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, transaction};

const MAGIC: &[u8; 8] = b"AEBREFC1";

/// Durable path to share-count map
#[derive(Debug)]
pub struct ReferenceCountDatabase {
    file: PathBuf,
    home: PathBuf,
    counts: BTreeMap<String, u32>,
}

impl ReferenceCountDatabase {
    /// Load the database at `file`; a missing file is an empty database
    ///
    /// Paths below `home` are stored relative to it.
    pub fn load(file: &Path, home: &Path) -> Result<Self> {
        let counts = match std::fs::read(file) {
            Ok(bytes) => decode(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(transaction::refcount(format!(
                    "cannot read {}: {e}",
                    file.display()
                )));
            }
        };
        Ok(Self {
            file: file.to_path_buf(),
            home: home.to_path_buf(),
            counts,
        })
    }

    /// Write the database atomically
    pub fn save(&self) -> Result<()> {
        self.write(&self.counts)
    }

    fn write(&self, counts: &BTreeMap<String, u32>) -> Result<()> {
        let fail = |e: &dyn std::fmt::Display| {
            transaction::refcount(format!("cannot write {}: {e}", self.file.display()))
        };
        if counts.is_empty() {
            return match std::fs::remove_file(&self.file) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(fail(&e)),
            };
        }

        let dir = self
            .file
            .parent()
            .ok_or_else(|| fail(&"no parent directory"))?;
        std::fs::create_dir_all(dir).map_err(|e| fail(&e))?;
        let mut temp = NamedTempFile::new_in(dir).map_err(|e| fail(&e))?;
        temp.write_all(&encode(counts))
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| fail(&e))?;
        temp.persist(&self.file).map_err(|e| fail(&e.error))?;
        Ok(())
    }

    fn key(&self, path: &Path) -> String {
        match path.strip_prefix(&self.home) {
            Ok(relative) => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }

    /// Current count of `path`
    pub fn count(&self, path: &Path) -> u32 {
        match self.counts.get(&self.key(path)) {
            Some(count) => *count,
            None => u32::from(path.exists()),
        }
    }

    /// Persist the new count first; memory is only updated once it is on disk
    fn store(&mut self, path: &Path, count: u32) -> Result<()> {
        let key = self.key(path);
        debug!(path = %key, count, "reference count");
        let mut counts = self.counts.clone();
        if count > 1 {
            counts.insert(key, count);
        } else {
            counts.remove(&key);
        }
        if counts == self.counts {
            return Ok(());
        }
        self.write(&counts)?;
        self.counts = counts;
        Ok(())
    }

    /// Raise the count of an existing file, returning the new count
    pub fn increment(&mut self, path: &Path) -> Result<u32> {
        let count = self.count(path).saturating_add(1);
        self.store(path, count)?;
        Ok(count)
    }

    /// Lower the count of `path`, returning the new count
    pub fn decrement(&mut self, path: &Path) -> Result<u32> {
        let count = self.count(path).saturating_sub(1);
        self.store(path, count)?;
        Ok(count)
    }

    /// Drop any stale entry for a file that was just copied fresh
    pub fn reset(&mut self, path: &Path) -> Result<()> {
        if self.counts.contains_key(&self.key(path)) {
            self.store(path, 1)?;
        }
        Ok(())
    }
}

fn encode(counts: &BTreeMap<String, u32>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(12 + counts.len() * 32);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&len_u32(counts.len()).to_le_bytes());
    for (path, count) in counts {
        buf.extend_from_slice(&len_u32(path.len()).to_le_bytes());
        buf.extend_from_slice(path.as_bytes());
        buf.extend_from_slice(&count.to_le_bytes());
    }
    buf
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn decode(data: &[u8]) -> Result<BTreeMap<String, u32>> {
    let corrupt = |reason: &str| transaction::refcount(format!("corrupt database: {reason}"));

    let Some(rest) = data.strip_prefix(MAGIC.as_slice()) else {
        return Err(corrupt("bad magic"));
    };
    let mut reader = ByteReader { data: rest };
    let entries = reader.u32().ok_or_else(|| corrupt("truncated header"))?;

    let mut counts = BTreeMap::new();
    for _ in 0..entries {
        let len = reader.u32().ok_or_else(|| corrupt("truncated entry"))?;
        let bytes = reader
            .take(len as usize)
            .ok_or_else(|| corrupt("truncated path"))?;
        let path = std::str::from_utf8(bytes).map_err(|_| corrupt("path is not UTF-8"))?;
        let count = reader.u32().ok_or_else(|| corrupt("truncated count"))?;
        counts.insert(path.to_string(), count);
    }
    if !reader.data.is_empty() {
        return Err(corrupt("trailing bytes"));
    }
    Ok(counts)
}

struct ByteReader<'a> {
    data: &'a [u8],
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.data.len() < len {
            return None;
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Some(head)
    }

    fn u32(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AebError;
    use crate::test_fixtures::create_temp_dir;

    fn database(home: &Path) -> ReferenceCountDatabase {
        ReferenceCountDatabase::load(&home.join("extensions/refcounts.db"), home).unwrap()
    }

    #[test]
    fn test_absent_entry_follows_file_existence() {
        let temp = create_temp_dir();
        let db = database(temp.path());
        let file = temp.path().join("Bin/tool");
        assert_eq!(db.count(&file), 0);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, b"x").unwrap();
        assert_eq!(db.count(&file), 1);
        assert!(db.counts.is_empty());
    }

    #[test]
    fn test_shared_file_counts_up_and_down() {
        let temp = create_temp_dir();
        let file = temp.path().join("PlugIns/shared.so");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, b"x").unwrap();

        let mut db = database(temp.path());
        assert_eq!(db.increment(&file).unwrap(), 2);
        assert_eq!(db.counts.len(), 1);

        let reloaded = database(temp.path());
        assert_eq!(reloaded.count(&file), 2);

        assert_eq!(db.decrement(&file).unwrap(), 1);
        assert!(db.counts.is_empty());
        assert!(!temp.path().join("extensions/refcounts.db").exists());
        assert_eq!(db.decrement(&file).unwrap(), 0);
    }

    #[test]
    fn test_failed_save_keeps_previous_count() {
        let temp = create_temp_dir();
        let file = temp.path().join("Bin/shared");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, b"x").unwrap();

        let mut db = database(temp.path());
        let db_path = temp.path().join("extensions/refcounts.db");
        std::fs::create_dir_all(&db_path).unwrap();

        let err = db.increment(&file).unwrap_err();
        assert!(matches!(err, AebError::RefCountDatabase { .. }));
        assert_eq!(db.count(&file), 1);
        assert!(db.counts.is_empty());

        std::fs::remove_dir(&db_path).unwrap();
        db.save().unwrap();
        assert_eq!(database(temp.path()).count(&file), 1);
        assert!(!db_path.exists());
    }

    #[test]
    fn test_keys_are_relative_to_home() {
        let temp = create_temp_dir();
        let db = database(temp.path());
        assert_eq!(db.key(&temp.path().join("Bin").join("tool")), "Bin/tool");

        let outside = create_temp_dir();
        let path = outside.path().join("plugin.so");
        assert_eq!(db.key(&path), path.to_string_lossy());
    }

    #[test]
    fn test_reset_clears_stale_entry() {
        let temp = create_temp_dir();
        let file = temp.path().join("Doc/readme");
        let mut db = database(temp.path());
        db.counts.insert("Doc/readme".to_string(), 5);
        db.reset(&file).unwrap();
        assert!(db.counts.is_empty());
    }

    #[test]
    fn test_encoding_layout() {
        let mut counts = BTreeMap::new();
        counts.insert("Bin/a".to_string(), 3);
        let bytes = encode(&counts);
        assert_eq!(&bytes[..8], b"AEBREFC1");
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &5u32.to_le_bytes());
        assert_eq!(&bytes[16..21], b"Bin/a");
        assert_eq!(&bytes[21..25], &3u32.to_le_bytes());
        assert_eq!(decode(&bytes).unwrap(), counts);
    }

    #[test]
    fn test_corrupt_database_is_reported() {
        let temp = create_temp_dir();
        let file = temp.path().join("refcounts.db");
        for bytes in [&b"NOTMAGIC"[..], &b"AEBREFC1\x01\x00\x00\x00\x09"[..]] {
            std::fs::write(&file, bytes).unwrap();
            let err = ReferenceCountDatabase::load(&file, temp.path()).unwrap_err();
            assert!(matches!(err, AebError::RefCountDatabase { .. }));
        }
    }
}
