//! Reading extension bundles
//!
//! A bundle is either a zip archive (`.aeb`) or a loose directory tree whose
//! root holds `install.rdf`. Both carry the same layout:
//!
//! ```text
//! install.rdf
//! content/<Component>/...            installed on every platform
//! platform/<platform-id>/<Component>/...   installed on that platform only
//! ```
//!
//! Files referenced from the manifest (icon, licenses, splash screens) are
//! addressed with `aeb:///relative/path` URLs.

pub mod destination;
pub mod entry;

#[cfg(test)]
mod tests;

pub use destination::map_destinations;
pub use entry::{ContentEntry, ContentLocator};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use tempfile::NamedTempFile;
use url::Url;
use zip::ZipArchive;

use crate::domain::Platform;
use crate::error::{Result, bundle, fs as fs_error, transaction};
use crate::manifest::{Manifest, io as manifest_io, rdf::TripleStore};

/// Name of the manifest inside every bundle
pub const MANIFEST_NAME: &str = "install.rdf";
/// Prefix of content installed on every platform
pub const CONTENT_PREFIX: &str = "content";

/// Buffer size used for copying and comparing content
pub const BUFFER_SIZE: usize = 1024 * 1024;

#[derive(Debug)]
enum Source {
    Archive(PathBuf),
    /// Directory holding `install.rdf`
    Loose(PathBuf),
}

/// Read access to one bundle
pub struct BundleReader {
    path: PathBuf,
    source: Source,
    platform: Platform,
    archive: RefCell<Option<ZipArchive<File>>>,
}

impl std::fmt::Debug for BundleReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleReader")
            .field("path", &self.path)
            .field("source", &self.source)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl BundleReader {
    /// Open a bundle archive, a loose `install.rdf`, or a directory holding one
    pub fn open(path: &Path, platform: &Platform) -> Result<Self> {
        let source = if path.is_dir() {
            Source::Loose(path.to_path_buf())
        } else if path.is_file() {
            let is_manifest = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("rdf"));
            if is_manifest {
                let dir = path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
                Source::Loose(dir)
            } else {
                Source::Archive(path.to_path_buf())
            }
        } else {
            return Err(bundle::not_found(path.display().to_string()));
        };

        Ok(Self {
            path: path.to_path_buf(),
            source,
            platform: platform.clone(),
            archive: RefCell::new(None),
        })
    }

    /// Path the bundle was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_archive(&self) -> bool {
        matches!(self.source, Source::Archive(_))
    }

    /// Run `f` against the archive, opening it on first use
    fn with_archive<T>(&self, f: impl FnOnce(&mut ZipArchive<File>) -> Result<T>) -> Result<T> {
        let Source::Archive(path) = &self.source else {
            return Err(fs_error::io_error("bundle is not an archive"));
        };
        let mut slot = self.archive.borrow_mut();
        if slot.is_none() {
            let file = File::open(path).map_err(|e| fs_error::read_failed(path, e))?;
            *slot = Some(ZipArchive::new(file)?);
        }
        match slot.as_mut() {
            Some(archive) => f(archive),
            None => Err(fs_error::io_error("archive unavailable")),
        }
    }

    /// Parse and complete the bundle manifest
    ///
    /// License texts are loaded from the license URLs and must not be empty.
    pub fn manifest(&self) -> Result<Manifest> {
        let bytes = self
            .read_relative(MANIFEST_NAME)
            .map_err(|_| bundle::parse_failed(format!("{MANIFEST_NAME} is missing from the bundle")))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| bundle::parse_failed(format!("{MANIFEST_NAME} is not valid UTF-8")))?;
        let store = TripleStore::parse(&text).map_err(bundle::parse_failed)?;
        let mut manifest = manifest_io::from_store(&store, &self.platform)?;

        for url in &manifest.license_urls {
            let bytes = self.read_bytes(url)?;
            if bytes.is_empty() {
                return Err(bundle::parse_failed(format!("Invalid license file: {url}")));
            }
            manifest
                .licenses
                .push(String::from_utf8_lossy(&bytes).into_owned());
        }
        manifest.source = Some(self.path.clone());
        Ok(manifest)
    }

    fn prefixes(&self) -> [String; 2] {
        [CONTENT_PREFIX.to_string(), self.platform.content_prefix()]
    }

    /// Every file under `content/` and `platform/<id>/`
    pub fn content_entries(&self) -> Result<Vec<ContentEntry>> {
        match &self.source {
            Source::Archive(_) => self.archive_entries(),
            Source::Loose(dir) => {
                let mut entries = Vec::new();
                for prefix in self.prefixes() {
                    loose_entries(&dir.join(&prefix), &mut entries)?;
                }
                Ok(entries)
            }
        }
    }

    fn archive_entries(&self) -> Result<Vec<ContentEntry>> {
        let prefixes = self.prefixes();
        self.with_archive(|archive| {
            let mut entries = Vec::new();
            for index in 0..archive.len() {
                let file = archive.by_index(index)?;
                if file.is_dir() {
                    continue;
                }
                let name = file.name().to_string();
                let Some(relative) = prefixes.iter().find_map(|prefix| {
                    name.strip_prefix(prefix.as_str())
                        .and_then(|rest| rest.strip_prefix('/'))
                }) else {
                    continue;
                };
                if file.enclosed_name().is_none() {
                    return Err(bundle::invalid_content_path(name.clone()));
                }
                entries.push(ContentEntry::new(
                    relative,
                    file.size(),
                    ContentLocator::Zip(index),
                ));
            }
            Ok(entries)
        })
    }

    /// Entry addressed by an `aeb:` URL
    pub fn entry(&self, url: &str) -> Result<ContentEntry> {
        let relative = resolve_url(url)?;
        self.entry_at(&relative)
            .ok_or_else(|| bundle::missing_file(url))?
    }

    fn entry_at(&self, relative: &str) -> Option<Result<ContentEntry>> {
        match &self.source {
            Source::Loose(dir) => {
                let path = dir.join(relative);
                let meta = fs::metadata(&path).ok().filter(fs::Metadata::is_file)?;
                Some(Ok(ContentEntry::new(
                    relative,
                    meta.len(),
                    ContentLocator::File(path),
                )))
            }
            Source::Archive(_) => {
                let found = self.with_archive(|archive| {
                    for index in 0..archive.len() {
                        let file = archive.by_index(index)?;
                        if !file.is_dir() && file.name() == relative {
                            return Ok(Some(ContentEntry::new(
                                relative,
                                file.size(),
                                ContentLocator::Zip(index),
                            )));
                        }
                    }
                    Ok(None)
                });
                found.transpose()
            }
        }
    }

    fn read_relative(&self, relative: &str) -> Result<Vec<u8>> {
        let entry = self
            .entry_at(relative)
            .ok_or_else(|| bundle::missing_file(relative))??;
        self.read_entry(&entry)
    }

    /// Whole contents of the file addressed by an `aeb:` URL
    pub fn read_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let entry = self.entry(url)?;
        self.read_entry(&entry)
    }

    pub fn read_entry(&self, entry: &ContentEntry) -> Result<Vec<u8>> {
        self.with_reader(entry, |reader| {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            Ok(bytes)
        })
    }

    fn with_reader<T>(&self, entry: &ContentEntry, f: impl FnOnce(&mut dyn Read) -> Result<T>) -> Result<T> {
        match &entry.locator {
            ContentLocator::File(path) => {
                let file = File::open(path).map_err(|e| fs_error::read_failed(path, e))?;
                f(&mut BufReader::with_capacity(BUFFER_SIZE, file))
            }
            ContentLocator::Zip(index) => self.with_archive(|archive| {
                let mut file = archive.by_index(*index)?;
                f(&mut file)
            }),
        }
    }

    /// Copy an entry to `dest` through a temporary file in the same directory
    pub fn install_file(&self, entry: &ContentEntry, dest: &Path) -> Result<()> {
        let fail = |e: &dyn std::fmt::Display| {
            transaction::failed(format!("{} -> {}: {e}", entry.path, dest.display()))
        };
        let parent = dest
            .parent()
            .ok_or_else(|| fail(&"destination has no parent directory"))?;
        fs::create_dir_all(parent).map_err(|e| fail(&e))?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| fail(&e))?;
        self.with_reader(entry, |reader| {
            let mut buffered = BufReader::with_capacity(BUFFER_SIZE, reader);
            std::io::copy(&mut buffered, temp.as_file_mut())?;
            temp.as_file().sync_all()?;
            Ok(())
        })
        .map_err(|e| fail(&e))?;
        temp.persist(dest).map_err(|e| fail(&e.error))?;
        Ok(())
    }

    /// Whether `dest` holds exactly the bytes of `entry`
    pub fn compare_file(&self, entry: &ContentEntry, dest: &Path) -> Result<bool> {
        let Ok(meta) = fs::metadata(dest) else {
            return Ok(false);
        };
        if !meta.is_file() || meta.len() != entry.size {
            return Ok(false);
        }
        let installed = File::open(dest).map_err(|e| fs_error::read_failed(dest, e))?;
        self.with_reader(entry, |reader| Ok(same_contents(reader, installed)?))
    }
}

/// Chunked comparison of two streams with fixed size buffers
fn same_contents(mut a: impl Read, mut b: impl Read) -> std::io::Result<bool> {
    let mut left = vec![0u8; BUFFER_SIZE];
    let mut right = vec![0u8; BUFFER_SIZE];
    loop {
        let read_left = fill(&mut a, &mut left)?;
        let read_right = fill(&mut b, &mut right)?;
        if read_left != read_right || left[..read_left] != right[..read_right] {
            return Ok(false);
        }
        if read_left == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or the stream ends
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Breadth first listing of the files below `root`
fn loose_entries(root: &Path, entries: &mut Vec<ContentEntry>) -> Result<()> {
    if !root.is_dir() {
        return Ok(());
    }
    let mut queue = VecDeque::from([(root.to_path_buf(), String::new())]);
    while let Some((dir, prefix)) = queue.pop_front() {
        let mut children: Vec<_> = fs::read_dir(&dir)
            .map_err(|e| fs_error::read_failed(&dir, e))?
            .collect::<std::io::Result<_>>()
            .map_err(|e| fs_error::read_failed(&dir, e))?;
        children.sort_by_key(fs::DirEntry::file_name);

        for child in children {
            let name = child.file_name().to_string_lossy().into_owned();
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            let path = child.path();
            let meta = child.metadata().map_err(|e| fs_error::read_failed(&path, e))?;
            if meta.is_dir() {
                queue.push_back((path, relative));
            } else {
                entries.push(ContentEntry::new(relative, meta.len(), ContentLocator::File(path)));
            }
        }
    }
    Ok(())
}

/// Bundle relative path of an `aeb:` URL
pub fn resolve_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|_| bundle::missing_file(url))?;
    if parsed.scheme() != "aeb" {
        return Err(bundle::missing_file(url));
    }
    let raw = format!("{}{}", parsed.host_str().unwrap_or_default(), parsed.path());
    let decoded = percent_decode_str(&raw)
        .decode_utf8()
        .map_err(|_| bundle::missing_file(url))?;
    let relative = decoded.trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|part| part == "..") {
        return Err(bundle::invalid_content_path(url));
    }
    Ok(relative.to_string())
}
