//! Append-only zip archive writer.
//!
//! The [`ArchiveWriter`] owns the archive for the duration of a build.
//! Entries are collected in insertion order and written when the archive
//! is closed; writing a path twice replaces the earlier contents in place.
//! Text-mode entries are stored with LF line endings, and every entry
//! carries the fixed zip epoch timestamp so identical inputs produce
//! identical archives.

use crate::{BundleError, BundleResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// How an input file is copied into the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Bytes are stored verbatim.
    Binary,
    /// Contents are decoded as UTF-8 and CRLF is normalized to LF.
    Text,
}

/// A file to include in the archive.
struct ArchiveEntry {
    /// Path within the archive.
    archive_path: String,
    /// File contents.
    contents: Vec<u8>,
}

/// Write handle to a compressed archive on disk.
///
/// Every entry stays in memory until [`ArchiveWriter::close`], so peak
/// memory is roughly the uncompressed size of all inputs, jars included.
/// Each input is read once and moved into the buffer without further
/// copies.
pub struct ArchiveWriter {
    path: PathBuf,
    file: Option<File>,
    entries: Vec<ArchiveEntry>,
    index: HashMap<String, usize>,
}

impl ArchiveWriter {
    /// Create a new archive at `destination`, creating parent directories.
    pub fn open<P: AsRef<Path>>(destination: P) -> BundleResult<Self> {
        let path = destination.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| BundleError::storage(&path, e))?;
        }
        let file = File::create(&path).map_err(|e| BundleError::storage(&path, e))?;

        Ok(Self {
            path,
            file: Some(file),
            entries: Vec::new(),
            index: HashMap::new(),
        })
    }

    /// Destination of the archive.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Number of distinct entries written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if an entry exists at `target_path`.
    #[must_use]
    pub fn contains(&self, target_path: &str) -> bool {
        self.index.contains_key(target_path)
    }

    /// Copy `source` to `<target_dir>/<basename(source)>`.
    ///
    /// An empty `source` is a no-op, used for optional inputs.
    pub fn add_file<P: AsRef<Path>>(
        &mut self,
        source: P,
        target_dir: &str,
        mode: FileMode,
    ) -> BundleResult<()> {
        let source = source.as_ref();
        if source.as_os_str().is_empty() {
            return Ok(());
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| BundleError::MissingFile(source.to_path_buf()))?
            .to_string_lossy();
        let target = join_archive_path(target_dir, &file_name);

        self.add_file_as(source, &target, mode)
    }

    /// Copy `source` to the explicit archive path `target_path`.
    pub fn add_file_as<P: AsRef<Path>>(
        &mut self,
        source: P,
        target_path: &str,
        mode: FileMode,
    ) -> BundleResult<()> {
        let source = source.as_ref();
        let contents = match mode {
            FileMode::Binary => read_source(source)?,
            FileMode::Text => read_text(source)?.into_bytes(),
        };

        self.insert(target_path, contents)
    }

    /// Mirror every file under `source_dir` into `target_dir` as text.
    ///
    /// Symbolic links are followed and stored under the link's own path.
    /// Files whose base name matches one of `exclusions` are skipped.
    /// Returns the number of files written.
    pub fn add_tree<P: AsRef<Path>>(
        &mut self,
        source_dir: P,
        target_dir: &str,
        exclusions: &[String],
    ) -> BundleResult<usize> {
        let source_dir = source_dir.as_ref();
        if !source_dir.is_dir() {
            return Err(BundleError::MissingFile(source_dir.to_path_buf()));
        }

        let excluded = build_glob_set(exclusions)?;
        let mut written = 0;

        for entry in WalkDir::new(source_dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| BundleError::io(source_dir, e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if excluded.is_match(entry.file_name()) {
                debug!(path = %entry.path().display(), "Excluded from archive");
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(source_dir) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let target = join_archive_path(target_dir, &relative);
            self.add_file_as(entry.path(), &target, FileMode::Text)?;
            written += 1;
        }

        Ok(written)
    }

    /// Store raw bytes at `target_path` without any normalization.
    pub fn write_bytes(&mut self, target_path: &str, content: &[u8]) -> BundleResult<()> {
        self.insert(target_path, content.to_vec())
    }

    /// Buffer `contents` at `target_path`, replacing an earlier entry in place.
    fn insert(&mut self, target_path: &str, contents: Vec<u8>) -> BundleResult<()> {
        if self.is_closed() {
            return Err(BundleError::ArchiveClosed(self.path.clone()));
        }

        let bytes = contents.len();
        match self.index.get(target_path) {
            Some(&position) => {
                self.entries[position].contents = contents;
                debug!(entry = target_path, bytes, "Replaced archive entry");
            }
            None => {
                self.index.insert(target_path.to_string(), self.entries.len());
                self.entries.push(ArchiveEntry {
                    archive_path: target_path.to_string(),
                    contents,
                });
                debug!(entry = target_path, bytes, "Added archive entry");
            }
        }
        Ok(())
    }

    /// Write every entry and finalize the archive. Calling it again is a
    /// no-op.
    pub fn close(&mut self) -> BundleResult<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        let entries = std::mem::take(&mut self.entries);
        self.index.clear();

        let storage = |e: zip::result::ZipError| {
            BundleError::storage(&self.path, std::io::Error::other(e))
        };

        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        for entry in &entries {
            zip.start_file(entry.archive_path.as_str(), options).map_err(storage)?;
            zip.write_all(&entry.contents)
                .map_err(|e| BundleError::storage(&self.path, e))?;
        }
        zip.finish().map_err(storage)?;

        debug!(path = %self.path.display(), entries = entries.len(), "Closed archive");
        Ok(())
    }
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "Failed to finalize archive on drop");
        }
    }
}

/// Replace every CRLF sequence with LF.
#[must_use]
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Join archive path segments with `/`, ignoring an empty directory.
fn join_archive_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn read_source(path: &Path) -> BundleResult<Vec<u8>> {
    if !path.exists() {
        return Err(BundleError::MissingFile(path.to_path_buf()));
    }
    fs::read(path).map_err(|e| BundleError::io(path, e))
}

fn read_text(path: &Path) -> BundleResult<String> {
    let bytes = read_source(path)?;
    let text = String::from_utf8(bytes).map_err(|_| BundleError::InvalidText(path.to_path_buf()))?;
    Ok(normalize_line_endings(&text))
}

fn build_glob_set(patterns: &[String]) -> BundleResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
