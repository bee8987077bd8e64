//! Rebuilding a zip package from a workspace directory.
//!
//! The [`Repacker`] walks a directory, names every regular file by its path
//! relative to that directory, and writes them into a fresh zip archive. It
//! never opens the original package: whatever is in the directory is what
//! ends up in the output.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use zipsession::{Compression, Repacker};
//!
//! let result = Repacker::new(Compression::default())
//!     .repack(Path::new("workspace"), Path::new("deck.apkg"))?;
//! println!("{} entries, {} bytes", result.entries_written, result.compressed_size);
//! # Ok::<(), zipsession::Error>(())
//! ```

use std::collections::BTreeMap;
use std::fs::{File, Metadata};
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;
use zip::ZipWriter;

use crate::{ArchivePath, Compression, Error, Result, timestamp};

/// Entries at or above this size are written with zip64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// A regular file found in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFile {
    /// Name the file gets inside the archive.
    pub name: ArchivePath,
    /// Location on disk.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Modification time.
    pub modified: SystemTime,
    /// Unix permission bits, where the platform has them.
    pub mode: Option<u32>,
}

/// Summary of a repack.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepackResult {
    /// Number of entries in the new archive.
    pub entries_written: usize,
    /// Uncompressed bytes written.
    pub total_bytes: u64,
    /// Size of the finished archive.
    pub compressed_size: u64,
}

impl RepackResult {
    /// Returns the compression ratio (archive size / total bytes).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.total_bytes as f64
        }
    }
}

/// Writes workspace directories into zip archives.
#[derive(Debug, Clone, Default)]
pub struct Repacker {
    compression: Compression,
    order: Vec<ArchivePath>,
}

impl Repacker {
    /// Creates a repacker that compresses every entry with `compression`.
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            order: Vec::new(),
        }
    }

    /// Sets names that are written first, in the given order.
    ///
    /// Names with no matching file are ignored. Files not listed follow in
    /// name order.
    pub fn entry_order<I>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = ArchivePath>,
    {
        self.order = order.into_iter().collect();
        self
    }

    /// Returns the compression applied to every entry.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Lists the files under `dir` in the order they would be written.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArchivePath`] if a file name is not valid UTF-8
    /// - [`Error::EntryExists`] if two files map to the same entry name
    /// - [`Error::Io`] if the directory cannot be walked
    pub fn collect(&self, dir: &Path) -> Result<Vec<WorkspaceFile>> {
        let mut found = BTreeMap::new();

        for entry in WalkDir::new(dir).min_depth(1).follow_links(false) {
            let entry = entry?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !file_type.is_file() {
                log::warn!("Skipping non-regular file {}", entry.path().display());
                continue;
            }

            let relative = entry.path().strip_prefix(dir).map_err(|_| {
                Error::InvalidArchivePath(entry.path().display().to_string())
            })?;
            let name = ArchivePath::from_relative_path(relative)?;
            let metadata = entry.metadata()?;

            let file = WorkspaceFile {
                name: name.clone(),
                path: entry.path().to_path_buf(),
                size: metadata.len(),
                modified: metadata.modified()?,
                mode: unix_mode(&metadata),
            };
            if found.insert(name, file).is_some() {
                return Err(Error::EntryExists {
                    path: relative.display().to_string(),
                });
            }
        }

        let mut ordered = Vec::with_capacity(found.len());
        for name in &self.order {
            if let Some(file) = found.remove(name) {
                ordered.push(file);
            }
        }
        ordered.extend(found.into_values());
        Ok(ordered)
    }

    /// Writes the contents of `dir` as a zip archive into `writer`.
    ///
    /// Returns the writer positioned at the end of the archive.
    pub fn write_to<W: Write + Seek>(&self, dir: &Path, writer: W) -> Result<(RepackResult, W)> {
        let files = self.collect(dir)?;
        self.write_files(&files, writer)
    }

    /// Repacks `dir` into a new archive at `output`.
    ///
    /// The archive is built in a temporary file next to `output` and moved
    /// into place only once complete. On failure nothing is left at
    /// `output`. The new file is created with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] with [`io::ErrorKind::AlreadyExists`] if
    /// `output` already exists, in addition to the errors of
    /// [`collect`](Self::collect).
    pub fn repack(&self, dir: &Path, output: &Path) -> Result<RepackResult> {
        let files = self.collect(dir)?;

        let parent = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(".zipsession-")
            .suffix(".tmp")
            .tempfile_in(parent)?;

        let (result, writer) = self.write_files(&files, BufWriter::new(temp.as_file_mut()))?;
        let file = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        file.sync_all()?;

        temp.persist_noclobber(output)
            .map_err(|e| Error::Io(e.error))?;

        log::debug!(
            "Repacked {} entries into {} ({} bytes)",
            result.entries_written,
            output.display(),
            result.compressed_size
        );
        Ok(result)
    }

    fn write_files<W: Write + Seek>(
        &self,
        files: &[WorkspaceFile],
        writer: W,
    ) -> Result<(RepackResult, W)> {
        let mut zip = ZipWriter::new(writer);
        let mut result = RepackResult::default();

        for file in files {
            let mut options = self
                .compression
                .file_options()
                .last_modified_time(timestamp::to_zip_datetime(file.modified))
                .large_file(file.size >= ZIP64_THRESHOLD);
            if let Some(mode) = file.mode {
                options = options.unix_permissions(mode);
            }

            zip.start_file(file.name.as_str(), options)?;
            let mut input = File::open(&file.path)?;
            result.total_bytes += io::copy(&mut input, &mut zip)?;
            result.entries_written += 1;
        }

        let mut writer = zip.finish()?;
        result.compressed_size = writer.stream_position()?;
        Ok((result, writer))
    }
}

#[cfg(unix)]
fn unix_mode(metadata: &Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &Metadata) -> Option<u32> {
    None
}
