//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use filetime::FileTime;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};
use zipsession::Configuration;

/// Entry modification time used by [`create_zip`] (2021-06-01 12:00:00).
pub fn fixed_datetime() -> zip::DateTime {
    zip::DateTime::from_date_and_time(2021, 6, 1, 12, 0, 0).expect("valid date")
}

/// Writes a zip archive with deflated entries.
///
/// Names ending in `/` become directory entries.
pub fn create_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(fixed_datetime());
    create_zip_with(path, entries, options);
}

/// Writes a zip archive with the given options for every entry.
pub fn create_zip_with(path: &Path, entries: &[(&str, &[u8])], options: SimpleFileOptions) {
    let file = File::create(path).expect("create archive");
    let mut zip = ZipWriter::new(file);
    for (name, data) in entries {
        if let Some(dir) = name.strip_suffix('/') {
            zip.add_directory(dir, options).expect("add directory");
        } else {
            zip.start_file(*name, options).expect("start file");
            zip.write_all(data).expect("write entry");
        }
    }
    zip.finish().expect("finish archive");
}

/// Reads every file entry of an archive as (name, content), in archive order.
pub fn read_zip_contents(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).expect("open archive")).expect("read zip");
    let mut contents = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).expect("entry");
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data).expect("read entry");
        contents.push((file.name().to_string(), data));
    }
    contents
}

/// Returns the compression method of every entry, in archive order.
pub fn read_zip_methods(path: &Path) -> Vec<CompressionMethod> {
    let mut archive = ZipArchive::new(File::open(path).expect("open archive")).expect("read zip");
    (0..archive.len())
        .map(|index| archive.by_index(index).expect("entry").compression())
        .collect()
}

/// Overwrites `path` and moves its modification time clearly forward.
///
/// File systems with coarse timestamps may otherwise record the same time
/// as the extraction.
pub fn edit_file(path: &Path, data: &[u8]) {
    fs::write(path, data).expect("write target");
    bump_mtime(path);
}

/// Moves the modification time of `path` ten seconds into the future.
pub fn bump_mtime(path: &Path) {
    let later = SystemTime::now() + Duration::from_secs(10);
    filetime::set_file_mtime(path, FileTime::from_system_time(later)).expect("set mtime");
}

/// Lists the entries of a scratch root directory.
pub fn scratch_entries(root: &Path) -> Vec<PathBuf> {
    fs::read_dir(root)
        .expect("read scratch root")
        .map(|entry| entry.expect("dir entry").path())
        .collect()
}

/// An archive plus a private scratch root, both in temporary directories.
pub struct Fixture {
    pub dir: TempDir,
    pub scratch: TempDir,
    pub archive: PathBuf,
}

impl Fixture {
    /// Creates `deck.apkg` with the given entries.
    pub fn new(entries: &[(&str, &[u8])]) -> Self {
        Self::named("deck.apkg", entries)
    }

    /// Creates an archive called `name` with the given entries.
    pub fn named(name: &str, entries: &[(&str, &[u8])]) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let scratch = TempDir::new().expect("scratch dir");
        let archive = dir.path().join(name);
        create_zip(&archive, entries);
        Self {
            dir,
            scratch,
            archive,
        }
    }

    /// A configuration for this fixture's archive and scratch root.
    pub fn config(&self, suffix: &str) -> Configuration {
        Configuration::new(&self.archive, suffix)
            .expect("valid suffix")
            .scratch_root(self.scratch.path())
    }

    /// The default backup location of the archive.
    pub fn backup(&self) -> PathBuf {
        zipsession::session::backup_path(&self.archive, zipsession::DEFAULT_BACKUP_MARKER)
            .expect("backup path")
    }

    /// Asserts that no scratch workspace is left behind.
    pub fn assert_scratch_empty(&self) {
        let left = scratch_entries(self.scratch.path());
        assert!(left.is_empty(), "scratch directories left behind: {:?}", left);
    }
}
