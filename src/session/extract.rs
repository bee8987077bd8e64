//! Extraction of a package into a session workspace.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::FileTime;
use zip::ZipArchive;

use crate::config::TargetSuffix;
use crate::{ArchivePath, Compression, Error, Result, safety, timestamp};

/// Offset of the general purpose flag inside a local file header.
const LOCAL_HEADER_FLAGS_OFFSET: u64 = 6;

/// An entry of the source package as extracted into the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Index of the entry in the archive.
    pub index: usize,
    /// Archive-relative name.
    pub path: ArchivePath,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Compression the entry was stored with.
    pub compression: Compression,
    /// Modification time recorded in the archive, if valid.
    pub modified: Option<SystemTime>,
}

/// The entry exposed for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    /// Archive-relative name.
    pub name: ArchivePath,
    /// Location of the extracted file inside the workspace.
    pub path: PathBuf,
    /// Modification time of the extracted file, captured right after
    /// extraction.
    pub created_at: SystemTime,
    /// Compression the entry was stored with.
    pub compression: Compression,
}

/// Everything extracted from one package.
#[derive(Debug)]
pub(crate) struct Extraction {
    pub(crate) entries: Vec<ExtractedEntry>,
    /// `None` when no file entry matched the suffix.
    pub(crate) target: Option<TargetEntry>,
}

/// Copies `source` into `workspace`, extracts every entry next to the copy,
/// and removes the copy again.
///
/// The first file entry whose name ends with `suffix` becomes the target.
/// Archived modification times are restored on every other file.
pub(crate) fn extract_archive(
    source: &Path,
    workspace: &Path,
    suffix: &TargetSuffix,
) -> Result<Extraction> {
    let mut copy = tempfile::Builder::new()
        .prefix(".source-")
        .suffix(".zip")
        .tempfile_in(workspace)?;
    {
        let mut input = File::open(source)?;
        io::copy(&mut input, copy.as_file_mut())?;
        copy.as_file_mut().flush()?;
    }

    let mut archive = ZipArchive::new(BufReader::new(copy.reopen()?))?;
    let mut headers = copy.reopen()?;

    let mut entries = Vec::with_capacity(archive.len());
    let mut target_index = None;
    let mut destinations = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;

        if file.enclosed_name().is_none() {
            return Err(Error::PathTraversal {
                entry_index: index,
                path: file.name().to_string(),
            });
        }
        let path = ArchivePath::from_entry_name(file.name())?;
        let dest = safety::validate_extract_path(&path, workspace, index)?;

        let flags = read_local_flags(&mut headers, file.header_start())?;
        let compression = Compression::from_entry(file.compression(), flags);
        let is_directory = file.is_dir();

        if is_directory {
            fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = BufWriter::new(File::create(&dest)?);
            io::copy(&mut file, &mut out)?;
            out.flush()?;

            if target_index.is_none() && suffix.matches(path.as_str()) {
                target_index = Some(entries.len());
            }
        }

        entries.push(ExtractedEntry {
            index,
            path,
            is_directory,
            size: file.size(),
            compression,
            modified: file.last_modified().and_then(timestamp::from_zip_datetime),
        });
        destinations.push(dest);
    }

    drop(archive);
    drop(headers);
    copy.close()?;

    for (position, (entry, dest)) in entries.iter().zip(&destinations).enumerate() {
        if entry.is_directory || Some(position) == target_index {
            continue;
        }
        if let Some(modified) = entry.modified {
            restore_mtime(dest, modified);
        }
    }

    let target = match target_index {
        Some(position) => {
            let entry = &entries[position];
            let path = destinations.swap_remove(position);
            let created_at = fs::metadata(&path)?.modified()?;
            log::debug!(
                "Target entry {} extracted to {}",
                entry.path,
                path.display()
            );
            Some(TargetEntry {
                name: entry.path.clone(),
                path,
                created_at,
                compression: entry.compression,
            })
        }
        None => None,
    };

    Ok(Extraction { entries, target })
}

/// Reads the general purpose flag of the local header at `header_start`.
fn read_local_flags(file: &mut File, header_start: u64) -> io::Result<u16> {
    let mut flags = [0u8; 2];
    file.seek(SeekFrom::Start(header_start + LOCAL_HEADER_FLAGS_OFFSET))?;
    file.read_exact(&mut flags)?;
    Ok(u16::from_le_bytes(flags))
}

fn restore_mtime(path: &Path, modified: SystemTime) {
    if let Err(e) = filetime::set_file_mtime(path, FileTime::from_system_time(modified)) {
        log::warn!(
            "Failed to restore modification time on '{}': {}",
            path.display(),
            e
        );
    }
}
