//! Snapshot persistence for snapedit.
//!
//! Snapshots are JSON Lines files with one [`Entry`] per line:
//!
//! ```text
//! {"type":"point","namespace":"cpu","id":"load","value":"0.25","arrival_time":100}
//! {"type":"group","arrival_time":105,"points":[{"namespace":"mem","id":"used","value":"12","arrival_time":105}]}
//! ```
//!
//! Blank lines are ignored. Any other line that does not decode is an error:
//! a snapshot is either read completely or not at all.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use se_core::Entry;
use thiserror::Error;

/// Snapshot storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the file failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A line is not a valid entry.
    #[error("{}:{line}: {source}", path.display())]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    /// A line decoded, but describes an entry that cannot exist.
    #[error("{}:{line}: {message}", path.display())]
    InvalidEntry {
        path: PathBuf,
        line: usize,
        message: String,
    },
    /// The destination exists and overwriting was not allowed.
    #[error("{} already exists", .0.display())]
    Exists(PathBuf),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads every entry of a snapshot, in file order.
pub fn load_snapshot(path: &Path) -> Result<Vec<Entry>, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| StoreError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: Entry = serde_json::from_str(&line).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            line: line_num + 1,
            source,
        })?;
        if let Entry::Group(group) = &entry {
            if group.points.is_empty() {
                return Err(StoreError::InvalidEntry {
                    path: path.to_path_buf(),
                    line: line_num + 1,
                    message: "data group has no points".to_string(),
                });
            }
        }
        entries.push(entry);
    }

    tracing::debug!(path = %path.display(), entries = entries.len(), "loaded snapshot");
    Ok(entries)
}

/// Writes entries as a snapshot. Returns the number of entries written.
///
/// Fails with [`StoreError::Exists`] if `path` exists and `overwrite` is
/// false. The file is written next to its destination under a `.tmp`
/// extension and renamed into place once complete.
pub fn store_snapshot(path: &Path, entries: &[Entry], overwrite: bool) -> Result<usize, StoreError> {
    if !overwrite && path.exists() {
        return Err(StoreError::Exists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp_path = tmp_path_for(path);
    if let Err(e) = write_entries(&tmp_path, entries) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::io(path, e));
    }

    tracing::debug!(path = %path.display(), entries = entries.len(), "stored snapshot");
    Ok(entries.len())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_entries(path: &Path, entries: &[Entry]) -> Result<(), StoreError> {
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        serde_json::to_writer(&mut writer, entry).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            line: 0,
            source,
        })?;
        writer.write_all(b"\n").map_err(|e| StoreError::io(path, e))?;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))
}
