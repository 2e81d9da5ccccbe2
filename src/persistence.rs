//! Snapshot Persistence
//!
//! Owns the exclusively-locked backing file. The file holds one JSON object
//! mapping each key to `{"data": <value>, "expiry": <unix seconds or -1>}`
//! and is rewritten wholesale after every mutation.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cache::{CacheEntry, Expiry};
use crate::error::{OpenError, Result};

// == Snapshot Records ==
/// One persisted entry as read from disk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SnapshotRecord {
    pub data: Value,
    pub expiry: i64,
}

#[derive(Serialize)]
struct RecordRef<'a> {
    data: &'a Value,
    expiry: i64,
}

// == Snapshot File ==
/// Backing file holding an advisory exclusive lock for its whole lifetime.
///
/// Dropping the handle closes the descriptor, which releases the lock.
#[derive(Debug)]
pub struct SnapshotFile {
    path: PathBuf,
    file: File,
}

impl SnapshotFile {
    // == Open ==
    /// Opens (creating if absent) and exclusively locks the backing file.
    ///
    /// Existing content is left in place until the first write. Fails with
    /// [`OpenError::Locked`] if another open file description holds the lock.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| OpenError::io(&path, err))?;

        match lock_exclusive(&file) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                return Err(OpenError::Locked { path });
            }
            Err(err) => return Err(OpenError::io(&path, err)),
        }

        debug!("Locked backing file {}", path.display());
        Ok(Self { path, file })
    }

    // == Read Entries ==
    /// Reads every well-formed record currently in the file.
    ///
    /// Empty or unparsable content yields no entries. Malformed records are
    /// skipped individually.
    pub fn read_entries(&mut self) -> Result<Vec<CacheEntry>> {
        let mut content = Vec::new();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.read_to_end(&mut content))
            .map_err(|err| OpenError::io(&self.path, err))?;

        Ok(parse_snapshot(&content, &self.path))
    }

    // == Write ==
    /// Replaces the file's content with a snapshot of `entries`.
    pub fn write<'a, I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a CacheEntry>,
    {
        let snapshot: BTreeMap<&str, RecordRef<'a>> = entries
            .into_iter()
            .map(|entry| {
                let record = RecordRef {
                    data: &entry.value,
                    expiry: entry.expiry.to_raw(),
                };
                (entry.key.as_str(), record)
            })
            .collect();

        let bytes = serde_json::to_vec(&snapshot)
            .map_err(|err| OpenError::io(&self.path, err.into()))?;

        self.file
            .set_len(0)
            .and_then(|_| self.file.seek(SeekFrom::Start(0)))
            .and_then(|_| self.file.write_all(&bytes))
            .and_then(|_| self.file.flush())
            .map_err(|err| OpenError::io(&self.path, err))
    }

    /// Flushes file content and metadata to the device.
    pub fn sync(&self) -> Result<()> {
        self.file
            .sync_all()
            .map_err(|err| OpenError::io(&self.path, err))
    }

    /// Releases the advisory lock ahead of closing the descriptor.
    pub fn unlock(&self) -> Result<()> {
        unlock(&self.file).map_err(|err| OpenError::io(&self.path, err))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_snapshot(content: &[u8], path: &Path) -> Vec<CacheEntry> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }

    let records: Map<String, Value> = match serde_json::from_slice(content) {
        Ok(records) => records,
        Err(err) => {
            warn!(
                "Ignoring unparsable snapshot in {}: {}",
                path.display(),
                err
            );
            return Vec::new();
        }
    };

    records
        .into_iter()
        .filter_map(
            |(key, raw)| match serde_json::from_value::<SnapshotRecord>(raw) {
                Ok(record) => Some(CacheEntry::new(
                    key,
                    record.data,
                    Expiry::from_raw(record.expiry),
                )),
                Err(err) => {
                    warn!("Skipping malformed record '{}': {}", key, err);
                    None
                }
            },
        )
        .collect()
}

// == Advisory Locking ==
#[cfg(unix)]
fn lock_exclusive(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if ret == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn unlock(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: as above.
    let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
    if ret == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &File) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "advisory file locking requires a unix platform",
    ))
}

#[cfg(not(unix))]
fn unlock(_file: &File) -> io::Result<()> {
    Ok(())
}
