use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

mod archive;
mod atomic_io;
mod directory;

pub use archive::{ArchiveContainer, ArchiveStorage};
pub use directory::DirectoryStorage;

pub const SCRIPT_ENTRY: &str = "script.txt";
pub const TITLE_SEQUENCE_EXTENSION: &str = "parkseq";
pub const SAVE_EXTENSIONS: &[&str] = &["sc6", "sv6", "park", "sv4", "sc4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Archive,
    Directory,
}

impl StorageKind {
    /// Archives are recognised by extension only; everything else is a directory.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(TITLE_SEQUENCE_EXTENSION) => StorageKind::Archive,
            _ => StorageKind::Directory,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read/write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("archive at {path} has invalid format: {message}")]
    InvalidArchive { path: PathBuf, message: String },
    #[error("no entry named '{entry}' in {path}")]
    EntryNotFound { path: PathBuf, entry: String },
    #[error("an entry named '{entry}' already exists in {path}")]
    EntryExists { path: PathBuf, entry: String },
    #[error("cannot create title sequence at {path}: location already exists")]
    LocationExists { path: PathBuf },
    #[error("entry name '{entry}' must be a relative path inside the sequence")]
    InvalidEntryName { entry: String },
}

/// Named-entry access to the place a title sequence lives.
///
/// Every call opens what it needs and releases it before returning, so no handle
/// outlives a single operation.
pub trait SequenceStorage {
    fn location(&self) -> &Path;

    fn kind(&self) -> StorageKind;

    /// Creates the empty backing location. Fails if something already exists there.
    fn initialize(&self) -> Result<(), StorageError>;

    /// Save entries in display order, filtered by [`SAVE_EXTENSIONS`].
    fn list_saves(&self) -> Result<Vec<String>, StorageError>;

    fn read_entry(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    fn open_entry(&self, name: &str) -> Result<Box<dyn Read>, StorageError>;

    /// Creates or replaces an entry.
    fn write_entry(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    fn rename_entry(&self, from: &str, to: &str) -> Result<(), StorageError>;

    fn delete_entry(&self, name: &str) -> Result<(), StorageError>;
}

pub fn open_storage(kind: StorageKind, location: &Path) -> Box<dyn SequenceStorage> {
    match kind {
        StorageKind::Archive => Box::new(ArchiveStorage::new(location)),
        StorageKind::Directory => Box::new(DirectoryStorage::new(location)),
    }
}

pub fn is_save_file_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SAVE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Rejects entry names that are empty or would resolve outside the sequence
/// (absolute paths, drive prefixes, `.` or `..` components).
pub fn check_entry_name(name: &str) -> Result<(), StorageError> {
    let mut components = Path::new(name).components().peekable();
    let valid = components.peek().is_some()
        && components.all(|component| matches!(component, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidEntryName {
            entry: name.to_string(),
        })
    }
}
