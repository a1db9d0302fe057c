use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::atomic_io::replace_file_contents;
use super::{is_save_file_name, SequenceStorage, StorageError, StorageKind};

/// A title sequence stored as a plain folder: `script.txt` plus save files.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn io_error(&self, path: &Path, name: &str, source: io::Error) -> StorageError {
        if source.kind() == io::ErrorKind::NotFound {
            StorageError::EntryNotFound {
                path: self.root.clone(),
                entry: name.to_string(),
            }
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

impl SequenceStorage for DirectoryStorage {
    fn location(&self) -> &Path {
        &self.root
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Directory
    }

    fn initialize(&self) -> Result<(), StorageError> {
        if self.root.exists() {
            return Err(StorageError::LocationExists {
                path: self.root.clone(),
            });
        }
        fs::create_dir_all(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })
    }

    fn list_saves(&self) -> Result<Vec<String>, StorageError> {
        let mut saves = Vec::new();
        collect_saves_recursive(&self.root, &self.root, &mut saves)?;
        saves.sort();
        Ok(saves)
    }

    fn read_entry(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.entry_path(name);
        fs::read(&path).map_err(|source| self.io_error(&path, name, source))
    }

    fn open_entry(&self, name: &str) -> Result<Box<dyn Read>, StorageError> {
        let path = self.entry_path(name);
        let file = File::open(&path).map_err(|source| self.io_error(&path, name, source))?;
        Ok(Box::new(file))
    }

    fn write_entry(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        replace_file_contents(&self.entry_path(name), bytes)
    }

    fn rename_entry(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let src = self.entry_path(from);
        let dst = self.entry_path(to);
        if dst.exists() {
            return Err(StorageError::EntryExists {
                path: self.root.clone(),
                entry: to.to_string(),
            });
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::rename(&src, &dst).map_err(|source| self.io_error(&src, from, source))
    }

    fn delete_entry(&self, name: &str) -> Result<(), StorageError> {
        let path = self.entry_path(name);
        fs::remove_file(&path).map_err(|source| self.io_error(&path, name, source))
    }
}

fn collect_saves_recursive(
    root: &Path,
    current: &Path,
    saves: &mut Vec<String>,
) -> Result<(), StorageError> {
    let entries = fs::read_dir(current).map_err(|source| StorageError::Io {
        path: current.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| StorageError::Io {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_saves_recursive(root, &path, saves)?;
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let normalized = normalize_rel_path(rel);
        if is_save_file_name(&normalized) {
            saves.push(normalized);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}
