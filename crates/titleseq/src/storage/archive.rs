use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::atomic_io::replace_file_contents;
use super::{is_save_file_name, SequenceStorage, StorageError, StorageKind};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ArchiveEntry {
    name: String,
    data: Vec<u8>,
}

/// In-memory image of a `.parkseq` zip archive.
///
/// Directory records are skipped on open. Entries keep archive order and are
/// written back deflate-compressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveContainer {
    entries: Vec<ArchiveEntry>,
}

impl ArchiveContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let bytes = fs::read(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(bytes, path)
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let bytes = self.encode(path)?;
        replace_file_contents(path, &bytes)
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replaces the entry in place, or appends a new one.
    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(ArchiveEntry {
                name: name.to_string(),
                data,
            }),
        }
    }

    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        match self.entries.iter_mut().find(|entry| entry.name == from) {
            Some(entry) => {
                entry.name = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        self.entries.len() != before
    }

    fn encode(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::<u8>::new()));
        for entry in &self.entries {
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|err| zip_error(path, err))?;
            writer
                .write_all(&entry.data)
                .map_err(|source| StorageError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        let cursor = writer.finish().map_err(|err| zip_error(path, err))?;
        Ok(cursor.into_inner())
    }

    fn decode(bytes: Vec<u8>, path: &Path) -> Result<Self, StorageError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|err| zip_error(path, err))?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive.by_index(index).map_err(|err| zip_error(path, err))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|err| zip_error(path, ZipError::Io(err)))?;
            entries.push(ArchiveEntry { name, data });
        }
        Ok(Self { entries })
    }
}

/// A title sequence packed into one archive file.
#[derive(Debug, Clone)]
pub struct ArchiveStorage {
    path: PathBuf,
}

impl ArchiveStorage {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn not_found(&self, name: &str) -> StorageError {
        StorageError::EntryNotFound {
            path: self.path.clone(),
            entry: name.to_string(),
        }
    }

    fn update<F>(&self, edit: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut ArchiveContainer) -> Result<(), StorageError>,
    {
        let mut container = ArchiveContainer::open(&self.path)?;
        edit(&mut container)?;
        container.save(&self.path)
    }
}

impl SequenceStorage for ArchiveStorage {
    fn location(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Archive
    }

    fn initialize(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            return Err(StorageError::LocationExists {
                path: self.path.clone(),
            });
        }
        ArchiveContainer::new().save(&self.path)
    }

    fn list_saves(&self) -> Result<Vec<String>, StorageError> {
        let container = ArchiveContainer::open(&self.path)?;
        Ok(container
            .entry_names()
            .filter(|name| is_save_file_name(name))
            .map(ToString::to_string)
            .collect())
    }

    fn read_entry(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let container = ArchiveContainer::open(&self.path)?;
        container
            .get(name)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| self.not_found(name))
    }

    fn open_entry(&self, name: &str) -> Result<Box<dyn Read>, StorageError> {
        let data = self.read_entry(name)?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn write_entry(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.update(|container| {
            container.set(name, bytes.to_vec());
            Ok(())
        })
    }

    fn rename_entry(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.update(|container| {
            if container.contains(to) {
                return Err(StorageError::EntryExists {
                    path: self.path.clone(),
                    entry: to.to_string(),
                });
            }
            if container.rename(from, to) {
                Ok(())
            } else {
                Err(self.not_found(from))
            }
        })
    }

    fn delete_entry(&self, name: &str) -> Result<(), StorageError> {
        self.update(|container| {
            if container.remove(name) {
                Ok(())
            } else {
                Err(self.not_found(name))
            }
        })
    }
}

fn zip_error(path: &Path, err: ZipError) -> StorageError {
    match err {
        ZipError::Io(source) => StorageError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => StorageError::InvalidArchive {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn seeded(temp: &TempDir) -> ArchiveStorage {
        let path = temp.path().join("demo.parkseq");
        let mut container = ArchiveContainer::new();
        container.set("script.txt", b"LOAD b.sv6\n".to_vec());
        container.set("b.sv6", b"bbb".to_vec());
        container.set("readme.txt", b"skip".to_vec());
        container.set("a.park", b"aaa".to_vec());
        container.save(&path).expect("save archive");
        ArchiveStorage::new(&path)
    }

    /// Builds a zip the way an external archiver would, with a directory record
    /// and stored (uncompressed) entries.
    fn write_external_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).expect("create zip");
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.add_directory("extras/", options).expect("add dir");
        for (name, data) in entries {
            writer.start_file(*name, options).expect("start file");
            writer.write_all(data).expect("write file");
        }
        writer.finish().expect("finish zip");
    }

    #[test]
    fn container_survives_save_and_open() {
        let temp = TempDir::new().expect("tempdir");
        let storage = seeded(&temp);
        let bytes = fs::read(storage.location()).expect("read");
        assert_eq!(&bytes[..4], b"PK\x03\x04");

        let reopened = ArchiveContainer::open(storage.location()).expect("open");
        assert_eq!(
            reopened.entry_names().collect::<Vec<_>>(),
            vec!["script.txt", "b.sv6", "readme.txt", "a.park"]
        );
        assert_eq!(reopened.get("b.sv6"), Some(&b"bbb"[..]));
    }

    #[test]
    fn externally_built_zip_is_readable_and_editable() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("external.parkseq");
        write_external_zip(
            &path,
            &[
                ("script.txt", b"LOAD one.sv6\nEND\n"),
                ("one.sv6", b"first park"),
            ],
        );
        let storage = ArchiveStorage::new(&path);

        assert_eq!(storage.list_saves().expect("list"), vec!["one.sv6"]);
        assert_eq!(
            storage.read_entry("script.txt").expect("script"),
            b"LOAD one.sv6\nEND\n"
        );

        storage.write_entry("two.sv6", b"second park").expect("write");
        let mut archive =
            ZipArchive::new(fs::File::open(&path).expect("open zip")).expect("parse zip");
        let mut data = String::new();
        archive
            .by_name("two.sv6")
            .expect("entry")
            .read_to_string(&mut data)
            .expect("read entry");
        assert_eq!(data, "second park");
    }

    #[test]
    fn lists_saves_in_archive_order() {
        let temp = TempDir::new().expect("tempdir");
        let storage = seeded(&temp);
        assert_eq!(storage.list_saves().expect("list"), vec!["b.sv6", "a.park"]);
    }

    #[test]
    fn entry_operations_persist() {
        let temp = TempDir::new().expect("tempdir");
        let storage = seeded(&temp);

        storage.write_entry("c.sv6", b"ccc").expect("write");
        storage.rename_entry("b.sv6", "bee.sv6").expect("rename");
        storage.delete_entry("a.park").expect("delete");

        assert_eq!(
            storage.list_saves().expect("list"),
            vec!["bee.sv6", "c.sv6"]
        );
        let mut data = Vec::new();
        storage
            .open_entry("bee.sv6")
            .expect("open")
            .read_to_end(&mut data)
            .expect("read");
        assert_eq!(data, b"bbb");
        assert!(matches!(
            storage.delete_entry("a.park"),
            Err(StorageError::EntryNotFound { .. })
        ));
        assert!(matches!(
            storage.rename_entry("c.sv6", "bee.sv6"),
            Err(StorageError::EntryExists { .. })
        ));
    }

    #[test]
    fn non_zip_file_is_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let storage = seeded(&temp);
        fs::write(storage.location(), b"definitely not a zip archive").expect("write junk");

        assert!(matches!(
            storage.list_saves(),
            Err(StorageError::InvalidArchive { .. })
        ));
    }

    #[test]
    fn missing_archive_is_an_io_error() {
        let temp = TempDir::new().expect("tempdir");
        let storage = ArchiveStorage::new(&temp.path().join("absent.parkseq"));
        assert!(matches!(
            storage.read_entry("script.txt"),
            Err(StorageError::Io { .. })
        ));
    }
}
