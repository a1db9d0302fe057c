use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::storage::{StorageError, StorageKind, SCRIPT_ENTRY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: StorageKind,
}

/// Finds the sequences directly inside `dir`: archives by extension, folders by
/// the presence of a script.
pub fn list_title_sequences(dir: &Path) -> Result<Vec<SequenceEntry>, StorageError> {
    let entries = fs::read_dir(dir).map_err(|source| StorageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let kind = if path.is_dir() {
            if !path.join(SCRIPT_ENTRY).is_file() {
                continue;
            }
            StorageKind::Directory
        } else if StorageKind::for_path(&path) == StorageKind::Archive {
            StorageKind::Archive
        } else {
            continue;
        };
        let Some(name) = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()) else {
            continue;
        };
        found.push(SequenceEntry { name, path, kind });
    }
    found.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    Ok(found)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn finds_archives_and_script_folders_sorted() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path();
        fs::create_dir_all(dir.join("zeta")).expect("mkdir zeta");
        fs::write(dir.join("zeta").join("script.txt"), "END\n").expect("script");
        fs::create_dir_all(dir.join("not_a_sequence")).expect("mkdir other");
        fs::write(dir.join("alpha.parkseq"), b"").expect("archive");
        fs::write(dir.join("readme.txt"), b"").expect("readme");

        let found = list_title_sequences(dir).expect("list");
        assert_eq!(
            found
                .iter()
                .map(|entry| (entry.name.as_str(), entry.kind))
                .collect::<Vec<_>>(),
            vec![
                ("alpha", StorageKind::Archive),
                ("zeta", StorageKind::Directory)
            ]
        );
    }
}
