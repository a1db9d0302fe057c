use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::script::{read_script, write_script, Command};
use crate::storage::{open_storage, SequenceStorage, StorageError, StorageKind, SCRIPT_ENTRY};

#[derive(Debug, Error)]
pub enum SequenceLoadError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("title sequence at {path} has no script (script.txt missing or empty)")]
    ScriptMissing { path: PathBuf },
}

/// A title sequence: the saves it ships with and the commands that drive playback.
///
/// `Load` commands index into [`TitleSequence::saves`]; the mutation methods keep
/// those indices valid when saves are removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleSequence {
    name: String,
    path: PathBuf,
    kind: StorageKind,
    pub(crate) saves: Vec<String>,
    pub(crate) commands: Vec<Command>,
}

/// An open stream over one save of a sequence.
pub struct ParkHandle {
    /// Entry name, useful for picking a loader by extension.
    pub hint_path: String,
    pub stream: Box<dyn Read>,
}

impl std::fmt::Debug for ParkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParkHandle")
            .field("hint_path", &self.hint_path)
            .finish_non_exhaustive()
    }
}

impl TitleSequence {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, kind: StorageKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
            saves: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub fn saves(&self) -> &[String] {
        &self.saves
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut Vec<Command> {
        &mut self.commands
    }

    pub fn storage(&self) -> Box<dyn SequenceStorage> {
        open_storage(self.kind, &self.path)
    }

    /// Renders the script exactly as [`TitleSequence::save`] would persist it.
    pub fn script_text(&self) -> String {
        write_script(&self.name, &self.commands, &self.saves)
    }

    pub fn park_handle(&self, index: usize) -> Result<ParkHandle, StorageError> {
        let Some(save) = self.saves.get(index) else {
            error!(
                sequence = %self.name,
                index,
                save_count = self.saves.len(),
                "park_handle_index_out_of_range"
            );
            return Err(StorageError::EntryNotFound {
                path: self.path.clone(),
                entry: format!("#{index}"),
            });
        };
        let stream = self.storage().open_entry(save).map_err(|err| {
            error!(
                sequence = %self.name,
                save = %save,
                error = %err,
                "park_handle_open_failed"
            );
            err
        })?;
        Ok(ParkHandle {
            hint_path: save.clone(),
            stream,
        })
    }
}

pub fn load_title_sequence(path: &Path) -> Result<TitleSequence, SequenceLoadError> {
    let kind = StorageKind::for_path(path);
    info!(path = %path.display(), kind = ?kind, "title_sequence_loading");
    let storage = open_storage(kind, path);

    let script = match storage.read_entry(SCRIPT_ENTRY) {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) | Err(StorageError::EntryNotFound { .. }) => {
            error!(path = %path.display(), "title_sequence_script_missing");
            return Err(SequenceLoadError::ScriptMissing {
                path: path.to_path_buf(),
            });
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "title_sequence_open_failed");
            return Err(err.into());
        }
    };
    let saves = storage.list_saves().map_err(|err| {
        error!(path = %path.display(), error = %err, "title_sequence_open_failed");
        err
    })?;
    let commands = read_script(&script, &saves);

    let sequence = TitleSequence {
        name: sequence_name_for(path),
        path: path.to_path_buf(),
        kind,
        saves,
        commands,
    };
    info!(
        sequence = %sequence.name,
        save_count = sequence.saves.len(),
        command_count = sequence.commands.len(),
        "title_sequence_loaded"
    );
    Ok(sequence)
}

/// Creates an empty sequence on disk. The storage kind follows the path's extension.
pub fn create_title_sequence(path: &Path) -> Result<TitleSequence, SequenceLoadError> {
    let kind = StorageKind::for_path(path);
    let sequence = TitleSequence::new(sequence_name_for(path), path, kind);
    let storage = sequence.storage();
    storage.initialize()?;
    storage.write_entry(SCRIPT_ENTRY, sequence.script_text().as_bytes())?;
    info!(
        sequence = %sequence.name,
        path = %path.display(),
        kind = ?kind,
        "title_sequence_created"
    );
    Ok(sequence)
}

fn sequence_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::storage::ArchiveContainer;

    const SCRIPT: &str = "# demo\nLOAD Park One.sv6\nLOCATION 64 32\nFOO bar\nWAIT 2000\nLOAD gone.sv6\nRESTART\n";

    fn write_directory_sequence(root: &Path) -> PathBuf {
        let path = root.join("demo");
        fs::create_dir_all(&path).expect("mkdir");
        fs::write(path.join("script.txt"), SCRIPT).expect("script");
        fs::write(path.join("park one.sv6"), b"park").expect("save");
        path
    }

    #[test]
    fn loads_directory_sequence() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_directory_sequence(temp.path());

        let sequence = load_title_sequence(&path).expect("load");
        assert_eq!(sequence.name(), "demo");
        assert_eq!(sequence.kind(), StorageKind::Directory);
        assert_eq!(sequence.saves(), ["park one.sv6"]);
        assert_eq!(
            sequence.commands(),
            [
                Command::Load {
                    save_index: Some(0)
                },
                Command::Location { x: 64, y: 32 },
                Command::Wait { milliseconds: 2000 },
                Command::Load { save_index: None },
                Command::Restart,
            ]
        );
    }

    #[test]
    fn loads_archive_sequence() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("rct2.parkseq");
        let mut container = ArchiveContainer::new();
        container.set("script.txt", SCRIPT.as_bytes().to_vec());
        container.set("Park One.sv6", b"park".to_vec());
        container.save(&path).expect("save");

        let sequence = load_title_sequence(&path).expect("load");
        assert_eq!(sequence.name(), "rct2");
        assert_eq!(sequence.kind(), StorageKind::Archive);
        assert_eq!(sequence.commands().len(), 5);

        let mut handle = sequence.park_handle(0).expect("handle");
        assert_eq!(handle.hint_path, "Park One.sv6");
        let mut data = Vec::new();
        handle.stream.read_to_end(&mut data).expect("read");
        assert_eq!(data, b"park");
    }

    #[test]
    fn missing_or_empty_script_fails_load() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("empty");
        fs::create_dir_all(&path).expect("mkdir");
        assert!(matches!(
            load_title_sequence(&path),
            Err(SequenceLoadError::ScriptMissing { .. })
        ));

        fs::write(path.join("script.txt"), "").expect("empty script");
        assert!(matches!(
            load_title_sequence(&path),
            Err(SequenceLoadError::ScriptMissing { .. })
        ));

        let archive = temp.path().join("noscript.parkseq");
        ArchiveContainer::new().save(&archive).expect("save");
        assert!(matches!(
            load_title_sequence(&archive),
            Err(SequenceLoadError::ScriptMissing { .. })
        ));
    }

    #[test]
    fn unopenable_archive_fails_load() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("absent.parkseq");
        assert!(matches!(
            load_title_sequence(&path),
            Err(SequenceLoadError::Storage(StorageError::Io { .. }))
        ));
    }

    #[test]
    fn park_handle_rejects_bad_index() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_directory_sequence(temp.path());
        let sequence = load_title_sequence(&path).expect("load");
        assert!(sequence.park_handle(1).is_err());
    }

    #[test]
    fn created_sequences_load_back_empty() {
        let temp = TempDir::new().expect("tempdir");
        for location in ["fresh", "fresh.parkseq"] {
            let path = temp.path().join(location);
            let created = create_title_sequence(&path).expect("create");
            let loaded = load_title_sequence(&path).expect("load");
            assert_eq!(created, loaded);
            assert!(loaded.commands().is_empty());
            assert!(create_title_sequence(&path).is_err());
        }
    }
}
