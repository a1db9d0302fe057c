use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};

use crate::script::Command;
use crate::sequence::TitleSequence;
use crate::storage::{check_entry_name, StorageError, SCRIPT_ENTRY};

#[derive(Debug, Error)]
pub enum SequenceEditError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to read park file {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TitleSequence {
    /// Copies `source` into the sequence as the save entry `name`.
    ///
    /// The save list only grows once the entry has been written, so a failed copy
    /// leaves the sequence untouched. Duplicates are detected by entry name, not by
    /// source path: re-adding an existing name replaces the stored bytes without
    /// adding a second list entry, since both would refer to one backend entry.
    pub fn add_park(&mut self, source: &Path, name: &str) -> Result<(), SequenceEditError> {
        check_entry_name(name)
            .map_err(|err| self.log_storage_failure("park_add_failed", name, err))?;
        let data = fs::read(source).map_err(|source_err| {
            error!(
                sequence = %self.name(),
                source_path = %source.display(),
                error = %source_err,
                "park_add_read_failed"
            );
            SequenceEditError::ReadSource {
                path: source.to_path_buf(),
                source: source_err,
            }
        })?;
        self.storage()
            .write_entry(name, &data)
            .map_err(|err| self.log_storage_failure("park_add_failed", name, err))?;

        if !self.saves.iter().any(|save| save == name) {
            self.saves.push(name.to_string());
        }
        info!(
            sequence = %self.name(),
            save = name,
            bytes = data.len(),
            save_count = self.saves.len(),
            "park_added"
        );
        Ok(())
    }

    /// Renames the save at `index`, which must be in range.
    pub fn rename_park(&mut self, index: usize, name: &str) -> Result<(), SequenceEditError> {
        assert!(
            index < self.saves.len(),
            "save index {index} out of range for {} saves",
            self.saves.len()
        );
        let old_name = &self.saves[index];
        check_entry_name(name)
            .map_err(|err| self.log_storage_failure("park_rename_failed", name, err))?;
        self.storage()
            .rename_entry(old_name, name)
            .map_err(|err| self.log_storage_failure("park_rename_failed", old_name, err))?;

        info!(
            sequence = %self.name(),
            index,
            from = %old_name,
            to = name,
            "park_renamed"
        );
        self.saves[index] = name.to_string();
        Ok(())
    }

    /// Deletes the save at `index`, which must be in range, and re-targets `Load`
    /// commands: the removed index becomes `None`, later indices shift down by one.
    pub fn remove_park(&mut self, index: usize) -> Result<(), SequenceEditError> {
        assert!(
            index < self.saves.len(),
            "save index {index} out of range for {} saves",
            self.saves.len()
        );
        let relative_path = &self.saves[index];
        self.storage()
            .delete_entry(relative_path)
            .map_err(|err| self.log_storage_failure("park_remove_failed", relative_path, err))?;

        let removed = self.saves.remove(index);
        let mut invalidated = 0usize;
        for command in &mut self.commands {
            if let Command::Load { save_index } = command {
                match *save_index {
                    Some(current) if current == index => {
                        *save_index = None;
                        invalidated += 1;
                    }
                    Some(current) if current > index => *save_index = Some(current - 1),
                    _ => {}
                }
            }
        }
        info!(
            sequence = %self.name(),
            index,
            save = %removed,
            invalidated_loads = invalidated,
            "park_removed"
        );
        Ok(())
    }

    /// Re-serialises the commands and writes them as the sequence's script.
    pub fn save(&self) -> Result<(), SequenceEditError> {
        let script = self.script_text();
        self.storage()
            .write_entry(SCRIPT_ENTRY, script.as_bytes())
            .map_err(|err| {
                self.log_storage_failure("title_sequence_save_failed", SCRIPT_ENTRY, err)
            })?;
        info!(
            sequence = %self.name(),
            path = %self.path().display(),
            command_count = self.commands.len(),
            "title_sequence_saved"
        );
        Ok(())
    }

    fn log_storage_failure(
        &self,
        event: &'static str,
        entry: &str,
        err: StorageError,
    ) -> SequenceEditError {
        error!(
            sequence = %self.name(),
            path = %self.path().display(),
            entry,
            error = %err,
            event,
            "title_sequence_storage_failed"
        );
        err.into()
    }
}
