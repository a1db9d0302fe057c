use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

mod catalog;
mod edit;
pub mod script;
mod sequence;
pub mod storage;

pub use catalog::{list_title_sequences, SequenceEntry};
pub use edit::SequenceEditError;
pub use script::Command;
pub use sequence::{
    create_title_sequence, load_title_sequence, ParkHandle, SequenceLoadError, TitleSequence,
};
pub use storage::{StorageError, StorageKind};

pub const ROOT_ENV_VAR: &str = "TITLESEQ_ROOT";
pub const SEQUENCES_DIR_NAME: &str = "sequences";

#[derive(Debug, Clone)]
pub struct SequencePaths {
    pub root: PathBuf,
    pub sequences_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error(
        "{env_var} is set but does not point to a directory containing sequences/: {path}"
    )]
    InvalidEnvRoot {
        path: PathBuf,
        env_var: &'static str,
    },
    #[error(
        "Could not find a sequences/ directory walking upward from {start_dir}\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/game/data\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_sequence_paths() -> Result<SequencePaths, StartupError> {
    let root = resolve_root()?;
    let sequences_dir = root.join(SEQUENCES_DIR_NAME);
    Ok(SequencePaths {
        root,
        sequences_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_root_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let cwd = env::current_dir().map_err(StartupError::CurrentDir)?;
            find_root_from(&cwd).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&cwd),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_root_marker(candidate))
        .map(normalize_path)
}

fn is_root_marker(path: &Path) -> bool {
    path.join(SEQUENCES_DIR_NAME).is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
