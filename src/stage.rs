//! Build staging.
//!
//! Staging copies the selected files into an isolated temporary
//! directory, keyed by build id, before the sync engine uploads them.
//! The directory is owned by one deploy attempt and removed on every
//! exit path, success or failure.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{AirliftError, Result, StageError};

/// A staged copy of the selected files, scoped to one deploy attempt.
///
/// Dropping the value removes the staging directory.
#[derive(Debug)]
pub struct StagedBuild {
    /// Scope guard for the temporary directory.
    _tempdir: TempDir,
    /// The build-id-scoped directory holding the staged tree.
    directory: PathBuf,
    /// Number of files staged.
    file_count: usize,
}

impl StagedBuild {
    /// The directory holding the staged tree.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of files staged.
    #[must_use]
    pub const fn file_count(&self) -> usize {
        self.file_count
    }
}

/// Copies the selected files into a fresh staging directory.
///
/// Every file lands at its root-relative offset under a build-id-scoped
/// subpath, with parent directories created as needed. Any copy failure
/// is fatal.
///
/// # Errors
///
/// Returns an error if the staging directory cannot be created or a
/// file cannot be copied.
pub async fn stage(root: &Path, build_id: &str, files: &[PathBuf]) -> Result<StagedBuild> {
    let tempdir = TempDir::new().map_err(|e| {
        AirliftError::Stage(StageError::TempDirFailed {
            message: e.to_string(),
        })
    })?;

    let directory = tempdir.path().join(build_id);
    let mut file_count = 0;

    for source in files {
        let relative = source.strip_prefix(root).map_err(|_| {
            AirliftError::Stage(StageError::CopyFailed {
                path: source.clone(),
                message: String::from("path is outside the application root"),
            })
        })?;

        let destination = directory.join(relative);

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AirliftError::Stage(StageError::CopyFailed {
                    path: source.clone(),
                    message: e.to_string(),
                })
            })?;
        }

        tokio::fs::copy(source, &destination).await.map_err(|e| {
            AirliftError::Stage(StageError::CopyFailed {
                path: source.clone(),
                message: e.to_string(),
            })
        })?;

        file_count += 1;
    }

    debug!(
        "Staged {file_count} files into {}",
        directory.display()
    );

    Ok(StagedBuild {
        _tempdir: tempdir,
        directory,
        file_count,
    })
}
