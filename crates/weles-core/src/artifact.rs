//! Temporary artifacts written for in-memory inputs.
//!
//! When a dataset or model is handed over as an in-memory object it is first
//! serialized into a file in the working directory, streamed to the server,
//! and then removed. A [`TemporaryArtifact`] owns that file: dropping it
//! deletes the file, so every exit path of a command (success, server error,
//! transport error, early `?`) cleans up.
//!
//! File names look like `.tmp_train_data_1718030000123456_9f1c…e2.csv`. The
//! timestamp plus a random UUID keeps concurrent commands in separate files,
//! and files are opened with `create_new` so a collision fails loudly instead
//! of overwriting someone else's upload.

use log::{debug, warn};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::WelesResult;
use crate::payload::Role;

/// Creates temporary artifacts inside one working directory.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    work_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Write `content` to a freshly named file for `role`.
    pub fn create(&self, content: &[u8], role: Role) -> WelesResult<TemporaryArtifact> {
        let path = self.work_dir.join(format!(
            "{}{}.{}",
            role.artifact_prefix(),
            unique_token(),
            role.artifact_extension()
        ));

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        let artifact = TemporaryArtifact {
            path,
            released: false,
        };
        // From here on the artifact is responsible for the file, including
        // when the write below fails.
        file.write_all(content)?;
        file.sync_all()?;

        debug!(
            "Created temporary artifact {} ({} bytes)",
            artifact.path.display(),
            content.len()
        );
        Ok(artifact)
    }

    /// Delete an artifact now instead of waiting for it to drop.
    pub fn release(&self, artifact: TemporaryArtifact) -> WelesResult<()> {
        artifact.release()
    }
}

impl Default for ArtifactManager {
    fn default() -> Self {
        Self::new(".")
    }
}

/// A temporary file removed when this value goes out of scope.
#[derive(Debug)]
pub struct TemporaryArtifact {
    path: PathBuf,
    released: bool,
}

impl TemporaryArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. Deleting a file that is already gone is not an error.
    pub fn release(mut self) -> WelesResult<()> {
        self.remove()
    }

    fn remove(&mut self) -> WelesResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Released temporary artifact {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for TemporaryArtifact {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            warn!(
                "Failed to remove temporary artifact {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

fn unique_token() -> String {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros())
        .unwrap_or(0);
    format!("{}_{}", micros, uuid::Uuid::new_v4().simple())
}
