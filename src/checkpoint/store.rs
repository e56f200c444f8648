//! Atomic JSON persistence for crawl checkpoints
//!
//! Every save goes to a sibling `.tmp` file which is synced and then renamed
//! over the real checkpoint. A crash at any point leaves either the previous
//! checkpoint or the new one in place, never a torn file.

use crate::checkpoint::CrawlState;
use crate::CheckpointError;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Durable store for a single `CrawlState`
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Creates a store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the checkpoint file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a checkpoint file is present
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Writes `state`, replacing any previous checkpoint atomically
    ///
    /// Errors here are fatal to the run: progress that cannot be checkpointed
    /// cannot be trusted to survive a crash.
    pub fn save(&self, state: &CrawlState) -> Result<(), CheckpointError> {
        let encoded = serde_json::to_vec(state).map_err(CheckpointError::Serialize)?;

        write_atomically(&self.path, &encoded).map_err(|source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(
            "Checkpoint saved: phase {} bin {} (A: {}, B: {})",
            state.phase,
            state.last_bin_idx,
            state.sets.set_a.len(),
            state.sets.set_b.len()
        );
        Ok(())
    }

    /// Reads the checkpoint, distinguishing "absent" from "unreadable"
    ///
    /// # Returns
    ///
    /// * `Ok(Some(state))` - A valid checkpoint was found
    /// * `Ok(None)` - No checkpoint file exists
    /// * `Err(CheckpointError)` - The file exists but could not be read or parsed
    pub fn read(&self) -> Result<Option<CrawlState>, CheckpointError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| CheckpointError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Loads the last saved state, treating an unreadable file as absent
    ///
    /// A corrupt checkpoint must never block a fresh run, so failures are
    /// logged and reported as "no checkpoint".
    pub fn load(&self) -> Option<CrawlState> {
        match self.read() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Failed to load checkpoint, ignoring it: {}", e);
                None
            }
        }
    }

    /// Removes the checkpoint and any leftover temp file
    pub fn clear(&self) -> Result<(), CheckpointError> {
        for path in [self.path.clone(), temp_path(&self.path)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(CheckpointError::Io { path, source }),
            }
        }

        tracing::debug!("Checkpoint cleared: {}", self.path.display());
        Ok(())
    }
}

/// Writes `bytes` to `path` through a synced temp file and a rename
pub fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp_path = temp_path(path);

    let mut file = File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}

/// `<path>.tmp`, next to the target so the rename stays on one filesystem
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
