use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::codec;
use crate::display::SingleDisplayConfigState;
use crate::system::{FileSystemInterface, PersistentStateInterface};

/// Persistent state store backed by a JSON file.
///
/// The retained snapshot is cached in memory and loaded once at construction.
/// A file that cannot be parsed is treated as "nothing retained" and removed.
/// A file that cannot be read is left alone.
pub struct FilePersistentState<F: FileSystemInterface> {
    file_system: F,
    state_path: PathBuf,
    cached_state: Mutex<Option<SingleDisplayConfigState>>,
}

impl<F: FileSystemInterface> FilePersistentState<F> {
    pub fn new(file_system: F, state_path: PathBuf) -> Self {
        let cached_state = Self::load(&file_system, &state_path);
        Self {
            file_system,
            state_path,
            cached_state: Mutex::new(cached_state),
        }
    }

    fn load(file_system: &F, state_path: &Path) -> Option<SingleDisplayConfigState> {
        if !file_system.file_exists(state_path) {
            debug!("No persistent state at {}", state_path.display());
            return None;
        }

        let content = match file_system.read_file(state_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Ignoring unreadable persistent state {}: {:#}",
                    state_path.display(),
                    e
                );
                return None;
            }
        };

        match codec::from_json::<SingleDisplayConfigState>(&content) {
            Ok(state) => {
                info!("Loaded persistent display state from {}", state_path.display());
                Some(state)
            }
            Err(e) => {
                warn!(
                    "Discarding corrupt persistent state {}: {:#}",
                    state_path.display(),
                    e
                );
                if let Err(e) = file_system.remove_file(state_path) {
                    warn!("Failed to remove corrupt persistent state: {:#}", e);
                }
                None
            }
        }
    }

    /// Get the state file path
    pub fn get_state_path(&self) -> &Path {
        &self.state_path
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<SingleDisplayConfigState>> {
        self.cached_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self, state: &SingleDisplayConfigState) -> Result<()> {
        if let Some(parent) = self.state_path.parent() {
            self.file_system.create_dir(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let content = codec::to_json_pretty(state)?;
        self.file_system
            .write_file(&self.state_path, &content)
            .with_context(|| format!("Failed to write state file: {}", self.state_path.display()))
    }

    fn clear_state(&self) -> Result<()> {
        if !self.file_system.file_exists(&self.state_path) {
            return Ok(());
        }

        self.file_system
            .remove_file(&self.state_path)
            .with_context(|| format!("Failed to remove state file: {}", self.state_path.display()))
    }
}

impl<F: FileSystemInterface> PersistentStateInterface for FilePersistentState<F> {
    fn get_state(&self) -> Option<SingleDisplayConfigState> {
        self.lock_cache().clone()
    }

    fn persist_state(&self, state: Option<SingleDisplayConfigState>) -> Result<()> {
        let mut cached = self.lock_cache();
        if *cached == state {
            debug!("Persistent state unchanged, skipping write");
            return Ok(());
        }

        match &state {
            Some(new_state) => self.write_state(new_state)?,
            None => self.clear_state()?,
        }

        *cached = state;
        Ok(())
    }
}
