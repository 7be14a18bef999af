use anyhow::Result;
use std::path::Path;

use crate::system::traits::{AudioContextInterface, FileSystemInterface};

/// Production implementation of FileSystemInterface using std::fs
pub struct StandardFileSystem;

impl FileSystemInterface for StandardFileSystem {
    fn read_file(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::write(path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to remove {}: {}", path.display(), e))
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .map_err(|e| anyhow::anyhow!("Failed to create directory {}: {}", path.display(), e))
    }
}

impl Default for StandardFileSystem {
    fn default() -> Self {
        Self
    }
}

/// Audio context used when the caller has no audio bookkeeping of its own.
/// It never reports a capture, so there is never anything to release.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAudioContext;

impl AudioContextInterface for NoopAudioContext {
    fn capture(&self) -> bool {
        true
    }

    fn is_captured(&self) -> bool {
        false
    }

    fn release(&self) {}
}
