use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::system::FileSystemInterface;

use super::types::Config;

/// Configuration loader that uses dependency injection for file system operations
pub struct ConfigLoader<F: FileSystemInterface> {
    file_system: F,
    config_path: PathBuf,
}

impl<F: FileSystemInterface> ConfigLoader<F> {
    pub fn new(file_system: F, config_path: PathBuf) -> Self {
        Self {
            file_system,
            config_path,
        }
    }

    /// Load configuration from the configured path
    pub fn load_config(&self) -> Result<Config> {
        debug!("Loading configuration from: {}", self.config_path.display());

        if !self.file_system.file_exists(&self.config_path) {
            info!("Configuration file not found, creating default configuration");
            return self.create_default_config();
        }

        let config_content = self
            .file_system
            .read_file(&self.config_path)
            .with_context(|| {
                format!(
                    "Failed to read configuration file: {}",
                    self.config_path.display()
                )
            })?;

        let mut config: Config = toml::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse configuration file: {}",
                self.config_path.display()
            )
        })?;

        config.validate().with_context(|| {
            format!(
                "Invalid configuration file: {}",
                self.config_path.display()
            )
        })?;

        self.resolve_paths(&mut config);

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Relative paths in the file are relative to the directory holding it
    fn resolve_paths(&self, config: &mut Config) {
        let Some(base) = self.config_path.parent() else {
            return;
        };

        let paths = [
            &mut config.paths.state_file,
            &mut config.paths.display_file,
            &mut config.general.log_dir,
        ];
        for path in paths.into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
                debug!("Resolved configured path to {}", path.display());
            }
        }
    }

    /// Save configuration to the configured path
    pub fn save_config(&self, config: &Config) -> Result<()> {
        debug!("Saving configuration to: {}", self.config_path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = self.config_path.parent() {
            self.file_system.create_dir(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let config_content =
            toml::to_string_pretty(config).context("Failed to serialize configuration")?;

        self.file_system
            .write_file(&self.config_path, &config_content)
            .with_context(|| {
                format!(
                    "Failed to write configuration file: {}",
                    self.config_path.display()
                )
            })?;

        info!("Configuration saved to: {}", self.config_path.display());
        Ok(())
    }

    /// Get the configuration file path
    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    /// Check if the configuration file exists
    pub fn config_exists(&self) -> bool {
        self.file_system.file_exists(&self.config_path)
    }

    /// Create and save a default configuration
    fn create_default_config(&self) -> Result<Config> {
        let config = Config::default();

        // Try to save the config, but don't fail if we can't
        if let Err(e) = self.save_config(&config) {
            warn!(
                "Could not save default config to {}: {:#}. Using default config.",
                self.config_path.display(),
                e
            );
            return Ok(config);
        }

        info!(
            "Created default configuration file: {}",
            self.config_path.display()
        );
        Ok(config)
    }
}

// Convenience constructor for production use with StandardFileSystem
impl ConfigLoader<crate::system::StandardFileSystem> {
    pub fn new_production(config_path: PathBuf) -> Self {
        Self::new(crate::system::StandardFileSystem, config_path)
    }

    /// Create a production config loader with the default path
    pub fn new_with_default_path() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self::new_production(config_path))
    }

    /// Get the default configuration path
    pub fn default_config_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home_dir.join(".config/display-settings-manager/config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockFileSystem;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_load_nonexistent_config_creates_default() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        let loader = ConfigLoader::new(mock_fs.clone(), config_path.clone());

        let config = loader.load_config().unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.general.log_level, "info");
        assert!(config.workarounds.hdr_blank_delay().is_none());
        assert!(mock_fs.get_file(&config_path).is_some());
    }

    #[test]
    fn test_load_existing_config() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");

        let config_content = r#"
[general]
log_level = "debug"
json_logs = true

[workarounds]
hdr_blank_delay_ms = 500

[paths]
state_file = "/var/lib/display/state.json"
"#;
        mock_fs.add_file(&config_path, config_content.to_string());

        let loader = ConfigLoader::new(mock_fs, config_path);
        let config = loader.load_config().unwrap();

        assert_eq!(config.general.log_level, "debug");
        assert!(config.general.json_logs);
        assert_eq!(
            config.workarounds.hdr_blank_delay(),
            Some(Duration::from_millis(500))
        );
        assert_eq!(
            config.paths.state_file,
            Some(PathBuf::from("/var/lib/display/state.json"))
        );
        assert!(config.paths.display_file.is_none());
    }

    #[test]
    fn test_relative_paths_follow_config_dir() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/etc/display-settings/config.toml");
        mock_fs.add_file(
            &config_path,
            r#"
[general]
log_file = true
log_dir = "logs"

[paths]
state_file = "/var/lib/display/state.json"
display_file = "layouts/desk.json"
"#
            .to_string(),
        );

        let loader = ConfigLoader::new(mock_fs, config_path);
        let config = loader.load_config().unwrap();

        assert_eq!(
            config.paths.display_file,
            Some(PathBuf::from("/etc/display-settings/layouts/desk.json"))
        );
        assert_eq!(
            config.paths.state_file,
            Some(PathBuf::from("/var/lib/display/state.json"))
        );
        assert!(config.general.log_file);
        assert_eq!(
            config.general.log_dir,
            Some(PathBuf::from("/etc/display-settings/logs"))
        );
    }

    #[test]
    fn test_load_rejects_unknown_log_level() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        mock_fs.add_file(
            &config_path,
            "[general]\nlog_level = \"chatty\"\n".to_string(),
        );

        let loader = ConfigLoader::new(mock_fs, config_path);
        assert!(loader.load_config().is_err());
    }

    #[test]
    fn test_read_failure_is_an_error() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        mock_fs.add_file(&config_path, String::new());
        mock_fs.set_read_failure(true);

        let loader = ConfigLoader::new(mock_fs, config_path);
        assert!(loader.load_config().is_err());
    }

    #[test]
    fn test_unwritable_default_still_loads() {
        let mock_fs = MockFileSystem::new();
        mock_fs.set_write_failure(true);
        let loader = ConfigLoader::new(mock_fs, PathBuf::from("/test/config.toml"));

        let config = loader.load_config().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_config() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        let loader = ConfigLoader::new(mock_fs.clone(), config_path.clone());

        let config = Config::default();
        loader.save_config(&config).unwrap();

        // Verify the file was written
        let write_calls = mock_fs.get_write_calls();
        assert_eq!(write_calls.len(), 1);
        assert_eq!(write_calls[0].0, config_path);

        // Verify directory creation was called
        let dir_calls = mock_fs.get_directory_creation_calls();
        assert_eq!(dir_calls.len(), 1);
        assert_eq!(dir_calls[0], PathBuf::from("/test"));
    }

    #[test]
    fn test_config_exists() {
        let mock_fs = MockFileSystem::new();
        let config_path = PathBuf::from("/test/config.toml");
        let loader = ConfigLoader::new(mock_fs.clone(), config_path.clone());

        assert!(!loader.config_exists());

        mock_fs.add_file(&config_path, "test content".to_string());
        assert!(loader.config_exists());
    }
}
