//! Locating, loading and saving the settings file
//!
//! Settings live in `<config dir>/pulp_smash/<file name>`, where the config
//! directories follow the XDG base directory convention and the file name
//! comes from `PULP_SMASH_CONFIG_FILE` (default `settings.json`).

use crate::config::Settings;
use crate::config::validation;
use crate::error::ConfigError;
use crate::system::System;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the settings file
pub const CONFIG_FILE_ENV: &str = "PULP_SMASH_CONFIG_FILE";

/// File name used when `PULP_SMASH_CONFIG_FILE` is unset
pub const DEFAULT_CONFIG_FILE: &str = "settings.json";

/// Subdirectory of each config directory holding the settings file
pub const CONFIG_DIR_NAME: &str = "pulp_smash";

const DEFAULT_XDG_CONFIG_DIRS: &str = "/etc/xdg";

/// Finds, reads and writes settings files through a [`System`]
pub struct SettingsLocator<'a> {
    system: &'a dyn System,
    file_name: String,
}

impl<'a> SettingsLocator<'a> {
    /// Create a locator, reading the file name from the environment
    #[must_use]
    #[inline]
    pub fn new(system: &'a dyn System) -> Self {
        let file_name = system
            .env_var(CONFIG_FILE_ENV)
            .ok()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_owned());
        Self { system, file_name }
    }

    /// Name of the settings file searched for
    #[must_use]
    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// User config directory: `$XDG_CONFIG_HOME`, else `$HOME/.config`
    #[must_use]
    pub fn config_home(&self) -> Option<PathBuf> {
        if let Some(dir) = self.absolute_env_path("XDG_CONFIG_HOME") {
            return Some(dir);
        }
        if let Some(home) = self.absolute_env_path("HOME") {
            return Some(home.join(".config"));
        }
        dirs::config_dir()
    }

    /// Config directories in search order, most preferred first
    #[must_use]
    pub fn config_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.config_home().into_iter().collect();

        let system_dirs = self
            .system
            .env_var("XDG_CONFIG_DIRS")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_XDG_CONFIG_DIRS.to_owned());
        for entry in system_dirs.split(':') {
            let dir = PathBuf::from(entry);
            // Relative entries are invalid per the base directory convention
            if dir.is_absolute() && !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// Every candidate settings path, in search order
    #[must_use]
    #[inline]
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        self.config_dirs()
            .into_iter()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(&self.file_name))
            .collect()
    }

    /// Path of the first existing settings file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] listing every searched path
    pub fn load_path(&self) -> Result<PathBuf, ConfigError> {
        let candidates = self.candidate_paths();
        for candidate in &candidates {
            debug!("Looking for settings at {}", candidate.display());
            if self.system.is_file(candidate) {
                return Ok(candidate.clone());
            }
        }
        Err(ConfigError::NotFound {
            searched: candidates,
        })
    }

    /// Path settings are saved to, creating its directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if no user config directory can be determined or it
    /// cannot be created
    pub fn save_path(&self) -> Result<PathBuf, ConfigError> {
        let home = self.config_home().ok_or_else(|| ConfigError::NotFound {
            searched: Vec::new(),
        })?;
        let dir = home.join(CONFIG_DIR_NAME);
        self.system
            .create_dir_all(&dir)
            .map_err(|e| ConfigError::io(&dir, e))?;
        Ok(dir.join(&self.file_name))
    }

    /// Load settings from the first file found on the search path
    ///
    /// # Errors
    ///
    /// Returns an error if no file is found, it cannot be read or parsed, or
    /// it fails validation
    #[inline]
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let path = self.load_path()?;
        self.load_from(&path)
    }

    /// Load settings from an explicit path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails
    /// validation
    pub fn load_from(&self, path: &Path) -> Result<Settings, ConfigError> {
        let document = self.read_document(path)?;
        let settings = validation::validate(&document)?;
        debug!(
            "Loaded settings for Pulp {} with {} host(s) from {}",
            settings.pulp.version,
            settings.hosts.len(),
            path.display()
        );
        Ok(settings)
    }

    /// Read a settings file as raw JSON without validating it
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read or is not
    /// JSON
    pub fn read_document(&self, path: &Path) -> Result<serde_json::Value, ConfigError> {
        if !self.system.exists(path) {
            return Err(ConfigError::NotFound {
                searched: vec![path.to_path_buf()],
            });
        }
        let content = self
            .system
            .read_to_string(path)
            .map_err(|e| ConfigError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, e))
    }

    /// Save settings to the save path
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or cannot be written
    #[inline]
    pub fn save(&self, settings: &Settings) -> Result<PathBuf, ConfigError> {
        let path = self.save_path()?;
        self.save_to(settings, &path)?;
        Ok(path)
    }

    /// Save settings to an explicit path, replacing any existing file
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or cannot be written
    pub fn save_to(&self, settings: &Settings, path: &Path) -> Result<(), ConfigError> {
        validation::validate_settings(settings)?;
        let mut content = serde_json::to_string_pretty(settings)
            .map_err(|e| ConfigError::parse(path, e))?;
        content.push('\n');
        self.system
            .write(path, content.as_bytes())
            .map_err(|e| ConfigError::io(path, e))?;
        info!("Settings written to {}", path.display());
        Ok(())
    }

    fn absolute_env_path(&self, key: &str) -> Option<PathBuf> {
        self.system
            .env_var(key)
            .ok()
            .map(PathBuf::from)
            .filter(|path| path.is_absolute())
    }
}
