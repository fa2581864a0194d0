//! Configuration module for larder
//!
//! Manages the catalog endpoint, paging sizes and session storage settings.
//! Configuration is stored in the user's config directory and can be
//! overridden with `LARDER_*` environment variables (nested keys use a double
//! underscore, e.g. `LARDER_SESSION__BACKEND=sled`).

use crate::browse::{BrowseSettings, DEFAULT_PAGE_SIZE};
use crate::catalog::http::DEFAULT_BASE_URL;
use crate::session::{DEFAULT_SESSION_KEY, MemoryBackend, SessionBackend, SledBackend, StorageError};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where browse snapshots are kept
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    /// In-process cache with idle expiry
    #[default]
    Memory,
    /// Sled database, temporary unless a path is set
    Sled,
}

/// Session storage settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: SessionBackendKind,

    /// Minutes a memory snapshot survives without being touched
    pub idle_minutes: u64,

    /// Sled directory; a temporary database is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Key the browse view stores its snapshot under
    pub scope: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackendKind::Memory,
            idle_minutes: 30,
            path: None,
            scope: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LarderConfig {
    /// Catalog API root
    pub base_url: String,

    /// Items per page
    pub page_size: usize,

    /// Categories requested for the picker
    pub category_fetch_size: usize,

    /// Categories shown in the picker
    pub category_limit: usize,

    pub request_timeout_secs: u64,

    pub session: SessionConfig,
}

impl Default for LarderConfig {
    fn default() -> Self {
        let browse = BrowseSettings::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            category_fetch_size: browse.category_fetch_size,
            category_limit: browse.category_limit,
            request_timeout_secs: 15,
            session: SessionConfig::default(),
        }
    }
}

impl LarderConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("larder").join("config.toml"))
    }

    /// Load configuration from the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, creating a default file if it doesn't exist
    ///
    /// Environment overrides are applied on top of the file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or created.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::default().save_to(path)?;
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(
                Environment::with_prefix("LARDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be determined or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the parent directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Controller-facing subset
    #[must_use]
    pub const fn browse_settings(&self) -> BrowseSettings {
        BrowseSettings {
            page_size: self.page_size,
            category_fetch_size: self.category_fetch_size,
            category_limit: self.category_limit,
        }
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session.idle_minutes * 60)
    }

    /// Open the configured session backend
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a sled database cannot be opened.
    pub fn open_session_backend(&self) -> Result<Box<dyn SessionBackend>, StorageError> {
        let backend: Box<dyn SessionBackend> = match (self.session.backend, &self.session.path) {
            (SessionBackendKind::Memory, _) => Box::new(MemoryBackend::with_idle(self.idle_timeout())),
            (SessionBackendKind::Sled, Some(path)) => Box::new(SledBackend::open(path)?),
            (SessionBackendKind::Sled, None) => Box::new(SledBackend::temporary()?),
        };
        log::debug!("session backend: {:?}", self.session.backend);
        Ok(backend)
    }
}
