//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`MELODIA_ROOT_FOLDER`, then `MELODIA_ROOT`)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup: a warning is logged
//! and defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP bind address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5740";

/// Default session lifetime for issued tokens (7 days)
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 24 * 7;

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "melodia.db";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Contents of `melodia.toml`
///
/// Every field is optional so partial files keep working.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub session_ttl_hours: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if given, falling back to defaults
    ///
    /// Nothing is logged here; callers report the returned [`ConfigSource`]
    /// once logging is up.
    pub fn load_from(path: Option<&Path>) -> (Self, ConfigSource) {
        let Some(path) = path else {
            return (Self::default(), ConfigSource::Defaults);
        };

        match Self::load(path) {
            Ok(config) => (config, ConfigSource::File(path.to_path_buf())),
            Err(e) => (
                Self::default(),
                ConfigSource::Ignored {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                },
            ),
        }
    }

    /// Load the config file from its standard location
    pub fn load_standard() -> (Self, ConfigSource) {
        Self::load_from(config_file_path().as_deref())
    }

    /// Like [`load_standard`](Self::load_standard), logging the outcome immediately
    pub fn load_or_default() -> Self {
        let (config, source) = Self::load_standard();
        source.log();
        config
    }

    /// Bind address with compiled default
    pub fn bind_address(&self) -> String {
        self.bind_address
            .clone()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string())
    }

    /// Session lifetime in hours with compiled default
    pub fn session_ttl_hours(&self) -> u64 {
        self.session_ttl_hours.unwrap_or(DEFAULT_SESSION_TTL_HOURS)
    }
}

/// Where a [`TomlConfig`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No config file found
    Defaults,
    /// Parsed from this file
    File(PathBuf),
    /// File found but unreadable or invalid; defaults apply
    Ignored { path: PathBuf, reason: String },
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::Defaults => info!("No melodia.toml found, using defaults"),
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Ignored { path, reason } => {
                warn!("Ignoring config file {}: {}", path.display(), reason)
            }
        }
    }
}

/// Locate `melodia.toml`: user config dir first, then `/etc/melodia`
fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("melodia").join("melodia.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/melodia/melodia.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: dirs::data_local_dir()
                .map(|d| d.join("melodia"))
                .unwrap_or_else(|| PathBuf::from("./melodia_data")),
        }
    }
}

/// Resolves the root folder following the priority order above
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_config: Option<TomlConfig>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_config: None,
        }
    }

    /// Root folder given on the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Use an already-loaded TOML config instead of reading the standard location
    pub fn with_toml_config(mut self, config: TomlConfig) -> Self {
        self.toml_config = Some(config);
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("[{}] Root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        for var in ["MELODIA_ROOT_FOLDER", "MELODIA_ROOT"] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    info!("[{}] Root folder from {}: {}", self.module_name, var, path);
                    return PathBuf::from(path);
                }
            }
        }

        let toml_root = match &self.toml_config {
            Some(config) => config.root_folder.clone(),
            None => TomlConfig::load_or_default().root_folder,
        };
        if let Some(path) = toml_root {
            info!("[{}] Root folder from config file: {}", self.module_name, path.display());
            return path;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and derives file locations inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}
