//! Configuration loading and root folder resolution
//!
//! Two tiers:
//! 1. **TOML bootstrap**: root folder, port, logging, token lifetime and the
//!    enrollment policy. Read once at startup.
//! 2. **Database runtime**: the API shared secret in the `settings` table.
//!
//! Root folder and port are resolved in priority order:
//! 1. Command-line argument
//! 2. Environment variable (`EDU_ROOT_FOLDER`, `EDU_PORT`)
//! 3. TOML config file
//! 4. OS-dependent compiled default

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "EDU_ROOT_FOLDER";

/// Environment variable overriding the HTTP port
pub const PORT_ENV: &str = "EDU_PORT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "edu.db";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5740;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the database file
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Lifetime of student bearer tokens, seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Registration rule switches
    #[serde(default)]
    pub enrollment: EnrollmentPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Which optional checks the enrollment engine applies
///
/// Capacity and duplicate checks are always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EnrollmentPolicy {
    #[serde(default = "enabled")]
    pub enforce_prerequisites: bool,
    #[serde(default = "enabled")]
    pub enforce_schedule_conflicts: bool,
    #[serde(default = "enabled")]
    pub require_open_registration: bool,
    #[serde(default = "enabled")]
    pub require_active_student: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_token_ttl_secs() -> u64 {
    8 * 60 * 60
}

fn enabled() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for EnrollmentPolicy {
    fn default() -> Self {
        Self {
            enforce_prerequisites: true,
            enforce_schedule_conflicts: true,
            require_open_registration: true,
            require_active_student: true,
        }
    }
}

impl EnrollmentPolicy {
    /// Only capacity and duplicate checks
    pub fn permissive() -> Self {
        Self {
            enforce_prerequisites: false,
            enforce_schedule_conflicts: false,
            require_open_registration: false,
            require_active_student: false,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: default_port(),
            logging: LoggingConfig::default(),
            token_ttl_secs: default_token_ttl_secs(),
            enrollment: EnrollmentPolicy::default(),
        }
    }
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Load an explicit config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the platform config file, falling back to defaults when none exists
    pub fn load_or_default() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load(&path),
            None => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Resolve the root folder: CLI, environment, TOML, then OS default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Resolve the HTTP port: CLI, environment, then TOML (which carries the default)
pub fn resolve_port(cli_arg: Option<u16>, config: &TomlConfig) -> Result<u16> {
    if let Some(port) = cli_arg {
        return Ok(port);
    }

    if let Ok(value) = std::env::var(PORT_ENV) {
        return value
            .parse::<u16>()
            .map_err(|_| Error::Config(format!("{} must be a port number, got '{}'", PORT_ENV, value)));
    }

    Ok(config.port)
}

/// Database file inside the root folder, creating the folder if needed
pub fn prepare_database_path(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join(DATABASE_FILE))
}

/// `~/.config/edu/config.toml`, then `/etc/edu/config.toml` on Linux
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("edu").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/edu/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("edu"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/edu"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("edu"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/edu"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("edu"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\edu"))
    } else {
        PathBuf::from("./edu_data")
    }
}
