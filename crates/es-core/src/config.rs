//! Configuration for the espresso debug controller

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Number of emulated cores on the target machine
pub const DEFAULT_CORE_COUNT: usize = 3;

/// Default debugger host
pub const DEFAULT_DEBUGGER_HOST: &str = "127.0.0.1";

/// Default debugger port
pub const DEFAULT_DEBUGGER_PORT: u16 = 11234;

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// CPU configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Number of emulated cores, fixed for the lifetime of the process
    pub core_count: usize,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            core_count: DEFAULT_CORE_COUNT,
        }
    }
}

/// Remote debugger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    /// Enable debugging even when no remote debugger answers the handshake
    pub force_enabled: bool,
    /// Debugger host
    pub host: String,
    /// Debugger port
    pub port: u16,
}

impl DebuggerConfig {
    /// `host:port` string for log messages
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            force_enabled: false,
            host: DEFAULT_DEBUGGER_HOST.to_string(),
            port: DEFAULT_DEBUGGER_PORT,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level
    pub log_level: LogLevel,
    /// Also write logs to `log_path`
    pub log_to_file: bool,
    /// Log file path
    pub log_path: PathBuf,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_to_file: false,
            log_path: PathBuf::from("espresso.log"),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cpu: CpuConfig,
    pub debugger: DebuggerConfig,
    pub debug: DebugConfig,
}

impl Config {
    /// Path of the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("espresso").join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load the configuration from `path`, falling back to defaults when the
    /// file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }

    /// Save the configuration
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save the configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, contents)?;
        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}
