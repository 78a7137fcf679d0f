//! Configuration loading traits and types.
//!
//! The loader reads a single TOML file describing logging, launch timing,
//! the target board and the boot scripts.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "kestrel-zynq-01"
//!
//! [launch]
//! timeout_s = 3
//! settle_ticks = 100
//!
//! [board]
//! kind = "zynq7000"
//!
//! [scripts]
//! pre-init = """
//! timeout 5
//! lsdev
//! """
//! ```

use crate::consts::{DEFAULT_LAUNCH_TIMEOUT_S, DEFAULT_SETTLE_TICKS, PRE_INIT_SCRIPT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for loader logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during bring-up.
    Debug,
    /// General information about loader operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Loader instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_timeout_s() -> u64 {
    DEFAULT_LAUNCH_TIMEOUT_S
}

fn default_settle_ticks() -> u64 {
    DEFAULT_SETTLE_TICKS
}

/// Launch timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Autoboot countdown in seconds. 0 disables the countdown.
    #[serde(default = "default_timeout_s")]
    pub timeout_s: u64,

    /// Ticks to wait for transmitters to drain before teardown.
    #[serde(default = "default_settle_ticks")]
    pub settle_ticks: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            timeout_s: DEFAULT_LAUNCH_TIMEOUT_S,
            settle_ticks: DEFAULT_SETTLE_TICKS,
        }
    }
}

/// Supported boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoardKind {
    /// Xilinx Zynq-7000 (Cortex-A9).
    Zynq7000,
    /// NXP i.MX RT117x (Cortex-M7).
    Imxrt117x,
    /// Host simulation.
    #[default]
    Sim,
}

impl fmt::Display for BoardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zynq7000 => "zynq7000",
            Self::Imxrt117x => "imxrt117x",
            Self::Sim => "sim",
        };
        f.write_str(name)
    }
}

impl FromStr for BoardKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zynq7000" => Ok(Self::Zynq7000),
            "imxrt117x" => Ok(Self::Imxrt117x),
            "sim" => Ok(Self::Sim),
            other => Err(ConfigError::ValidationError(format!(
                "unknown board kind '{other}'"
            ))),
        }
    }
}

/// Target board selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Board profile to bring up.
    #[serde(default)]
    pub kind: BoardKind,

    /// Override for the board's boot-info address.
    #[serde(default)]
    pub bootinfo_address: Option<usize>,
}

/// Complete loader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// Logging and identity.
    pub shared: SharedConfig,

    /// Launch timing.
    #[serde(default)]
    pub launch: LaunchConfig,

    /// Target board.
    #[serde(default)]
    pub board: BoardConfig,

    /// Boot scripts, name → newline-separated command lines.
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig {
                log_level: LogLevel::Info,
                service_name: "kestrel".to_string(),
            },
            launch: LaunchConfig::default(),
            board: BoardConfig::default(),
            scripts: BTreeMap::new(),
        }
    }
}

impl LoaderConfig {
    /// Validate the loader configuration.
    ///
    /// # Validation Rules
    /// 1. `shared.service_name` is not empty
    /// 2. `launch.settle_ticks` > 0
    /// 3. Script names are not empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.launch.settle_ticks == 0 {
            return Err(ConfigError::ValidationError(
                "launch.settle_ticks must be greater than 0".to_string(),
            ));
        }

        if self.scripts.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "script names cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Look up a script body by name.
    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }

    /// The script run at start-up, if configured.
    pub fn pre_init_script(&self) -> Option<&str> {
        self.script(PRE_INIT_SCRIPT)
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
