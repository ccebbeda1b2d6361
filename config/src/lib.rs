//! Runtime configuration for Megawave.
//!
//! Values are layered, highest precedence first: command-line flags,
//! `MEGAWAVE_*` environment variables, `~/.megawave/config.toml`, defaults.
//! Flags and environment variables are both handled by [`Cli`]; the file is
//! [`FileConfig`]. [`Config::resolve`] merges them.

mod file;

use std::fmt;
use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

pub use file::{ConfigError, FileConfig, config_path};

pub const DEFAULT_LOG_FILE: &str = "megawave.log";

/// Deployment environment; selects where diagnostics go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// OTLP export.
    Production,
    /// Text log file.
    #[default]
    Development,
    /// Diagnostics discarded.
    Test,
}

impl Environment {
    /// Case-insensitive. Unrecognized values fall back to development.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Case-insensitive; accepts `warning` for `warn`. Unrecognized values
    /// fall back to info.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warn => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command-line flags. Each flag falls back to its environment variable.
#[derive(Debug, Default, Clone, Parser)]
#[command(name = "megawave", version, about = "Microwave control panel simulator")]
pub struct Cli {
    /// Environment: production, development, or test
    #[arg(long = "env", env = "MEGAWAVE_ENV", value_name = "ENV")]
    pub environment: Option<String>,

    /// Log level: debug, info, warn, or error
    #[arg(long, env = "MEGAWAVE_LOG_LEVEL", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log file path (development environment)
    #[arg(long, env = "MEGAWAVE_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// OTLP collector endpoint (production environment)
    #[arg(long, env = "MEGAWAVE_OTLP_ENDPOINT", value_name = "URL")]
    pub otlp_endpoint: Option<String>,

    /// Config file path [default: ~/.megawave/config.toml]
    #[arg(long, env = "MEGAWAVE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load the config file named by `--config`, or the default one if it
    /// exists.
    pub fn load_file(&self) -> Result<Option<FileConfig>, ConfigError> {
        match &self.config {
            Some(path) => FileConfig::load(path).map(Some),
            None => FileConfig::load_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub environment: Environment,
    pub log_level: LogLevel,
    pub log_file: PathBuf,
    /// Never empty when set.
    pub otlp_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_level: LogLevel::default(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            otlp_endpoint: None,
        }
    }
}

impl Config {
    /// Merge flags/env over the file over defaults.
    #[must_use]
    pub fn resolve(cli: &Cli, file: Option<&FileConfig>) -> Self {
        let file = file.cloned().unwrap_or_default();
        let defaults = Self::default();

        let environment = cli
            .environment
            .as_deref()
            .or(file.environment.as_deref())
            .map_or(defaults.environment, Environment::parse);
        let log_level = cli
            .log_level
            .as_deref()
            .or(file.log_level.as_deref())
            .map_or(defaults.log_level, LogLevel::parse);
        let log_file = cli
            .log_file
            .clone()
            .or(file.log_file)
            .unwrap_or(defaults.log_file);
        let otlp_endpoint = cli
            .otlp_endpoint
            .clone()
            .or(file.otlp_endpoint)
            .map(|endpoint| endpoint.trim().to_string())
            .filter(|endpoint| !endpoint.is_empty());

        Self {
            environment,
            log_level,
            log_file,
            otlp_endpoint,
        }
    }
}
