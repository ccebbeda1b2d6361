use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Contents of `~/.megawave/config.toml`. Every key is optional.
///
/// ```toml
/// environment = "development"
/// log_level = "debug"
/// log_file = "/tmp/megawave.log"
/// otlp_endpoint = "localhost:4317"
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    pub environment: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl FileConfig {
    /// Read and parse the file at `path`. A missing file is an error here;
    /// use [`FileConfig::load_default`] for the optional default location.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file at [`config_path`], if there is one.
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".megawave").join("config.toml"))
}
