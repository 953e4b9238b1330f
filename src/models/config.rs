//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage root and scratch area
    #[serde(default)]
    pub storage: StorageConfig,

    /// Extraction engine settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::validation("server.host is empty"));
        }
        if self.server.port == 0 {
            return Err(AppError::validation("server.port must be > 0"));
        }
        if self.storage.root_dir.as_os_str().is_empty() {
            return Err(AppError::validation("storage.root_dir is empty"));
        }
        if self.extractor.binary.trim().is_empty() {
            return Err(AppError::validation("extractor.binary is empty"));
        }
        if self.extractor.format.trim().is_empty() {
            return Err(AppError::validation("extractor.format is empty"));
        }
        if self.extractor.timeout_secs == 0 {
            return Err(AppError::validation("extractor.timeout_secs must be > 0"));
        }
        if self.extractor.user_agent.trim().is_empty() {
            return Err(AppError::validation("extractor.user_agent is empty"));
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "defaults::host")]
    pub host: String,

    /// Bind port
    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
        }
    }
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding every stored artifact
    #[serde(default = "defaults::root_dir")]
    pub root_dir: PathBuf,

    /// Scratch directory for in-flight downloads (default: `{root_dir}/.scratch`)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Effective scratch directory.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| self.root_dir.join(defaults::SCRATCH_DIR_NAME))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: defaults::root_dir(),
            scratch_dir: None,
        }
    }
}

/// Which extraction engine handles retrievals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// The `yt-dlp` executable
    YtDlp,
    /// Plain HTTP download of a direct file link
    Direct,
}

/// Extraction engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "defaults::engine")]
    pub engine: EngineKind,

    /// Path or name of the yt-dlp executable
    #[serde(default = "defaults::binary")]
    pub binary: String,

    /// yt-dlp format selector
    #[serde(default = "defaults::format")]
    pub format: String,

    /// Upper bound for one probe+fetch in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Per-socket network timeout passed to the engine
    #[serde(default = "defaults::socket_timeout")]
    pub socket_timeout_secs: u64,

    /// User-Agent header for direct downloads
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Additional arguments appended to every yt-dlp invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            engine: defaults::engine(),
            binary: defaults::binary(),
            format: defaults::format(),
            timeout_secs: defaults::timeout(),
            socket_timeout_secs: defaults::socket_timeout(),
            user_agent: defaults::user_agent(),
            extra_args: Vec::new(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::EngineKind;

    pub const SCRATCH_DIR_NAME: &str = ".scratch";

    // Server defaults
    pub fn host() -> String {
        "0.0.0.0".into()
    }
    pub fn port() -> u16 {
        8000
    }

    // Storage defaults
    pub fn root_dir() -> PathBuf {
        PathBuf::from("downloads")
    }

    // Extractor defaults
    pub fn engine() -> EngineKind {
        EngineKind::YtDlp
    }
    pub fn binary() -> String {
        "yt-dlp".into()
    }
    pub fn format() -> String {
        "best".into()
    }
    pub fn timeout() -> u64 {
        300
    }
    pub fn socket_timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        concat!("mediadrop/", env!("CARGO_PKG_VERSION")).into()
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.extractor.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_binary() {
        let mut config = Config::default();
        config.extractor.binary = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            root_dir = "/srv/media"

            [extractor]
            engine = "direct"
            timeout_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.root_dir, PathBuf::from("/srv/media"));
        assert_eq!(
            config.storage.scratch_dir(),
            PathBuf::from("/srv/media/.scratch")
        );
        assert_eq!(config.extractor.engine, EngineKind::Direct);
        assert_eq!(config.extractor.timeout_secs, 60);
        assert_eq!(config.extractor.binary, "yt-dlp");
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8000");
    }
}
