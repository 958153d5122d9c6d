//! Server configuration and logging setup.
//!
//! Every section is optional; a missing file or section falls back to the
//! defaults the service ships with (database at `Data/data.db`).

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config = toml::from_str(contents).map_err(ConfigError::Parse)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: SocketAddr,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Allow cross-origin requests
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            static_dir: PathBuf::from("static"),
            cors: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Path::new("Data").join("data.db"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Initialize the tracing subscriber; `RUST_LOG` wins over `level`.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.database.path, Path::new("Data/data.db"));
        assert_eq!(config.server.addr.port(), 5000);
        assert_eq!(config.server.static_dir, Path::new("static"));
        assert!(!config.server.cors);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
[database]
path = "/srv/heatmap/sales.db"
"#,
        )
        .unwrap();

        assert_eq!(config.database.path, Path::new("/srv/heatmap/sales.db"));
        assert_eq!(config.server.addr.port(), 5000);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_empty_file() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.database.path, Path::new("Data/data.db"));
    }

    #[test]
    fn test_invalid_addr_rejected() {
        let result = Config::parse(
            r#"
[server]
addr = "not-an-address"
"#,
        );

        assert!(matches!(
            result,
            Err(crate::error::Error::Config(ConfigError::Parse(_)))
        ));
    }
}
