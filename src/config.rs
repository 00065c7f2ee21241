use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Application configuration, loaded from a TOML file named on the command
/// line.
///
/// ```toml
/// bind_address = "127.0.0.1"
/// port = 8080
///
/// [storage]
/// backend = "file"        # or "sqlite"
/// path = "stories.json"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Network address to bind the server to.
    pub bind_address: String,
    /// TCP port for the HTTP API.
    pub port: u16,
    /// Storage backend selection.
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// JSON document path for the file backend, database path for sqlite.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Sqlite,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let raw = fs::read_to_string(path).map_err(ConfigError::IoError)?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_address
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::BadBindAddress(self.bind_address.clone()))?;
        if self.port == 0 {
            return Err(ConfigError::BadPort("port must be non-zero".into()));
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStoragePath);
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .bind_address
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::BadBindAddress(self.bind_address.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_parses() {
        let file = write_config(
            r#"
bind_address = "127.0.0.1"
port = 8080

[storage]
backend = "sqlite"
path = "board.sqlite3"
"#,
        );
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_bad_toml_rejected() {
        let file = write_config("bind_address = [not toml");
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_bad_bind_address_rejected() {
        let file = write_config(
            r#"
bind_address = "localhost:nope"
port = 8080

[storage]
backend = "file"
path = "stories.json"
"#,
        );
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::BadBindAddress(_))
        ));
    }

    #[test]
    fn test_zero_port_rejected() {
        let file = write_config(
            r#"
bind_address = "0.0.0.0"
port = 0

[storage]
backend = "file"
path = "stories.json"
"#,
        );
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::BadPort(_))
        ));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let file = write_config(
            r#"
bind_address = "0.0.0.0"
port = 8080

[storage]
backend = "postgres"
path = "stories.json"
"#,
        );
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Config::from_file(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::IoError(_))
        ));
    }
}
