use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub video: VideoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: i64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i64,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: String,
    #[serde(default = "default_video_extensions")]
    pub extensions: Vec<String>,
}

impl Config {
    /// Load configuration: defaults, then `config.toml` (optional),
    /// then `FILESERVER_`-prefixed environment variables.
    pub fn load() -> Result<Self> {
        let defaults = Config::default();

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("FILESERVER")
                    .separator("__"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.address, self.server.port)
    }

    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::InvalidUpload("server port must not be 0".into()));
        }
        if self.storage.max_file_size <= 0 {
            return Err(Error::InvalidUpload(
                "storage.max_file_size must be positive".into(),
            ));
        }
        if self.storage.chunk_size <= 0 {
            return Err(Error::InvalidUpload(
                "storage.chunk_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            temp_dir: default_temp_dir(),
            max_file_size: default_max_file_size(),
            chunk_size: default_chunk_size(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: default_thumbnail_size(),
            extensions: default_video_extensions(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "sqlite://data/fileserver.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/files")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("data/tmp")
}

fn default_max_file_size() -> i64 {
    10 * 1024 * 1024 * 1024 // 10 GiB
}

fn default_chunk_size() -> i64 {
    8 * 1024 * 1024 // 8 MiB
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_thumbnail_size() -> String {
    "320x180".to_string()
}

fn default_video_extensions() -> Vec<String> {
    ["mp4", "mkv", "webm", "avi", "mov"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.address, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.chunk_size, 8 * 1024 * 1024);
        assert!(config.video.extensions.contains(&"mp4".to_string()));
    }

    #[test]
    fn test_server_address() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }
}
