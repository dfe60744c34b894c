//! Application configuration

pub mod assistant;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub use assistant::{AssistantConfig, ConfigError};

/// Where the wishlist and conversation history are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
    None,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            "none" | "off" => Ok(Self::None),
            other => Err(ConfigError::Validation(format!(
                "unknown storage backend: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub agent_url: String,
    pub agent_name: String,
    pub data_dir: PathBuf,
    pub storage: StorageBackend,
    pub assistant: AssistantConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let storage = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Sqlite,
        };

        let assistant = match env::var("ASSISTANT_CONFIG") {
            Ok(path) => AssistantConfig::from_file(&PathBuf::from(path))?,
            Err(_) => AssistantConfig::default(),
        };

        let agent_name = assistant
            .assistant
            .agent_name
            .clone()
            .or_else(|| env::var("SHOPPING_AGENT_NAME").ok())
            .unwrap_or_else(|| "shopping_agent".into());

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            agent_url: env::var("SHOPPING_AGENT_URL")
                .unwrap_or_else(|_| "http://localhost:8000/copilotkit".into()),
            agent_name,
            data_dir: env::var("SHOPPING_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            storage,
            assistant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_names() {
        assert_eq!("sqlite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert_eq!(" Memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("none".parse::<StorageBackend>().unwrap(), StorageBackend::None);
        assert!("redis".parse::<StorageBackend>().is_err());
    }
}
