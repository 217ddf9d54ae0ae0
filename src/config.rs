use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "Config::default_bind_addr")]
    pub bind_addr: String,
    /// Database connection string. The DATABASE_URL environment variable
    /// takes precedence; when neither is set the server falls back to a
    /// SQLite file under ./database.
    #[serde(default)]
    pub database_url: Option<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Resolve the connection string: environment, then config file.
    pub fn database_url(&self) -> Option<String> {
        std::env::var("DATABASE_URL")
            .ok()
            .or_else(|| self.database_url.clone())
    }

    fn default_bind_addr() -> String {
        "0.0.0.0:3000".to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: Config =
            serde_yaml::from_str("bind_addr: \"127.0.0.1:8080\"\ndatabase_url: \"sqlite::memory:\"")
                .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = Config::load("does-not-exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }
}
