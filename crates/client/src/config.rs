//! Client configuration

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for configuration overrides (`PORTAL_BASE_URL`, ...)
pub const ENV_PREFIX: &str = "PORTAL";

/// Portal client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the portal API, without a trailing slash
    pub base_url: String,

    /// Request timeout in seconds (unset leaves reqwest's default)
    pub timeout_secs: Option<u64>,

    /// How long before access-token expiry the session renews it
    pub refresh_leeway_secs: u64,

    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: None,
            refresh_leeway_secs: 60,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from file, with environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let settings = Self::defaults_builder()?
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load configuration with defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> Result<Self, ClientError> {
        let settings = Self::defaults_builder()?
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn defaults_builder()
    -> Result<config::ConfigBuilder<config::builder::DefaultState>, ClientError> {
        let defaults = Self::default();
        Ok(config::Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("refresh_leeway_secs", defaults.refresh_leeway_secs)?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn refresh_leeway(&self) -> Duration {
        Duration::from_secs(self.refresh_leeway_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.refresh_leeway(), Duration::from_secs(60));
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "base_url = \"https://portal.example.edu\"\ntimeout_secs = 15"
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "https://portal.example.edu");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.refresh_leeway_secs, 60);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ClientConfig::from_file("/nonexistent/portal.toml");
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }
}
