//! CLI configuration utilities

use anyhow::{Context, Result};
use portal_client::ClientConfig;
use std::path::Path;
use tracing::debug;

/// Load client configuration.
///
/// An explicit `path` must exist. Otherwise `fallback` is used when present,
/// and plain defaults plus `PORTAL_*` variables when it is not.
pub fn load_client_config(path: Option<&Path>, fallback: &Path) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None if fallback.exists() => {
            debug!(path = %fallback.display(), "using config from data directory");
            ClientConfig::from_file(fallback)
                .with_context(|| format!("failed to load config from {}", fallback.display()))?
        }
        None => ClientConfig::from_env()?,
    };
    Ok(config)
}

/// Save client configuration to JSON file
pub fn save_client_config<P: AsRef<Path>>(config: &ClientConfig, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Generate a default configuration file
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    save_client_config(&ClientConfig::default(), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        generate_default_config(&path).unwrap();
        let loaded = load_client_config(Some(&path), Path::new("/nonexistent")).unwrap();
        assert_eq!(loaded.base_url, ClientConfig::default().base_url);
        assert_eq!(loaded.refresh_leeway_secs, 60);
    }

    #[test]
    fn test_fallback_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("config.json");
        let config = ClientConfig {
            base_url: "https://portal.example.edu".into(),
            ..ClientConfig::default()
        };
        save_client_config(&config, &fallback).unwrap();

        let loaded = load_client_config(None, &fallback).unwrap();
        assert_eq!(loaded.base_url, "https://portal.example.edu");
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let result = load_client_config(Some(Path::new("/nonexistent/portal.json")), Path::new("/x"));
        assert!(result.is_err());
    }
}
