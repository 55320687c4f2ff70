//! Where the CLI keeps its session, logs and default config

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::warn;

const SESSION_FILE: &str = "session.json";
const LOG_FILE: &str = "portal.log";
const CONFIG_FILE: &str = "config.json";

/// Resolved data directory for one CLI run
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// Use `override_dir` when given, otherwise the platform data directory
    pub fn resolve(override_dir: Option<PathBuf>) -> Self {
        let root = override_dir.unwrap_or_else(|| {
            if let Some(dirs) = ProjectDirs::from("edu", "Portal", "portal") {
                dirs.data_dir().to_path_buf()
            } else {
                warn!("cannot determine platform data directory, using ./.portal");
                PathBuf::from(".portal")
            }
        });
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_file(&self) -> PathBuf {
        self.root.join(SESSION_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }
}
