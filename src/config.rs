use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub audd: AuddConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuddConfig {
    /// API token; without one audd.io allows a handful of free lookups.
    pub api_token: Option<String>,
    /// Default market for Apple Music and Spotify lookups.
    pub market: Option<String>,
}

fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("audfill")
        .join("config.toml")
}

/// Load the config file, falling back to defaults when it is missing or
/// unreadable. A broken config never blocks a run.
pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}
