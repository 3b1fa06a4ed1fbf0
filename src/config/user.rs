use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TasksError};

/// User-level configuration loaded from `~/.config/soy-tasks/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Exported to the test runner as `SAUCE_USERNAME`.
    pub sauce_username: Option<String>,
    /// Exported to the test runner as `SAUCE_ACCESS_KEY`.
    pub sauce_access_key: Option<String>,
}

impl UserConfig {
    /// Environment variables passed to external test processes.
    pub fn env(&self) -> Vec<(&'static str, String)> {
        let mut env = Vec::new();
        if let Some(user) = &self.sauce_username {
            env.push(("SAUCE_USERNAME", user.clone()));
        }
        if let Some(key) = &self.sauce_access_key {
            env.push(("SAUCE_ACCESS_KEY", key.clone()));
        }
        env
    }
}

/// Get the path to the user config file.
fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("soy-tasks").join("config.toml"))
}

/// Load user configuration from the XDG config directory.
///
/// Returns `Ok(None)` if the config file does not exist.
/// Returns `Err` if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<Option<UserConfig>> {
    let path = match config_path() {
        Some(p) => p,
        None => return Ok(None),
    };

    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| TasksError::Io {
        context: format!("reading user config {}", path.display()),
        source: e,
    })?;

    let config: UserConfig =
        toml::from_str(&content).map_err(|e| TasksError::ConfigParse { source: e })?;

    Ok(Some(config))
}
