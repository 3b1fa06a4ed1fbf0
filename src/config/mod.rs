pub mod schema;
pub mod user;

use std::path::Path;

use crate::error::{Result, TasksError};

pub use schema::TasksConfig;
pub use user::{load_user_config, UserConfig};

pub const CONFIG_FILE: &str = "soy-tasks.toml";

/// Load and validate a TasksConfig from a soy-tasks.toml file.
pub fn load_config(path: &Path) -> Result<TasksConfig> {
    let config_path = if path.ends_with(CONFIG_FILE) {
        path.to_path_buf()
    } else {
        path.join(CONFIG_FILE)
    };

    if !config_path.exists() {
        return Err(TasksError::ConfigNotFound { path: config_path });
    }

    let content = std::fs::read_to_string(&config_path).map_err(|e| TasksError::Io {
        context: format!("reading {}", config_path.display()),
        source: e,
    })?;

    let config: TasksConfig =
        toml::from_str(&content).map_err(|e| TasksError::ConfigParse { source: e })?;

    config.validate()?;

    Ok(config)
}

/// Like [`load_config`], but a project without soy-tasks.toml gets the defaults.
pub fn load_project_config(project_dir: &Path) -> Result<TasksConfig> {
    if project_dir.join(CONFIG_FILE).exists() {
        load_config(project_dir)
    } else {
        Ok(TasksConfig::default())
    }
}
