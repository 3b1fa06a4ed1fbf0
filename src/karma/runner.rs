use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use super::KarmaConfig;
use crate::config::schema::CommandConfig;
use crate::error::{Result, TasksError};
use crate::pipeline::command::{build_command, run};

/// Runs a test suite with the given options.
pub trait TestRunner {
    fn start(&self, config: &KarmaConfig) -> Result<()>;
}

/// Runs the karma CLI against a generated config that loads the project's own
/// config file and then applies the options on top.
#[derive(Debug, Clone)]
pub struct KarmaRunner {
    command: CommandConfig,
    working_dir: PathBuf,
    env: Vec<(&'static str, String)>,
}

impl KarmaRunner {
    pub fn new(command: CommandConfig, working_dir: PathBuf) -> Self {
        Self {
            command,
            working_dir,
            env: Vec::new(),
        }
    }

    /// Extra environment for the karma process (e.g. Sauce Labs credentials).
    pub fn with_env(mut self, env: Vec<(&'static str, String)>) -> Self {
        self.env = env;
        self
    }
}

impl TestRunner for KarmaRunner {
    fn start(&self, config: &KarmaConfig) -> Result<()> {
        let wrapper = render_config_wrapper(config)?;

        let mut file = tempfile::Builder::new()
            .prefix(".karma.")
            .suffix(".conf.js")
            .tempfile_in(&self.working_dir)
            .map_err(|e| TasksError::Io {
                context: format!("creating karma config in {}", self.working_dir.display()),
                source: e,
            })?;
        file.write_all(wrapper.as_bytes())
            .map_err(|e| TasksError::Io {
                context: format!("writing {}", file.path().display()),
                source: e,
            })?;

        let mut cmd = build_command(&self.command, &BTreeMap::new())?;
        cmd.arg("start")
            .arg(file.path())
            .current_dir(&self.working_dir)
            .envs(self.env.iter().map(|(k, v)| (*k, v.as_str())));

        match run(cmd, &self.command.program) {
            Err(TasksError::CommandFailed { code, .. }) => Err(TasksError::TestRunFailed { code }),
            other => other,
        }
    }
}

/// A karma config module applying `config` after the project's config file.
pub fn render_config_wrapper(config: &KarmaConfig) -> Result<String> {
    let options = serde_json::to_string_pretty(config).map_err(|e| TasksError::Serialize {
        context: "karma options".into(),
        source: e,
    })?;

    let mut out = String::from("module.exports = function(config) {\n");
    if let Some(config_file) = &config.config_file {
        let path = serde_json::to_string(&config_file.to_string_lossy()).map_err(|e| {
            TasksError::Serialize {
                context: "karma config path".into(),
                source: e,
            }
        })?;
        out.push_str(&format!("  require({path})(config);\n"));
    }
    out.push_str(&format!("  config.set({options});\n}};\n"));
    Ok(out)
}
