use std::collections::BTreeMap;
use std::process::Command;

use tera::{Context, Tera};

use crate::config::schema::CommandConfig;
use crate::error::{Result, TasksError};

/// Render each argument of `command` as a Tera template over `vars`.
pub fn render_args(command: &CommandConfig, vars: &BTreeMap<&str, String>) -> Result<Vec<String>> {
    let mut context = Context::new();
    for (key, value) in vars {
        context.insert(*key, value);
    }

    command
        .args
        .iter()
        .map(|arg| {
            let mut tera = Tera::default();
            tera.add_raw_template("__arg__", arg)
                .and_then(|_| tera.render("__arg__", &context))
                .map_err(|e| TasksError::TemplateRender {
                    template: arg.clone(),
                    source: e,
                })
        })
        .collect()
}

/// A [`Command`] for `command` with its arguments rendered.
pub fn build_command(command: &CommandConfig, vars: &BTreeMap<&str, String>) -> Result<Command> {
    let mut cmd = Command::new(&command.program);
    cmd.args(render_args(command, vars)?);
    Ok(cmd)
}

/// Run `cmd` to completion; a non-zero exit status is an error.
pub fn run(mut cmd: Command, label: &str) -> Result<()> {
    let status = cmd.status().map_err(|e| TasksError::CommandSpawn {
        command: label.to_string(),
        source: e,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(TasksError::CommandFailed {
            command: label.to_string(),
            code: status.code(),
        })
    }
}
