use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::schema::CommandConfig;
use crate::error::Result;
use crate::pipeline::command::{build_command, run};

/// Turns template sources into JavaScript.
///
/// For every `foo.soy` in `sources` (relative to `input_dir`) the compiler must write
/// `foo.soy.js` at the same relative location under `output_dir`.
pub trait TemplateCompiler {
    fn compile(&self, input_dir: &Path, sources: &[PathBuf], output_dir: &Path) -> Result<()>;
}

/// Runs an external compiler such as the closure-templates `SoyToJsSrcCompiler`.
///
/// Arguments may use `{{ input_dir }}`, `{{ output_dir }}` and `{{ srcs }}` (the
/// comma-separated relative sources). The process runs inside `input_dir`.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    command: CommandConfig,
}

impl CommandCompiler {
    pub fn new(command: CommandConfig) -> Self {
        Self { command }
    }
}

impl TemplateCompiler for CommandCompiler {
    fn compile(&self, input_dir: &Path, sources: &[PathBuf], output_dir: &Path) -> Result<()> {
        let srcs = sources
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect::<Vec<_>>()
            .join(",");

        let mut vars = BTreeMap::new();
        vars.insert("input_dir", input_dir.display().to_string());
        vars.insert("output_dir", output_dir.display().to_string());
        vars.insert("srcs", srcs);

        let mut cmd = build_command(&self.command, &vars)?;
        cmd.current_dir(input_dir);
        run(cmd, &self.command.program)
    }
}
