pub mod check;
pub mod compile;
pub mod config;
pub mod error;
pub mod karma;
pub mod pipeline;
pub mod soy;

use std::path::Path;

use crate::compile::CommandCompiler;
use crate::config::{load_project_config, load_user_config};
use crate::error::Result;
use crate::karma::KarmaRunner;
use crate::pipeline::{Project, Runner};

/// Options for the `run_stage` operation.
pub struct RunOptions {
    /// Project root containing soy-tasks.toml.
    pub project: String,
    /// Stage to run, with its dependencies.
    pub stage: String,
    /// Force `soy.skip_generation` on.
    pub skip_generation: bool,
}

/// Load the project at `root`, including the user's own configuration.
pub fn load_project(root: &Path) -> Result<Project> {
    Ok(Project {
        root: root.to_path_buf(),
        config: load_project_config(root)?,
        user: load_user_config()?,
    })
}

/// Main entry point: run a stage of a project with the external compiler and karma.
pub fn run_stage(options: RunOptions) -> Result<()> {
    let mut project = load_project(Path::new(&options.project))?;
    if options.skip_generation {
        project.config.soy.skip_generation = true;
    }

    let compiler = CommandCompiler::new(project.config.soy.compiler.clone());
    let env = project.user.as_ref().map(|u| u.env()).unwrap_or_default();
    let tests = KarmaRunner::new(project.config.test.karma.clone(), project.root.clone())
        .with_env(env);

    let mut runner = Runner::new(&project, &compiler, &tests);
    runner.run(&options.stage)
}
