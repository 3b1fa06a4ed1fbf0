use std::path::Path;

use console::style;
use miette::Result;
use soy_tasks::RunOptions;

pub fn run(project: String, stage: String, skip_generation: bool) -> Result<()> {
    if !Path::new(&project).is_dir() {
        return Err(miette::miette!(
            "Project directory does not exist: {}",
            project
        ));
    }

    println!(
        "{} Running '{}' in {}",
        style("==>").cyan().bold(),
        style(&stage).green(),
        style(&project).cyan()
    );

    soy_tasks::run_stage(RunOptions {
        project,
        stage: stage.clone(),
        skip_generation,
    })?;

    println!("\n{} '{}' completed", style("✓").green().bold(), stage);
    Ok(())
}
