use std::path::Path;

use console::style;
use miette::Result;
use soy_tasks::check::{check_generated, StaleArtifact};
use soy_tasks::error::TasksError;

pub fn run(project: String) -> Result<()> {
    let root = Path::new(&project);
    let loaded = soy_tasks::load_project(root)?;

    println!(
        "{} {}",
        style("Checking generated templates in").bold(),
        style(root.join(&loaded.config.soy.build_dir).display()).cyan()
    );

    let report = check_generated(root, &loaded.config.soy)?;

    if report.is_clean() {
        println!(
            "\n{} {} template(s) up to date",
            style("✓").green().bold(),
            report.checked
        );
        return Ok(());
    }

    for artifact in &report.stale {
        match artifact {
            StaleArtifact::Missing { path } => {
                println!("  {} {} (missing)", style("✗").red(), path.display());
            }
            StaleArtifact::Changed { path, diff } => {
                println!("  {} {}", style("✗").red(), path.display());
                for line in diff.lines() {
                    let styled = if line.starts_with('+') && !line.starts_with("+++") {
                        style(line).green()
                    } else if line.starts_with('-') && !line.starts_with("---") {
                        style(line).red()
                    } else {
                        style(line).dim()
                    };
                    println!("    {styled}");
                }
            }
        }
    }

    Err(TasksError::StaleArtifacts {
        count: report.stale.len(),
    }
    .into())
}
