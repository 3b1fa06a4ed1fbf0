use std::path::Path;

use console::style;
use miette::Result;
use soy_tasks::error::TasksError;
use soy_tasks::soy::params::output_key;
use soy_tasks::soy::{ParameterRegistry, Rewriter, TemplateDocument};

pub fn run(files: Vec<String>) -> Result<()> {
    let rewriter = Rewriter::new()?;
    let mut registry = ParameterRegistry::new();

    let mut documents = Vec::with_capacity(files.len());
    for file in &files {
        let contents = std::fs::read_to_string(file).map_err(|e| TasksError::Io {
            context: format!("reading {file}"),
            source: e,
        })?;
        let mut document = TemplateDocument::new(file, contents);
        rewriter.rewrite(&mut document, &mut registry)?;
        documents.push(document);
    }

    for document in &documents {
        println!(
            "{} {}",
            style("==>").cyan().bold(),
            style(output_key(&document.path).display()).cyan()
        );
        print!("{}", registry.render_footer(Path::new(&document.path))?);
    }

    Ok(())
}
