use std::path::{Path, PathBuf};

use crate::compile::TemplateCompiler;
use crate::config::schema::SoyConfig;
use crate::error::{Result, TasksError};
use crate::pipeline::source::{collect_documents, write_atomically};

use super::params::{output_key, ParameterRegistry};
use super::rewrite::{render_header, RegistryImport, Rewriter, TemplateDocument};

/// What the soy stage produced, as paths relative to the project root.
#[derive(Debug, Default)]
pub struct SoyReport {
    pub sources: Vec<PathBuf>,
    /// Rewritten templates written to the build directory.
    pub generated: Vec<PathBuf>,
    /// Compiled, wrapped templates written to the destination directory.
    pub compiled: Vec<PathBuf>,
}

impl SoyConfig {
    pub fn registry_import(&self) -> RegistryImport {
        match &self.core_dir {
            Some(dir) => RegistryImport::Relative(dir.clone()),
            None => RegistryImport::Fixed(self.core_path.clone()),
        }
    }
}

/// Rewrite every document in memory. The first malformed document aborts the batch.
pub fn generate_documents(
    documents: &mut [TemplateDocument],
    registry: &mut ParameterRegistry,
) -> Result<()> {
    let rewriter = Rewriter::new()?;
    for document in documents.iter_mut() {
        rewriter.rewrite(document, registry)?;
    }
    Ok(())
}

/// Run the soy stage for the project at `root`.
///
/// Sources are rewritten (unless generation is skipped) and copied to the build
/// directory, compiled in a staging directory, wrapped with the registry header and
/// the params footer, and only then written to the destination directory.
pub fn run_soy(
    root: &Path,
    config: &SoyConfig,
    compiler: &dyn TemplateCompiler,
    registry: &mut ParameterRegistry,
) -> Result<SoyReport> {
    let src_dir = root.join(&config.src_dir);
    let mut documents = collect_documents(&src_dir, &config.patterns, &config.exclude)?;

    let mut report = SoyReport {
        sources: documents
            .iter()
            .map(|d| config.src_dir.join(&d.path))
            .collect(),
        ..SoyReport::default()
    };
    if documents.is_empty() {
        return Ok(report);
    }

    if !config.skip_generation {
        generate_documents(&mut documents, registry)?;
        for document in &documents {
            let rel = config.build_dir.join(&document.path);
            write_atomically(&root.join(&rel), &document.contents)?;
            report.generated.push(rel);
        }
    }

    let staging = tempfile::tempdir().map_err(|e| TasksError::Io {
        context: "creating staging directory for template compilation".into(),
        source: e,
    })?;
    let input_dir = staging.path().join("input");
    let output_dir = staging.path().join("output");
    for document in &documents {
        write_atomically(&input_dir.join(&document.path), &document.contents)?;
    }
    std::fs::create_dir_all(&output_dir).map_err(|e| TasksError::Io {
        context: format!("creating directory {}", output_dir.display()),
        source: e,
    })?;

    let sources: Vec<PathBuf> = documents.iter().map(|d| d.path.clone()).collect();
    compiler.compile(&input_dir, &sources, &output_dir)?;

    let import = config.registry_import();
    let mut wrapped = Vec::with_capacity(documents.len());
    for document in &documents {
        let compiled_rel = output_key(&document.path);
        let compiled_path = output_dir.join(&compiled_rel);
        if !compiled_path.exists() {
            return Err(TasksError::CompilerOutputMissing {
                path: config.src_dir.join(&document.path),
            });
        }
        let body = std::fs::read_to_string(&compiled_path).map_err(|e| TasksError::Io {
            context: format!("reading {}", compiled_path.display()),
            source: e,
        })?;

        let dest_rel = config.dest_dir.join(&compiled_rel);
        let mut contents = render_header(&import, &dest_rel);
        contents.push_str(&body);
        contents.push_str(&registry.render_footer(&document.path)?);
        wrapped.push((dest_rel, contents));
    }

    for (dest_rel, contents) in wrapped {
        write_atomically(&root.join(&dest_rel), &contents)?;
        report.compiled.push(dest_rel);
    }

    Ok(report)
}
