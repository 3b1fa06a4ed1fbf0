use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::config::schema::SoyConfig;
use crate::error::{Result, TasksError};
use crate::pipeline::source::collect_documents;
use crate::soy::{generate_documents, ParameterRegistry};

/// A generated template that differs from what a fresh run would produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleArtifact {
    Missing { path: PathBuf },
    Changed { path: PathBuf, diff: String },
}

impl StaleArtifact {
    pub fn path(&self) -> &Path {
        match self {
            StaleArtifact::Missing { path } | StaleArtifact::Changed { path, .. } => path,
        }
    }
}

/// Result of comparing the build directory with freshly generated templates.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub checked: usize,
    pub stale: Vec<StaleArtifact>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.stale.is_empty()
    }
}

/// Regenerate every template in memory and compare it with the build directory.
///
/// Nothing is written. Compilation is not involved.
pub fn check_generated(root: &Path, config: &SoyConfig) -> Result<CheckReport> {
    if config.skip_generation {
        return Ok(CheckReport::default());
    }
    let mut documents =
        collect_documents(&root.join(&config.src_dir), &config.patterns, &config.exclude)?;

    let mut registry = ParameterRegistry::new();
    generate_documents(&mut documents, &mut registry)?;

    let mut report = CheckReport {
        checked: documents.len(),
        stale: Vec::new(),
    };
    for document in &documents {
        let rel = config.build_dir.join(&document.path);
        let on_disk = root.join(&rel);
        if !on_disk.exists() {
            report.stale.push(StaleArtifact::Missing { path: rel });
            continue;
        }

        let existing = std::fs::read_to_string(&on_disk).map_err(|e| TasksError::Io {
            context: format!("reading {}", on_disk.display()),
            source: e,
        })?;
        if existing != document.contents {
            let diff = unified_diff(&existing, &document.contents, &rel);
            report.stale.push(StaleArtifact::Changed { path: rel, diff });
        }
    }

    Ok(report)
}

pub fn unified_diff(old: &str, new: &str, path: &Path) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut output = String::new();

    output.push_str(&format!(
        "--- a/{}\n+++ b/{}\n",
        path.display(),
        path.display()
    ));

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        output.push_str(&format!("{hunk}"));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unified_diff_shows_changed_lines() {
        let diff = unified_diff("a\nb\n", "a\nc\n", Path::new("build/W.soy"));
        assert!(diff.starts_with("--- a/build/W.soy\n+++ b/build/W.soy\n"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+c\n"));
    }

    #[test]
    fn identical_text_has_no_hunks() {
        let diff = unified_diff("same\n", "same\n", Path::new("x"));
        assert_eq!(diff, "--- a/x\n+++ b/x\n");
    }
}
