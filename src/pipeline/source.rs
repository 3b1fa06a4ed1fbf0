use std::io::Write;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::{Result, TasksError};
use crate::soy::TemplateDocument;

/// Read every file under `root` matching `patterns` and none of `exclude`.
///
/// Paths are relative to `root` and sorted, so documents are processed in a stable order.
pub fn collect_documents(
    root: &Path,
    patterns: &[String],
    exclude: &[String],
) -> Result<Vec<TemplateDocument>> {
    let mut documents = Vec::new();
    for rel_path in collect_paths(root, patterns, exclude)? {
        let path = root.join(&rel_path);
        let contents = std::fs::read_to_string(&path).map_err(|e| TasksError::Io {
            context: format!("reading {}", path.display()),
            source: e,
        })?;
        documents.push(TemplateDocument::new(rel_path, contents));
    }
    Ok(documents)
}

/// Relative paths of the files under `root` selected by the glob patterns.
pub fn collect_paths(root: &Path, patterns: &[String], exclude: &[String]) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let include_set = build_glob_set(patterns)?;
    let exclude_set = build_glob_set(exclude)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel_path) = entry.path().strip_prefix(root) else {
            continue;
        };
        if include_set.is_match(rel_path) && !exclude_set.is_match(rel_path) {
            paths.push(rel_path.to_path_buf());
        }
    }

    paths.sort();
    Ok(paths)
}

pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| TasksError::GlobPattern {
            pattern: pattern.clone(),
            source: e,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| TasksError::GlobPattern {
        pattern: "<combined>".into(),
        source: e,
    })
}

/// Write `contents` to `dest` through a temporary file in the same directory, so a
/// failed write never leaves a truncated artifact behind.
pub fn write_atomically(dest: &Path, contents: &str) -> Result<()> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| TasksError::Io {
        context: format!("creating directory {}", parent.display()),
        source: e,
    })?;

    let mut file = tempfile::NamedTempFile::new_in(parent).map_err(|e| TasksError::Io {
        context: format!("creating temporary file in {}", parent.display()),
        source: e,
    })?;
    file.write_all(contents.as_bytes())
        .map_err(|e| TasksError::Io {
            context: format!("writing {}", dest.display()),
            source: e,
        })?;
    file.persist(dest).map_err(|e| TasksError::Io {
        context: format!("replacing {}", dest.display()),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn collects_matching_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b/Widget.soy", "b");
        touch(dir.path(), "a/Button.soy", "a");
        touch(dir.path(), "a/Button.js", "js");
        touch(dir.path(), "a/Button.soy.js", "compiled");

        let docs = collect_documents(dir.path(), &["**/*.soy".into()], &[]).unwrap();
        let paths: Vec<_> = docs.iter().map(|d| d.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("a/Button.soy"), PathBuf::from("b/Widget.soy")]
        );
        assert_eq!(docs[0].contents, "a");
    }

    #[test]
    fn exclude_patterns_win() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Widget.soy", "");
        touch(dir.path(), "vendor/Other.soy", "");

        let paths = collect_paths(dir.path(), &["**/*.soy".into()], &["vendor/**".into()]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("Widget.soy")]);
    }

    #[test]
    fn missing_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = collect_paths(&dir.path().join("nope"), &["**/*".into()], &[]).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn invalid_glob_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_paths(dir.path(), &["a/[".into()], &[]).unwrap_err();
        assert!(matches!(err, TasksError::GlobPattern { .. }));
    }

    #[test]
    fn atomic_write_creates_parents_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/out.js");
        write_atomically(&dest, "one").unwrap();
        write_atomically(&dest, "two").unwrap();
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "two");
    }
}
