//! Re-run a callback when template sources change.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::{Duration, Instant};

use console::style;
use globset::GlobSet;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};

use super::source::build_glob_set;
use crate::config::schema::SoyConfig;
use crate::error::{Result, TasksError};

/// Quiet period after the last change before a rebuild starts.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Decides which changed paths are template sources.
///
/// Compiled output may be written into the source directory, so only paths selected
/// by the soy patterns count as changes.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    src_dir: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
}

impl SourceFilter {
    pub fn new(root: &Path, config: &SoyConfig) -> Result<Self> {
        Ok(Self {
            src_dir: root.join(&config.src_dir),
            include: build_glob_set(&config.patterns)?,
            exclude: build_glob_set(&config.exclude)?,
        })
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn matches(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.src_dir) {
            Ok(rel) => self.include.is_match(rel) && !self.exclude.is_match(rel),
            Err(_) => false,
        }
    }
}

/// Watch the source directory and call `on_change` with each debounced batch of
/// changed sources. A failing callback is reported and watching continues.
///
/// Returns when the watcher shuts down.
pub fn watch_sources<F>(filter: &SourceFilter, mut on_change: F) -> Result<()>
where
    F: FnMut(&[PathBuf]) -> Result<()>,
{
    let (tx, rx) = channel();
    let mut watcher =
        RecommendedWatcher::new(tx, Config::default()).map_err(|e| TasksError::Watch {
            path: filter.src_dir().to_path_buf(),
            source: e,
        })?;
    watcher
        .watch(filter.src_dir(), RecursiveMode::Recursive)
        .map_err(|e| TasksError::Watch {
            path: filter.src_dir().to_path_buf(),
            source: e,
        })?;

    println!(
        "  Watching {} for changes",
        style(filter.src_dir().display()).cyan()
    );

    let mut pending: Vec<PathBuf> = Vec::new();
    let mut last_change = Instant::now();
    loop {
        match rx.recv_timeout(DEBOUNCE) {
            Ok(Ok(event)) => {
                for path in event.paths {
                    if filter.matches(&path) && !pending.contains(&path) {
                        pending.push(path);
                        last_change = Instant::now();
                    }
                }
            }
            Ok(Err(e)) => {
                eprintln!("{} {}", style("watch error:").red().bold(), e);
            }
            Err(RecvTimeoutError::Timeout) => {
                if pending.is_empty() || last_change.elapsed() < DEBOUNCE {
                    continue;
                }
                let changed = std::mem::take(&mut pending);
                if let Err(e) = on_change(&changed) {
                    eprintln!("{} {}", style("rebuild failed:").red().bold(), e);
                }
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SourceFilter {
        let config = SoyConfig {
            exclude: vec!["vendor/**".into()],
            ..SoyConfig::default()
        };
        SourceFilter::new(Path::new("/project"), &config).unwrap()
    }

    #[test]
    fn template_sources_match() {
        let filter = filter();
        assert!(filter.matches(Path::new("/project/src/Widget.soy")));
        assert!(filter.matches(Path::new("/project/src/ui/Button.soy")));
    }

    #[test]
    fn compiled_output_and_excluded_files_are_ignored() {
        let filter = filter();
        assert!(!filter.matches(Path::new("/project/src/Widget.soy.js")));
        assert!(!filter.matches(Path::new("/project/src/vendor/Lib.soy")));
        assert!(!filter.matches(Path::new("/project/build/Widget.soy")));
    }
}
