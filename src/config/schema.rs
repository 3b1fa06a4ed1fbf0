use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TasksError};
use crate::pipeline::BUILTIN_STAGES;

/// Root config structure deserialized from soy-tasks.toml.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TasksConfig {
    #[serde(default)]
    pub soy: SoyConfig,

    #[serde(default)]
    pub test: TestConfig,

    #[serde(default)]
    pub saucelabs: SauceLabsConfig,

    /// Extra stages, typically wrapping external bundlers and minifiers.
    #[serde(default, rename = "stage")]
    pub stages: Vec<StageConfig>,

    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoyConfig {
    /// Directory the template sources are collected from.
    #[serde(default = "default_src_dir")]
    pub src_dir: PathBuf,

    /// Glob patterns, relative to `src_dir`, selecting template sources.
    #[serde(default = "default_soy_patterns")]
    pub patterns: Vec<String>,

    /// Glob patterns, relative to `src_dir`, excluded from the sources.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Rewritten templates are written here before compilation.
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Compiled and wrapped templates are written here.
    #[serde(default = "default_dest_dir")]
    pub dest_dir: PathBuf,

    /// Import prefix of the component registry module.
    #[serde(default = "default_core_path")]
    pub core_path: String,

    /// Project directory of the core sources. When set, the registry import is
    /// relative to each compiled file instead of `core_path`.
    pub core_dir: Option<PathBuf>,

    /// Compile the sources as they are, without generated templates.
    #[serde(default)]
    pub skip_generation: bool,

    #[serde(default = "default_compiler")]
    pub compiler: CommandConfig,
}

fn default_src_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_soy_patterns() -> Vec<String> {
    vec!["**/*.soy".to_string()]
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_dest_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_core_path() -> String {
    "aui".to_string()
}

fn default_compiler() -> CommandConfig {
    CommandConfig {
        program: "java".into(),
        args: vec![
            "-jar".into(),
            "node_modules/closure-templates/SoyToJsSrcCompiler.jar".into(),
            "--shouldDeclareTopLevelNamespaces".into(),
            "false".into(),
            "--outputPathFormat".into(),
            "{{ output_dir }}/{INPUT_DIRECTORY}/{INPUT_FILE_NAME}.js".into(),
            "--srcs".into(),
            "{{ srcs }}".into(),
        ],
    }
}

impl Default for SoyConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            patterns: default_soy_patterns(),
            exclude: Vec::new(),
            build_dir: default_build_dir(),
            dest_dir: default_dest_dir(),
            core_path: default_core_path(),
            core_dir: None,
            skip_generation: false,
            compiler: default_compiler(),
        }
    }
}

/// An external program. Arguments are Tera templates rendered with the
/// invocation's variables (e.g. `{{ output_dir }}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TestConfig {
    /// The project's karma configuration file.
    #[serde(default = "default_karma_config_file")]
    pub config_file: PathBuf,

    #[serde(default = "default_karma")]
    pub karma: CommandConfig,

    /// Local browsers used by `test:browsers`.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,

    /// Report shown after `test:coverage`.
    #[serde(default = "default_coverage_report")]
    pub coverage_report: PathBuf,
}

fn default_karma_config_file() -> PathBuf {
    PathBuf::from("karma.conf.js")
}

fn default_karma() -> CommandConfig {
    CommandConfig {
        program: "karma".into(),
        args: Vec::new(),
    }
}

fn default_browsers() -> Vec<String> {
    [
        "Chrome",
        "Firefox",
        "Safari",
        "IE9 - Win7",
        "IE10 - Win7",
        "IE11 - Win7",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_coverage_report() -> PathBuf {
    PathBuf::from("coverage/lcov/lcov-report/index.html")
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            config_file: default_karma_config_file(),
            karma: default_karma(),
            browsers: default_browsers(),
            coverage_report: default_coverage_report(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SauceLabsConfig {
    #[serde(default = "default_test_name")]
    pub test_name: String,

    #[serde(default)]
    pub record_screenshots: bool,

    #[serde(default = "default_true")]
    pub start_connect: bool,

    #[serde(default = "default_connect_port")]
    pub port: u16,

    #[serde(default = "default_selenium_version")]
    pub selenium_version: String,

    #[serde(default = "default_connect_logfile")]
    pub logfile: String,

    /// Overrides the built-in browser matrix when non-empty.
    #[serde(default)]
    pub launchers: BTreeMap<String, LauncherConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LauncherConfig {
    pub browser_name: String,
    pub platform: Option<String>,
    pub version: Option<String>,
}

fn default_test_name() -> String {
    "AlloyUI tests".to_string()
}

fn default_true() -> bool {
    true
}

fn default_connect_port() -> u16 {
    5757
}

fn default_selenium_version() -> String {
    "2.41.0".to_string()
}

fn default_connect_logfile() -> String {
    "sauce_connect.log".to_string()
}

impl Default for SauceLabsConfig {
    fn default() -> Self {
        Self {
            test_name: default_test_name(),
            record_screenshots: false,
            start_connect: true,
            port: default_connect_port(),
            selenium_version: default_selenium_version(),
            logfile: default_connect_logfile(),
            launchers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StageConfig {
    pub name: String,

    /// Stages that must complete before this one.
    #[serde(default)]
    pub deps: Vec<String>,

    /// Without a command the stage only groups its dependencies.
    pub command: Option<CommandConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Groups of stages run one group after another.
    #[serde(default = "default_build_sequence")]
    pub sequence: Vec<Vec<String>>,
}

fn default_build_sequence() -> Vec<Vec<String>> {
    vec![vec!["clean".to_string()], vec!["soy".to_string()]]
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sequence: default_build_sequence(),
        }
    }
}

impl TasksConfig {
    /// Validate the config for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.soy.patterns.is_empty() {
            return Err(TasksError::ConfigInvalid {
                reason: "soy.patterns must contain at least one glob".into(),
            });
        }

        let mut names: HashSet<&str> = BUILTIN_STAGES.iter().copied().collect();
        for stage in &self.stages {
            if !names.insert(stage.name.as_str()) {
                return Err(TasksError::ConfigInvalid {
                    reason: format!("stage '{}' is declared more than once", stage.name),
                });
            }
        }

        for stage in &self.stages {
            if let Some(dep) = stage.deps.iter().find(|d| !names.contains(d.as_str())) {
                return Err(TasksError::ConfigInvalid {
                    reason: format!("stage '{}' depends on unknown stage '{dep}'", stage.name),
                });
            }
        }

        for name in self.build.sequence.iter().flatten() {
            if name == "build" || name == "watch" {
                return Err(TasksError::ConfigInvalid {
                    reason: format!("the build sequence cannot contain '{name}'"),
                });
            }
            if !names.contains(name.as_str()) {
                return Err(TasksError::ConfigInvalid {
                    reason: format!("build sequence references unknown stage '{name}'"),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: TasksConfig = toml::from_str("").unwrap();
        assert_eq!(config.soy.src_dir, PathBuf::from("src"));
        assert_eq!(config.soy.patterns, vec!["**/*.soy"]);
        assert_eq!(config.soy.core_path, "aui");
        assert!(!config.soy.skip_generation);
        assert_eq!(config.test.config_file, PathBuf::from("karma.conf.js"));
        assert_eq!(config.test.browsers.len(), 6);
        assert_eq!(config.saucelabs.port, 5757);
        assert!(config.saucelabs.start_connect);
        assert_eq!(config.build.sequence, vec![vec!["clean"], vec!["soy"]]);
        config.validate().unwrap();
    }

    #[test]
    fn parses_stages_and_sequence() {
        let toml_str = r#"
[soy]
core_dir = "src/core"
skip_generation = true

[[stage]]
name = "build:globals"
command = { program = "node", args = ["bundle.js"] }

[[stage]]
name = "build:min"
deps = ["build:globals"]
command = { program = "uglifyjs" }

[build]
sequence = [["clean"], ["soy"], ["build:min"]]
"#;
        let config: TasksConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.soy.core_dir, Some(PathBuf::from("src/core")));
        assert!(config.soy.skip_generation);
        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.stages[1].deps, vec!["build:globals"]);
        assert!(config.stages[1].command.as_ref().unwrap().args.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_dependency() {
        let toml_str = r#"
[[stage]]
name = "bundle"
deps = ["jspm"]
"#;
        let config: TasksConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.validate(),
            Err(TasksError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_and_builtin_names() {
        let toml_str = r#"
[[stage]]
name = "soy"
"#;
        let config: TasksConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_patterns() {
        let config: TasksConfig = toml::from_str("[soy]\npatterns = []").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_custom_launchers() {
        let toml_str = r#"
[saucelabs.launchers.sl_edge]
browser_name = "MicrosoftEdge"
platform = "Windows 10"
"#;
        let config: TasksConfig = toml::from_str(toml_str).unwrap();
        let edge = &config.saucelabs.launchers["sl_edge"];
        assert_eq!(edge.browser_name, "MicrosoftEdge");
        assert_eq!(edge.version, None);
    }

    #[test]
    fn rejects_watch_in_build_sequence() {
        let config: TasksConfig = toml::from_str("[build]\nsequence = [[\"soy\"], [\"watch\"]]\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(TasksError::ConfigInvalid { reason }) if reason.contains("'watch'")
        ));
    }
}
