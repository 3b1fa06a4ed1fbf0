#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TasksError {
    #[error("Malformed template document {path}: {reason}")]
    #[diagnostic(help("Every .soy file must declare its namespace, e.g. {{namespace Templates.MyWidget}}"))]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("Project config not found at {path}")]
    #[diagnostic(help("Create a soy-tasks.toml file in the project root"))]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse soy-tasks.toml")]
    #[diagnostic(help("Check the TOML syntax in your soy-tasks.toml file"))]
    ConfigParse {
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {reason}")]
    ConfigInvalid { reason: String },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Glob pattern error: {pattern}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to render generated template '{template}'")]
    TemplateRender {
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("Failed to serialize {context}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to start '{command}'")]
    #[diagnostic(help("Ensure the program is installed and on your PATH"))]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with status {}", code.map_or("unknown".to_string(), |c| c.to_string()))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Template compiler produced no output for {path}")]
    #[diagnostic(help("The compiler must write <file>.soy.js next to each input file"))]
    CompilerOutputMissing { path: PathBuf },

    #[error("Unknown stage '{name}'")]
    #[diagnostic(help("Declare the stage in soy-tasks.toml or use a built-in stage name"))]
    UnknownStage { name: String },

    #[error("Circular stage dependencies detected: {}", chain.join(" -> "))]
    #[diagnostic(help("Remove the dependency cycle from your [[stage]] declarations"))]
    CircularStages { chain: Vec<String> },

    #[error("Test run failed with status {}", code.map_or("unknown".to_string(), |c| c.to_string()))]
    TestRunFailed { code: Option<i32> },

    #[error("Failed to watch {path}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("{count} generated artifact(s) are out of date")]
    #[diagnostic(help("Run `soy-tasks soy` to regenerate them"))]
    StaleArtifacts { count: usize },
}

pub type Result<T> = std::result::Result<T, TasksError>;
