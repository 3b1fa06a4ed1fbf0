use clap::{Parser, Subcommand};
use soy_tasks::karma::TestPreset;

#[derive(Parser)]
#[command(
    name = "soy-tasks",
    about = "Build tasks for soy-templated front-end components",
    version
)]
pub struct Cli {
    /// Project root containing soy-tasks.toml
    #[arg(short, long, global = true, default_value = ".")]
    pub project: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate, compile and wrap the soy templates
    Soy {
        /// Compile the templates without generated boilerplate
        #[arg(long)]
        skip_generation: bool,
    },

    /// Check that generated templates in the build directory are up to date
    Check,

    /// Run a stage and its dependencies
    Run {
        /// Stage name (e.g. soy, clean, build:min)
        stage: String,
    },

    /// Run the build sequence
    Build,

    /// Remove the build directory
    Clean,

    /// Run the test suite
    Test {
        #[arg(value_enum, default_value_t = TestPreset::Unit)]
        kind: TestPreset,
    },

    /// Build, then rebuild whenever a template source changes
    Watch,

    /// Print the params footer generated for template files
    Params {
        /// Template sources (.soy)
        #[arg(required = true)]
        files: Vec<String>,
    },
}
