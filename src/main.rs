mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Soy { skip_generation } => {
            commands::stage::run(cli.project, "soy".into(), skip_generation)
        }
        Commands::Check => commands::check::run(cli.project),
        Commands::Run { stage } => commands::stage::run(cli.project, stage, false),
        Commands::Build => commands::stage::run(cli.project, "build".into(), false),
        Commands::Clean => commands::stage::run(cli.project, "clean".into(), false),
        Commands::Test { kind } => commands::stage::run(cli.project, kind.to_string(), false),
        Commands::Watch => commands::stage::run(cli.project, "watch".into(), false),
        Commands::Params { files } => commands::params::run(files),
    }
}
