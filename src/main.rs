mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod logging;
mod services;
mod workflow;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::summarize::{self, SummarizeArgs};
use crate::error::AppResult;

#[derive(Parser)]
#[command(
    name = "riddlesolver",
    author,
    version,
    about = "Summarize git commit history with a language model",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    summarize: SummarizeArgs,

    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage CLI configuration.
    Config(ConfigArgs),
    /// Verify and store a GitHub personal access token.
    #[command(name = "grant-auth")]
    GrantAuth,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::setup_logger(cli.verbosity.tracing_level_filter());

    if let Err(error) = run(cli).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    match cli.command {
        Some(Commands::Config(args)) => config_cmd::run(args.command),
        Some(Commands::GrantAuth) => cmd::auth::run().await,
        None => summarize::run(cli.summarize).await,
    }
}
