use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod evaluate;
mod history_cmd;
mod logging;
mod state;

use evaluate::RequestArgs;

#[derive(Parser, Debug)]
#[command(
    name = "soa",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SOA_BUILD_SHA"), ")"),
    about = "SOA 48-hour cooldown rule simulator"
)]
struct Cli {
    /// Debug-level logging on stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the cooldown rule once and print payload + result as JSON
    Evaluate(RequestArgs),

    /// Evaluate repeatedly, feeding each minimum date back as "today"
    Simulate {
        #[command(flatten)]
        request: RequestArgs,

        /// Number of iterations (default from config [simulation].default_steps)
        #[arg(long)]
        steps: Option<usize>,
    },

    /// Evaluate for a member selection read from a JSON file
    Members {
        /// JSON array of members (recordedAtTimeUtc, campaigns[].postEnrollmentStartDate).
        /// SOA history comes from this file, so `--soa` is not accepted
        #[arg(long, conflicts_with = "soa")]
        file: PathBuf,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Edit the saved SOA history
    History {
        #[command(subcommand)]
        command: history_cmd::HistoryCommand,
    },

    /// Manage ~/.soa/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let cfg = config::load_config()?;
    tracing::debug!(?cfg, "loaded config");

    match cli.command {
        Command::Evaluate(request) => evaluate::evaluate(request, &cfg)?,

        Command::Simulate { request, steps } => evaluate::simulate(request, steps, &cfg)?,

        Command::Members { file, request } => evaluate::members(&file, request, &cfg)?,

        Command::History { command } => {
            let policy = cfg.rules.to_policy()?;
            history_cmd::run(command, policy.calendar_timezone, policy.target_timezone)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}
