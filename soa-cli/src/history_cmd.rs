use anyhow::{bail, Result};
use chrono_tz::Tz;
use clap::Subcommand;
use soa_core::{parse_instant, to_timezone};

use crate::state::{history_path, read_history, write_history, SessionHistory};

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Append an SOA instant to the session history
    Add { timestamp: String },

    /// Remove the entry at INDEX (as shown by `list`)
    Remove { index: usize },

    /// Show the session history in UTC and the target zone
    List,

    /// Restore the seed history
    Reset,
}

pub fn run(cmd: HistoryCommand, calendar: Tz, target: Tz) -> Result<()> {
    match cmd {
        HistoryCommand::Add { timestamp } => {
            let instant = parse_instant(&timestamp, calendar)?;
            let mut history = read_history(calendar)?;
            history.entries.push(instant);
            write_history(&history)?;
            tracing::debug!(%instant, "added SOA");
            println!("Added {} ({} entries)", instant.to_rfc3339(), history.entries.len());
        }
        HistoryCommand::Remove { index } => {
            let mut history = read_history(calendar)?;
            if index >= history.entries.len() {
                bail!(
                    "no entry at index {} (history has {})",
                    index,
                    history.entries.len()
                );
            }
            let removed = history.entries.remove(index);
            write_history(&history)?;
            println!("Removed {}", removed.to_rfc3339());
        }
        HistoryCommand::List => {
            let history = read_history(calendar)?;
            if history.entries.is_empty() {
                println!("(empty)");
            }
            for (i, e) in history.entries.iter().enumerate() {
                println!("{}. {} | {}", i, e.to_rfc3339(), to_timezone(*e, target));
            }
        }
        HistoryCommand::Reset => {
            write_history(&SessionHistory::seeded(calendar)?)?;
            println!("Reset {}", history_path()?.display());
        }
    }
    Ok(())
}
