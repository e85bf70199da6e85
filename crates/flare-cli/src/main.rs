//! Flare CLI - command-line front end for the emergency report map.
//!
//! # Usage
//!
//! ```bash
//! # Report an emergency (address is looked up when no coordinate is given)
//! flare add --name "Jo Park" --phone 6041234567 --type Fire --address "511 Royal Ave, New Westminster"
//!
//! # Reports inside a viewport, newest first
//! flare list --bounds 49,-123,49.5,-122.5 --sort time --desc
//!
//! # Privileged actions
//! FLARE_SECRET=... flare resolve 3 --passcode ...
//!
//! # Geocoding lookups
//! flare search "royal ave"
//! flare reverse 49.2 -122.91
//! ```

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{CliSession, ReportFields};
use flare_core::access::Passcode;
use flare_core::config::DEFAULT_SUGGESTION_LIMIT;
use flare_core::sort::{SortKey, SortOrder};
use flare_core::BoundingBox;
use output::CommandOutput;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Passcode supplied for privileged actions.
pub const PASSCODE_ENV: &str = "FLARE_PASSCODE";

/// Flare emergency report map CLI.
///
/// Reports are stored in the platform data directory. Resolving, modifying
/// and deleting reports require the shared passcode.
#[derive(Parser)]
#[command(name = "flare", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Custom data directory (default: platform standard location)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Passcode for resolve, modify and delete
    #[arg(long, global = true, env = PASSCODE_ENV, hide_env_values = true)]
    passcode: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Report(ReportCommand),

    /// Address suggestions for a query
    Search {
        query: String,

        /// Maximum number of suggestions
        #[arg(short = 'n', long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },

    /// Address at a coordinate
    Reverse {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
}

/// Commands that open the report file.
#[derive(Subcommand)]
enum ReportCommand {
    /// Submit a new report
    Add(ReportFields),

    /// List reports, optionally only those inside a viewport
    List {
        /// Viewport as south,west,north,east
        #[arg(long, allow_hyphen_values = true)]
        bounds: Option<BoundingBox>,

        /// Sort column: id, type, reporter, address, status or time
        #[arg(long, default_value = "id")]
        sort: SortKey,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Show one report
    Show { id: u64 },

    /// Focus a report and print where the map should fly to
    Select { id: u64 },

    /// Mark a report resolved
    Resolve { id: u64 },

    /// Edit a report's fields
    Modify {
        id: u64,

        #[command(flatten)]
        fields: ReportFields,
    },

    /// Delete a report
    Delete { id: u64 },

    /// Delete every report (no passcode)
    Clear,
}

async fn run_report_command(
    session: &mut CliSession,
    command: ReportCommand,
    passcode: &Passcode,
) -> Result<CommandOutput> {
    let output = match command {
        ReportCommand::Add(fields) => commands::add(session, fields).await?,
        ReportCommand::List { bounds, sort, desc } => {
            let order = if desc {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            commands::list(session, bounds, sort, order)
        }
        ReportCommand::Show { id } => commands::show(session, id)?,
        ReportCommand::Select { id } => commands::select(session, id)?,
        ReportCommand::Resolve { id } => commands::resolve(session, id, passcode).await?,
        ReportCommand::Modify { id, fields } => {
            commands::modify(session, id, fields, passcode).await?
        }
        ReportCommand::Delete { id } => commands::delete(session, id, passcode).await?,
        ReportCommand::Clear => commands::clear(session).await?,
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let passcode = Passcode::new(cli.passcode.unwrap_or_default());

    let result = match cli.command {
        Command::Report(command) => {
            let mut session = commands::open_session(cli.data_dir.as_ref()).await?;
            run_report_command(&mut session, command, &passcode).await?
        }
        Command::Search { query, limit } => {
            let geocoder = commands::open_geocoder()?;
            commands::search(&geocoder, &query, limit).await?
        }
        Command::Reverse { lat, lon } => {
            let geocoder = commands::open_geocoder()?;
            commands::reverse(&geocoder, lat, lon).await?
        }
    };

    let output = if cli.json {
        output::format_json(&result)
    } else {
        output::format_human(&result)
    };
    println!("{}", output);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_with_negative_bounds() {
        let cli = Cli::try_parse_from([
            "flare",
            "list",
            "--bounds",
            "-33.9,18.4,-33.8,18.5",
            "--sort",
            "time",
            "--desc",
        ])
        .unwrap();

        match cli.command {
            Command::Report(ReportCommand::List { bounds, sort, desc }) => {
                assert_eq!(bounds.unwrap().south, -33.9);
                assert_eq!(sort, SortKey::Timestamp);
                assert!(desc);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_add_with_coordinate() {
        let cli = Cli::try_parse_from([
            "flare", "add", "--name", "Jo", "--phone", "6041234567", "--type", "Fire", "--lat",
            "49.2", "--lng", "-122.9",
        ])
        .unwrap();

        match cli.command {
            Command::Report(ReportCommand::Add(fields)) => {
                assert_eq!(fields.lat, Some(49.2));
                assert_eq!(fields.lng, Some(-122.9));
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_lat_requires_lng() {
        assert!(Cli::try_parse_from(["flare", "add", "--lat", "49.2"]).is_err());
    }

    #[test]
    fn test_report_and_lookup_commands_share_one_level() {
        let cli = Cli::try_parse_from(["flare", "clear"]).unwrap();
        assert!(matches!(cli.command, Command::Report(ReportCommand::Clear)));

        let cli = Cli::try_parse_from(["flare", "search", "royal ave", "-n", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Search { limit: 3, .. }));
    }

    #[test]
    fn test_parse_reverse_negative_longitude() {
        let cli = Cli::try_parse_from(["flare", "reverse", "49.2", "-122.91"]).unwrap();
        assert!(matches!(cli.command, Command::Reverse { lat, lon } if lat == 49.2 && lon == -122.91));
    }
}
