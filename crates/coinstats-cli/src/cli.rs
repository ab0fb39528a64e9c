//! Command-line arguments for the `coinstats` binary.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `serve` | Poll exchanges on an interval and serve the query API (default) |
//! | `poll-once` | Run one poll cycle and print its report |
//! | `latest` | Print the latest observation for an exchange and currency |
//! | `exchanges` | List stored exchanges, or currency codes for one exchange |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "coinstats",
    version,
    about = "Poll cryptocurrency exchanges and serve their latest quotes"
)]
pub struct Cli {
    /// JSON configuration file. Defaults to `$COINSTATS_HOME/config.json`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Observation database file, overriding `server.database_path`.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll on the configured interval and serve the query API.
    Serve(ServeArgs),
    /// Run a single poll cycle, then exit.
    PollOnce,
    /// Print the latest observation for one exchange and currency code.
    Latest(LatestArgs),
    /// List stored exchanges, or the currency codes stored for one exchange.
    Exchanges(ExchangesArgs),
}

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Listen port, overriding `server.port`.
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Args)]
pub struct LatestArgs {
    /// Exchange name, e.g. `Kraken`.
    pub exchange: String,
    /// Normalized currency code, e.g. `EUR`.
    pub currency_code: String,
}

#[derive(Debug, Args)]
pub struct ExchangesArgs {
    /// Show currency codes for this exchange instead.
    pub exchange: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["coinstats"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn latest_takes_exchange_and_currency() {
        let cli = Cli::try_parse_from(["coinstats", "--database", "/tmp/x.duckdb", "latest", "Kraken", "EUR"])
            .expect("parse");
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/x.duckdb")));
        match cli.command {
            Some(Command::Latest(args)) => {
                assert_eq!(args.exchange, "Kraken");
                assert_eq!(args.currency_code, "EUR");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
