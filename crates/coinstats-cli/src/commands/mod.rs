mod exchanges;
mod latest;
mod poll_once;
mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use coinstats_core::{ConfigHandle, ObservationStore, StoreConfig};
use serde_json::Value;

use crate::cli::{Cli, Command, ServeArgs};
use crate::error::CliError;

/// Resolved inputs shared by every command.
pub struct Context {
    pub config: Arc<ConfigHandle>,
    pub database: Option<PathBuf>,
}

impl Context {
    /// `--database`, then `server.database_path`, then the default under the coinstats home.
    pub fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::default();
        match self
            .database
            .clone()
            .or_else(|| self.config.snapshot().server.database_path.clone())
        {
            Some(path) => config.with_db_path(path),
            None => config,
        }
    }

    pub fn open_store(&self) -> Result<ObservationStore, CliError> {
        Ok(ObservationStore::open(self.store_config())?)
    }
}

/// Dispatch the parsed command. Returns a JSON document to print, if any.
pub async fn run(cli: &Cli, context: &Context) -> Result<Option<Value>, CliError> {
    match &cli.command {
        None => serve::run(&ServeArgs::default(), context).await.map(|()| None),
        Some(Command::Serve(args)) => serve::run(args, context).await.map(|()| None),
        Some(Command::PollOnce) => poll_once::run(context).await.map(Some),
        Some(Command::Latest(args)) => latest::run(args, context).await.map(Some),
        Some(Command::Exchanges(args)) => exchanges::run(args, context).await.map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinstats_core::AppConfig;
    use tempfile::tempdir;

    #[test]
    fn database_flag_wins_over_config() {
        let mut config = AppConfig::default();
        config.server.database_path = Some(PathBuf::from("/var/lib/coinstats/from-config.duckdb"));
        let config = Arc::new(ConfigHandle::fixed(config));

        let context = Context {
            config: Arc::clone(&config),
            database: Some(PathBuf::from("/tmp/from-flag.duckdb")),
        };
        assert_eq!(context.store_config().db_path, PathBuf::from("/tmp/from-flag.duckdb"));

        let context = Context {
            config,
            database: None,
        };
        assert_eq!(
            context.store_config().db_path,
            PathBuf::from("/var/lib/coinstats/from-config.duckdb")
        );
    }

    #[tokio::test]
    async fn poll_once_with_nothing_configured_writes_nothing() {
        let temp = tempdir().expect("tempdir");
        let context = Context {
            config: Arc::new(ConfigHandle::fixed(AppConfig::default())),
            database: Some(temp.path().join("observations.duckdb")),
        };

        let report = poll_once::run(&context).await.expect("poll once");

        assert_eq!(report["adapters_run"], 8);
        assert_eq!(report["observations_written"], 0);
        assert_eq!(report["stored_total"], 0);
    }
}
