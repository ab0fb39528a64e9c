//! # Coinstats Warehouse
//!
//! Append-only observation store backed by `DuckDB`.
//!
//! Every quote the poller collects becomes one row in `observations`. Rows are
//! never updated or deleted; "latest" for an (exchange, currency) pair is the
//! row with the highest surrogate id.
//!
//! ```rust,no_run
//! use coinstats_warehouse::{ObservationRecord, ObservationStore, StoreConfig};
//!
//! let store = ObservationStore::open(StoreConfig::default())?;
//! store.append(
//!     &ObservationRecord::new("Bitstamp", "USD").with_quote(Some(101.0), Some(99.0), Some(3.5)),
//! );
//! let latest = store.latest("Bitstamp", "USD")?;
//! println!("{} {}", latest.exchange, latest.average);
//! # Ok::<(), coinstats_warehouse::StoreError>(())
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `observations` | One row per polled quote |
//! | `schema_migrations` | Applied migration versions |

pub mod duckdb;
pub mod migrations;
pub mod models;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ::duckdb::{params, Connection, ToSql};
use thiserror::Error;
use tracing::{debug, warn};

pub use duckdb::DuckDbConnectionManager;
pub use models::{DistinctColumn, LatestObservation, ObservationRecord, StoredObservation};

/// Errors surfaced by store lookups.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nothing matched, or the lookup key was empty.
    #[error("{0}")]
    NotFound(String),

    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (creating the database directory).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

/// Where the observation database lives.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for coinstats data and configuration.
    pub coinstats_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let coinstats_home = resolve_coinstats_home();
        let db_path = coinstats_home.join("observations.duckdb");
        Self {
            coinstats_home,
            db_path,
        }
    }
}

impl StoreConfig {
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

/// Append-only log of exchange observations.
#[derive(Clone)]
pub struct ObservationStore {
    manager: DuckDbConnectionManager,
}

impl ObservationStore {
    /// Open the store described by `config`, creating the file and schema if needed.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = DuckDbConnectionManager::open(config.db_path)?;
        let store = Self { manager };
        store.initialize();
        Ok(store)
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            manager: DuckDbConnectionManager::open_in_memory()?,
        };
        store.initialize();
        Ok(store)
    }

    /// Create the schema if absent. Failures are logged and otherwise ignored;
    /// later operations report their own storage errors.
    pub fn initialize(&self) {
        let result = self
            .manager
            .acquire()
            .and_then(|connection| migrations::apply_migrations(&connection));
        if let Err(error) = result {
            warn!(%error, "failed to apply observation schema");
        }
    }

    /// Persist one observation.
    ///
    /// Returns the new row id, or `None` when the row was rejected or the
    /// write failed. Neither case is an error for the caller.
    pub fn append(&self, record: &ObservationRecord) -> Option<i64> {
        let row = match prepare_row(record) {
            Ok(row) => row,
            Err(reason) => {
                warn!(
                    exchange = %record.exchange,
                    currency_code = %record.currency_code,
                    reason,
                    "dropping observation"
                );
                return None;
            }
        };

        match self.insert(&row) {
            Ok(id) => {
                debug!(id, exchange = %row.exchange, currency_code = %row.currency_code, "observation stored");
                Some(id)
            }
            Err(error) => {
                warn!(
                    %error,
                    exchange = %row.exchange,
                    currency_code = %row.currency_code,
                    "failed to store observation"
                );
                None
            }
        }
    }

    fn insert(&self, row: &PreparedRow) -> Result<i64, StoreError> {
        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 6] = [
            &row.exchange,
            &row.timestamp,
            &row.ask,
            &row.bid,
            &row.volume,
            &row.currency_code,
        ];
        let id = connection.query_row(
            "INSERT INTO observations (exchange, timestamp, ask, bid, volume, currencyCode) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
            params.as_slice(),
            |r| r.get(0),
        )?;
        Ok(id)
    }

    /// Most recent observation for `exchange` and `currency_code`.
    ///
    /// Empty keys fail without touching storage.
    pub fn latest(
        &self,
        exchange: &str,
        currency_code: &str,
    ) -> Result<LatestObservation, StoreError> {
        if exchange.is_empty() || currency_code.is_empty() {
            return Err(StoreError::not_found("exchange or currency code empty"));
        }

        let connection = self.manager.acquire()?;
        let row = connection.query_row(
            "SELECT id, exchange, timestamp, ask, bid, volume, currencyCode \
             FROM observations WHERE exchange = ? AND currencyCode = ? \
             ORDER BY id DESC LIMIT 1",
            params![exchange, currency_code],
            read_stored_row,
        );

        match row {
            Ok(row) => Ok(LatestObservation::from(row)),
            Err(::duckdb::Error::QueryReturnedNoRows) => {
                Err(StoreError::not_found("no values found"))
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Distinct values of `column`, sorted.
    ///
    /// `CurrencyCode` requires a non-empty `exchange`. For `Exchange` a filter
    /// restricts the result to that exchange if it has rows.
    pub fn distinct_values(
        &self,
        column: DistinctColumn,
        exchange: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        let connection = self.manager.acquire()?;
        let values = match (column, exchange) {
            (DistinctColumn::CurrencyCode, Some(exchange)) if !exchange.is_empty() => {
                query_strings(
                    &connection,
                    "SELECT DISTINCT currencyCode FROM observations \
                     WHERE exchange = ? ORDER BY currencyCode",
                    &[&exchange],
                )?
            }
            (DistinctColumn::CurrencyCode, _) => {
                return Err(StoreError::not_found("exchange doesn't exist"));
            }
            (DistinctColumn::Exchange, Some(exchange)) => query_strings(
                &connection,
                "SELECT DISTINCT exchange FROM observations WHERE exchange = ? ORDER BY exchange",
                &[&exchange],
            )?,
            (DistinctColumn::Exchange, None) => query_strings(
                &connection,
                "SELECT DISTINCT exchange FROM observations ORDER BY exchange",
                &[],
            )?,
        };

        if values.is_empty() {
            let message = match column {
                DistinctColumn::CurrencyCode => "exchange doesn't exist",
                DistinctColumn::Exchange => "no exchanges exist",
            };
            return Err(StoreError::not_found(message));
        }
        Ok(values)
    }

    /// Every exchange with at least one stored observation.
    pub fn exchanges(&self) -> Result<Vec<String>, StoreError> {
        self.distinct_values(DistinctColumn::Exchange, None)
    }

    /// Every currency code stored for `exchange`.
    pub fn currency_codes(&self, exchange: &str) -> Result<Vec<String>, StoreError> {
        self.distinct_values(DistinctColumn::CurrencyCode, Some(exchange))
    }

    /// Total number of stored observations.
    pub fn count(&self) -> Result<u64, StoreError> {
        let connection = self.manager.acquire()?;
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[derive(Debug)]
struct PreparedRow {
    exchange: String,
    currency_code: String,
    timestamp: f64,
    ask: f64,
    bid: f64,
    volume: f64,
}

fn prepare_row(record: &ObservationRecord) -> Result<PreparedRow, &'static str> {
    if record.exchange.is_empty() {
        return Err("exchange is empty");
    }
    if record.currency_code.is_empty() {
        return Err("currency code is empty");
    }

    let quantities = [record.ask, record.bid, record.volume];
    if quantities
        .iter()
        .flatten()
        .any(|value| !value.is_finite() || *value < 0.0)
    {
        return Err("quantities must be finite and non-negative");
    }

    let timestamp = record.timestamp.unwrap_or_else(now_epoch_seconds);
    Ok(PreparedRow {
        exchange: record.exchange.clone(),
        currency_code: record.currency_code.clone(),
        timestamp: timestamp as f64,
        ask: record.ask.unwrap_or(0.0),
        bid: record.bid.unwrap_or(0.0),
        volume: record.volume.unwrap_or(0.0),
    })
}

fn read_stored_row(row: &::duckdb::Row<'_>) -> Result<StoredObservation, ::duckdb::Error> {
    let timestamp: f64 = row.get(2)?;
    Ok(StoredObservation {
        id: row.get(0)?,
        exchange: row.get(1)?,
        timestamp: timestamp as i64,
        ask: row.get(3)?,
        bid: row.get(4)?,
        volume: row.get(5)?,
        currency_code: row.get(6)?,
    })
}

fn query_strings(
    connection: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<String>, ::duckdb::Error> {
    let mut statement = connection.prepare(sql)?;
    let rows = statement.query_map(params, |row| row.get::<_, String>(0))?;
    rows.collect()
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

fn resolve_coinstats_home() -> PathBuf {
    if let Some(path) = env::var_os("COINSTATS_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".config").join("coinstats");
    }

    PathBuf::from(".coinstats")
}
