//! # Coinstats Core
//!
//! Polls cryptocurrency exchanges for bid/ask/volume quotes, normalizes each
//! vendor's JSON into an [`ObservationRecord`], and hands the rows to the
//! observation store.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | One adapter per exchange |
//! | [`config`] | JSON configuration with hot reload |
//! | [`currency`] | Currency label normalization, vendor value parsing |
//! | [`exchange`] | The [`Exchange`] identifier |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`scheduler`] | Fixed-interval poll loop |
//! | [`source`] | Adapter contract and fetch errors |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use coinstats_core::{ConfigHandle, ObservationStore, PollScheduler, ReqwestHttpClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(ConfigHandle::from_file(coinstats_core::default_config_path())?);
//! let store = ObservationStore::open_in_memory()?;
//! let scheduler =
//!     PollScheduler::with_default_adapters(Arc::new(ReqwestHttpClient::new()), store, config);
//! let report = scheduler.run_cycle().await;
//! println!("{} observations written", report.observations_written);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod currency;
pub mod error;
pub mod exchange;
pub mod http_client;
pub mod scheduler;
pub mod source;

pub use adapters::default_adapters;
pub use config::{default_config_path, AppConfig, ConfigError, ConfigHandle};
pub use error::ValidationError;
pub use exchange::Exchange;
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StubHttpClient};
pub use scheduler::{CycleReport, PollScheduler};
pub use source::{ExchangeAdapter, FetchError, FetchErrorKind};

pub use coinstats_warehouse::{LatestObservation, ObservationRecord, ObservationStore, StoreConfig, StoreError};
