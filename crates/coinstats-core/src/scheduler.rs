//! Fixed-interval poll loop.
//!
//! Each cycle runs every adapter once, in order, and appends whatever they
//! return. Adapters never fail past their own boundary, so one broken exchange
//! costs only its own rows for that cycle.

use std::sync::Arc;
use std::time::Duration;

use coinstats_warehouse::{ObservationRecord, ObservationStore};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapters::default_adapters;
use crate::config::ConfigHandle;
use crate::http_client::HttpClient;
use crate::source::ExchangeAdapter;

/// Outcome of a single poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub adapters_run: usize,
    pub observations_written: usize,
    /// Returned by an adapter but rejected or lost by the store.
    pub observations_dropped: usize,
}

pub struct PollScheduler {
    adapters: Vec<Arc<dyn ExchangeAdapter>>,
    store: ObservationStore,
    config: Arc<ConfigHandle>,
}

impl PollScheduler {
    pub fn new(
        adapters: Vec<Arc<dyn ExchangeAdapter>>,
        store: ObservationStore,
        config: Arc<ConfigHandle>,
    ) -> Self {
        Self {
            adapters,
            store,
            config,
        }
    }

    /// Scheduler over every supported exchange.
    pub fn with_default_adapters(
        http_client: Arc<dyn HttpClient>,
        store: ObservationStore,
        config: Arc<ConfigHandle>,
    ) -> Self {
        Self::new(default_adapters(http_client), store, config)
    }

    /// Run every adapter exactly once.
    pub async fn run_cycle(&self) -> CycleReport {
        if let Err(error) = self.config.reload_if_changed() {
            warn!(%error, "keeping previous configuration");
        }
        let config = self.config.snapshot();

        let mut report = CycleReport::default();
        for adapter in &self.adapters {
            let exchange = adapter.exchange();
            let observations = adapter.poll(&config).await;
            let returned = observations.len();
            let written = self.persist(observations).await;

            report.adapters_run += 1;
            report.observations_written += written;
            report.observations_dropped += returned - written;
            info!(%exchange, returned, written, "ran {exchange} ticker");
        }
        report
    }

    async fn persist(&self, observations: Vec<ObservationRecord>) -> usize {
        if observations.is_empty() {
            return 0;
        }

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            observations
                .iter()
                .filter(|observation| store.append(observation).is_some())
                .count()
        })
        .await
        .unwrap_or_else(|error| {
            warn!(%error, "store task failed");
            0
        })
    }

    /// Poll until `shutdown` is cancelled, sleeping the configured interval
    /// between cycles.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(adapters = self.adapters.len(), "poll scheduler started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                report = self.run_cycle() => {
                    info!(
                        adapters_run = report.adapters_run,
                        written = report.observations_written,
                        dropped = report.observations_dropped,
                        "poll cycle complete"
                    );
                }
            }

            let interval = Duration::from_secs(self.config.snapshot().poll.interval_secs.max(1));
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        info!("poll scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::AppConfig;
    use crate::http_client::StubHttpClient;
    use crate::Exchange;

    struct CountingAdapter {
        exchange: Exchange,
        calls: AtomicUsize,
        rows: Vec<ObservationRecord>,
    }

    impl CountingAdapter {
        fn new(exchange: Exchange, rows: Vec<ObservationRecord>) -> Arc<Self> {
            Arc::new(Self {
                exchange,
                calls: AtomicUsize::new(0),
                rows,
            })
        }
    }

    impl ExchangeAdapter for CountingAdapter {
        fn exchange(&self) -> Exchange {
            self.exchange
        }

        fn poll<'a>(
            &'a self,
            _config: &'a AppConfig,
        ) -> Pin<Box<dyn Future<Output = Vec<ObservationRecord>> + Send + 'a>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.rows.clone()
            })
        }
    }

    fn store() -> ObservationStore {
        ObservationStore::open_in_memory().expect("in-memory store")
    }

    #[tokio::test]
    async fn every_adapter_runs_once_per_cycle_even_when_some_yield_nothing() {
        let failing = CountingAdapter::new(Exchange::Luno, Vec::new());
        let healthy = CountingAdapter::new(
            Exchange::Bitstamp,
            vec![ObservationRecord::new("Bitstamp", "USD").with_quote(Some(2.0), Some(1.0), None)],
        );
        let rejected = CountingAdapter::new(Exchange::Kraken, vec![ObservationRecord::new("Kraken", "")]);
        let adapters: Vec<Arc<dyn ExchangeAdapter>> =
            vec![failing.clone(), healthy.clone(), rejected.clone()];
        let scheduler = PollScheduler::new(
            adapters,
            store(),
            Arc::new(ConfigHandle::fixed(AppConfig::default())),
        );

        let report = scheduler.run_cycle().await;

        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rejected.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            report,
            CycleReport {
                adapters_run: 3,
                observations_written: 1,
                observations_dropped: 1,
            }
        );
    }

    #[test]
    fn cycle_report_serializes_with_field_names() {
        let report = CycleReport {
            adapters_run: 8,
            observations_written: 5,
            observations_dropped: 2,
        };

        assert_eq!(
            serde_json::to_value(report).expect("serialize report"),
            serde_json::json!({
                "adapters_run": 8,
                "observations_written": 5,
                "observations_dropped": 2,
            })
        );
    }

    #[tokio::test]
    async fn decode_failure_in_one_exchange_leaves_the_others_intact() {
        let http = Arc::new(
            StubHttpClient::new()
                .with_json("https://luno.test/tickers", "{ definitely not json")
                .with_json(
                    "https://bitstamp.test/ticker",
                    r#"{"timestamp": "1500000000", "ask": "101", "bid": "99", "volume": "5"}"#,
                ),
        );
        let mut config = AppConfig::default();
        config.exchanges.luno.url = String::from("https://luno.test/tickers");
        config.exchanges.bitstamp.url = String::from("https://bitstamp.test/ticker");
        config.exchanges.poloniex.url = String::from("https://poloniex.test/unreachable");
        let store = store();
        let scheduler = PollScheduler::with_default_adapters(
            http.clone(),
            store.clone(),
            Arc::new(ConfigHandle::fixed(config)),
        );

        let report = scheduler.run_cycle().await;

        assert_eq!(report.adapters_run, Exchange::ALL.len());
        assert_eq!(report.observations_written, 1);
        assert_eq!(
            http.calls(),
            vec![
                "https://luno.test/tickers",
                "https://bitstamp.test/ticker",
                "https://poloniex.test/unreachable",
            ]
        );
        assert_eq!(store.latest("Bitstamp", "USD").expect("stored").average, 100.0);
    }

    #[tokio::test]
    async fn run_stops_when_cancelled() {
        let adapter = CountingAdapter::new(Exchange::Luno, Vec::new());
        let adapters: Vec<Arc<dyn ExchangeAdapter>> = vec![adapter.clone()];
        let scheduler = PollScheduler::new(
            adapters,
            store(),
            Arc::new(ConfigHandle::fixed(AppConfig::default())),
        );
        let shutdown = CancellationToken::new();

        let handle = {
            let shutdown = shutdown.clone();
            async move { scheduler.run(shutdown).await }
        };
        let cancel = async {
            while adapter.calls.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
            shutdown.cancel();
        };
        tokio::time::timeout(Duration::from_secs(5), async { tokio::join!(handle, cancel) })
            .await
            .expect("scheduler stops after cancellation");

        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    }
}
