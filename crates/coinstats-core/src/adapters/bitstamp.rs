use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use coinstats_warehouse::ObservationRecord;
use serde::Deserialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::currency::{parse_epoch_seconds, VendorValue};
use crate::http_client::HttpClient;
use crate::source::{build_observation, fetch_json, poll_time, ExchangeAdapter, FetchError, RawQuote};
use crate::Exchange;

/// Bitstamp only quotes BTC/USD on the configured endpoint.
#[derive(Clone)]
pub struct BitstampAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl BitstampAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

#[derive(Debug, Deserialize)]
struct BitstampTicker {
    timestamp: Option<VendorValue>,
    ask: Option<VendorValue>,
    bid: Option<VendorValue>,
    volume: Option<VendorValue>,
}

fn normalize(ticker: &BitstampTicker, now: i64) -> Result<ObservationRecord, FetchError> {
    build_observation(
        Exchange::Bitstamp,
        String::from("USD"),
        parse_epoch_seconds(ticker.timestamp.as_ref()).unwrap_or(now),
        RawQuote {
            ask: ticker.ask.as_ref(),
            bid: ticker.bid.as_ref(),
            volume: ticker.volume.as_ref(),
        },
    )
}

impl ExchangeAdapter for BitstampAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bitstamp
    }

    fn poll<'a>(
        &'a self,
        config: &'a AppConfig,
    ) -> Pin<Box<dyn Future<Output = Vec<ObservationRecord>> + Send + 'a>> {
        Box::pin(async move {
            let settings = &config.exchanges.bitstamp;
            if settings.url.is_empty() {
                debug!(exchange = %Exchange::Bitstamp, "no url configured");
                return Vec::new();
            }

            let now = poll_time();
            let result = fetch_json::<BitstampTicker>(
                self.http_client.as_ref(),
                Exchange::Bitstamp,
                &settings.url,
                config.poll.request_timeout_ms,
            )
            .await
            .and_then(|ticker| normalize(&ticker, now));

            match result {
                Ok(observation) => vec![observation],
                Err(error) => {
                    error.log();
                    Vec::new()
                }
            }
        })
    }
}
