use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use coinstats_warehouse::ObservationRecord;
use serde::Deserialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::currency::{normalize_currency_code, VendorValue, DEFAULT_BASE_TICKER};
use crate::http_client::HttpClient;
use crate::source::{build_observation, fetch_json, poll_time, ExchangeAdapter, RawQuote};
use crate::Exchange;

/// Poloniex returns every market in one map keyed by pair name.
#[derive(Clone)]
pub struct PoloniexAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl PoloniexAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoloniexTicker {
    lowest_ask: Option<VendorValue>,
    highest_bid: Option<VendorValue>,
    base_volume: Option<VendorValue>,
}

impl ExchangeAdapter for PoloniexAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Poloniex
    }

    fn poll<'a>(
        &'a self,
        config: &'a AppConfig,
    ) -> Pin<Box<dyn Future<Output = Vec<ObservationRecord>> + Send + 'a>> {
        Box::pin(async move {
            let settings = &config.exchanges.poloniex;
            if settings.url.is_empty() {
                debug!(exchange = %Exchange::Poloniex, "no url configured");
                return Vec::new();
            }

            let now = poll_time();
            let tickers = match fetch_json::<BTreeMap<String, PoloniexTicker>>(
                self.http_client.as_ref(),
                Exchange::Poloniex,
                &settings.url,
                config.poll.request_timeout_ms,
            )
            .await
            {
                Ok(tickers) => tickers,
                Err(error) => {
                    error.log();
                    return Vec::new();
                }
            };

            let mut observations = Vec::with_capacity(tickers.len());
            for (pair, ticker) in &tickers {
                let result = build_observation(
                    Exchange::Poloniex,
                    normalize_currency_code(pair, DEFAULT_BASE_TICKER),
                    now,
                    RawQuote {
                        ask: ticker.lowest_ask.as_ref(),
                        bid: ticker.highest_bid.as_ref(),
                        volume: ticker.base_volume.as_ref(),
                    },
                );
                match result {
                    Ok(observation) => observations.push(observation),
                    Err(error) => error.log(),
                }
            }
            observations
        })
    }
}
