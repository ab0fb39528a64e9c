use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use coinstats_warehouse::ObservationRecord;
use serde::Deserialize;
use tracing::debug;

use crate::config::{AppConfig, LunoConfig};
use crate::currency::VendorValue;
use crate::http_client::HttpClient;
use crate::source::{build_observation, fetch_json, poll_time, ExchangeAdapter, FetchError, RawQuote};
use crate::Exchange;

/// Luno publishes every market in one `tickers` array.
#[derive(Clone)]
pub struct LunoAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl LunoAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

#[derive(Debug, Deserialize)]
struct LunoTickers {
    #[serde(default)]
    tickers: Vec<LunoTicker>,
}

#[derive(Debug, Deserialize)]
struct LunoTicker {
    #[serde(default)]
    pair: String,
    ask: Option<VendorValue>,
    bid: Option<VendorValue>,
    rolling_24_hour_volume: Option<VendorValue>,
}

fn normalize(
    ticker: &LunoTicker,
    settings: &LunoConfig,
    now: i64,
) -> Result<ObservationRecord, FetchError> {
    // Pairs are `XBT` followed by the quote currency.
    let currency_code = ticker
        .pair
        .get(3..)
        .filter(|code| !code.is_empty())
        .ok_or_else(|| {
            FetchError::invalid_field(
                Exchange::Luno,
                format!("pair '{}' has no quote currency", ticker.pair),
            )
        })?
        .to_ascii_uppercase();

    let mut observation = build_observation(
        Exchange::Luno,
        currency_code,
        now,
        RawQuote {
            ask: ticker.ask.as_ref(),
            bid: ticker.bid.as_ref(),
            volume: ticker.rolling_24_hour_volume.as_ref(),
        },
    )?;
    if observation.volume.is_none() {
        observation.volume = Some(settings.default_volume);
    }
    Ok(observation)
}

impl ExchangeAdapter for LunoAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Luno
    }

    fn poll<'a>(
        &'a self,
        config: &'a AppConfig,
    ) -> Pin<Box<dyn Future<Output = Vec<ObservationRecord>> + Send + 'a>> {
        Box::pin(async move {
            let settings = &config.exchanges.luno;
            if settings.url.is_empty() {
                debug!(exchange = %Exchange::Luno, "no url configured");
                return Vec::new();
            }

            let now = poll_time();
            let payload = match fetch_json::<LunoTickers>(
                self.http_client.as_ref(),
                Exchange::Luno,
                &settings.url,
                config.poll.request_timeout_ms,
            )
            .await
            {
                Ok(payload) => payload,
                Err(error) => {
                    error.log();
                    return Vec::new();
                }
            };

            payload
                .tickers
                .iter()
                .filter_map(|ticker| match normalize(ticker, settings, now) {
                    Ok(observation) => Some(observation),
                    Err(error) => {
                        error.log();
                        None
                    }
                })
                .collect()
        })
    }
}
