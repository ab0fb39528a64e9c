//! One adapter per supported exchange.

mod bitfinex;
mod bitsquare;
mod bitstamp;
mod btcc;
mod kraken;
mod luno;
mod okcoin;
mod poloniex;

use std::sync::Arc;

use coinstats_warehouse::ObservationRecord;
use serde::de::DeserializeOwned;
use tracing::debug;

pub use bitfinex::BitfinexAdapter;
pub use bitsquare::BitsquareAdapter;
pub use bitstamp::BitstampAdapter;
pub use btcc::BtccAdapter;
pub use kraken::KrakenAdapter;
pub use luno::LunoAdapter;
pub use okcoin::OkCoinAdapter;
pub use poloniex::PoloniexAdapter;

use crate::config::TickerEndpointConfig;
use crate::currency::parse_tickers;
use crate::http_client::HttpClient;
use crate::source::{fetch_json, poll_time, ExchangeAdapter, FetchError};
use crate::Exchange;

/// Build the adapter for `exchange`.
pub fn adapter_for(exchange: Exchange, http_client: Arc<dyn HttpClient>) -> Arc<dyn ExchangeAdapter> {
    match exchange {
        Exchange::Luno => Arc::new(LunoAdapter::new(http_client)),
        Exchange::Bitstamp => Arc::new(BitstampAdapter::new(http_client)),
        Exchange::Kraken => Arc::new(KrakenAdapter::new(http_client)),
        Exchange::Bitfinex => Arc::new(BitfinexAdapter::new(http_client)),
        Exchange::Bitsquare => Arc::new(BitsquareAdapter::new(http_client)),
        Exchange::BtcChina => Arc::new(BtccAdapter::new(http_client)),
        Exchange::OkCoin => Arc::new(OkCoinAdapter::new(http_client)),
        Exchange::Poloniex => Arc::new(PoloniexAdapter::new(http_client)),
    }
}

/// Every adapter, in run order.
pub fn default_adapters(http_client: Arc<dyn HttpClient>) -> Vec<Arc<dyn ExchangeAdapter>> {
    Exchange::ALL
        .into_iter()
        .map(|exchange| adapter_for(exchange, Arc::clone(&http_client)))
        .collect()
}

/// `base + ticker`, with the ticker percent-encoded.
pub(crate) fn ticker_url(base: &str, ticker: &str) -> String {
    format!("{base}{}", urlencoding::encode(ticker))
}

/// Shared loop for exchanges that take one request per configured ticker.
///
/// A failed request or row is logged and skipped; the remaining tickers still run.
pub(crate) async fn poll_each_ticker<T, F>(
    http_client: &dyn HttpClient,
    exchange: Exchange,
    settings: &TickerEndpointConfig,
    timeout_ms: Option<u64>,
    mut normalize: F,
) -> Vec<ObservationRecord>
where
    T: DeserializeOwned + Send,
    F: FnMut(&str, T, i64) -> Result<Option<ObservationRecord>, FetchError> + Send,
{
    if settings.url.is_empty() {
        debug!(%exchange, "no url configured");
        return Vec::new();
    }

    let mut observations = Vec::new();
    for ticker in parse_tickers(&settings.tickers) {
        let now = poll_time();
        let url = ticker_url(&settings.url, ticker);
        let result = fetch_json::<T>(http_client, exchange, &url, timeout_ms)
            .await
            .and_then(|payload| normalize(ticker, payload, now));

        match result {
            Ok(Some(observation)) => observations.push(observation),
            Ok(None) => debug!(%exchange, ticker, "no quote returned"),
            Err(error) => error.log(),
        }
    }
    observations
}
