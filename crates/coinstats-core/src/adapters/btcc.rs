use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use coinstats_warehouse::ObservationRecord;
use serde::Deserialize;

use super::poll_each_ticker;
use crate::config::AppConfig;
use crate::currency::{normalize_currency_code, parse_epoch_millis, VendorValue, DEFAULT_BASE_TICKER};
use crate::http_client::HttpClient;
use crate::source::{build_observation, ExchangeAdapter, FetchError, RawQuote};
use crate::Exchange;

/// BTCChina reports numbers as JSON floats and timestamps in milliseconds.
#[derive(Clone)]
pub struct BtccAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl BtccAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

#[derive(Debug, Deserialize)]
struct BtccResponse {
    ticker: BtccTicker,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BtccTicker {
    ask_price: Option<VendorValue>,
    bid_price: Option<VendorValue>,
    volume: Option<VendorValue>,
    timestamp: Option<VendorValue>,
}

fn normalize(
    ticker: &str,
    payload: BtccResponse,
    now: i64,
) -> Result<Option<ObservationRecord>, FetchError> {
    let quote = payload.ticker;
    build_observation(
        Exchange::BtcChina,
        normalize_currency_code(ticker, DEFAULT_BASE_TICKER),
        parse_epoch_millis(quote.timestamp.as_ref()).unwrap_or(now),
        RawQuote {
            ask: quote.ask_price.as_ref(),
            bid: quote.bid_price.as_ref(),
            volume: quote.volume.as_ref(),
        },
    )
    .map(Some)
}

impl ExchangeAdapter for BtccAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::BtcChina
    }

    fn poll<'a>(
        &'a self,
        config: &'a AppConfig,
    ) -> Pin<Box<dyn Future<Output = Vec<ObservationRecord>> + Send + 'a>> {
        Box::pin(poll_each_ticker(
            self.http_client.as_ref(),
            Exchange::BtcChina,
            &config.exchanges.btcc,
            config.poll.request_timeout_ms,
            normalize,
        ))
    }
}
