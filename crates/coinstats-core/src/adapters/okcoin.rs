use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use coinstats_warehouse::ObservationRecord;
use serde::Deserialize;

use super::poll_each_ticker;
use crate::config::AppConfig;
use crate::currency::{normalize_currency_code, parse_epoch_seconds, VendorValue, DEFAULT_BASE_TICKER};
use crate::http_client::HttpClient;
use crate::source::{build_observation, ExchangeAdapter, FetchError, RawQuote};
use crate::Exchange;

#[derive(Clone)]
pub struct OkCoinAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl OkCoinAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

#[derive(Debug, Deserialize)]
struct OkCoinResponse {
    date: Option<VendorValue>,
    ticker: OkCoinTicker,
}

#[derive(Debug, Deserialize)]
struct OkCoinTicker {
    buy: Option<VendorValue>,
    sell: Option<VendorValue>,
    vol: Option<VendorValue>,
}

fn normalize(
    ticker: &str,
    payload: OkCoinResponse,
    now: i64,
) -> Result<Option<ObservationRecord>, FetchError> {
    build_observation(
        Exchange::OkCoin,
        normalize_currency_code(ticker, DEFAULT_BASE_TICKER),
        parse_epoch_seconds(payload.date.as_ref()).unwrap_or(now),
        RawQuote {
            ask: payload.ticker.sell.as_ref(),
            bid: payload.ticker.buy.as_ref(),
            volume: payload.ticker.vol.as_ref(),
        },
    )
    .map(Some)
}

impl ExchangeAdapter for OkCoinAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::OkCoin
    }

    fn poll<'a>(
        &'a self,
        config: &'a AppConfig,
    ) -> Pin<Box<dyn Future<Output = Vec<ObservationRecord>> + Send + 'a>> {
        Box::pin(poll_each_ticker(
            self.http_client.as_ref(),
            Exchange::OkCoin,
            &config.exchanges.okcoin,
            config.poll.request_timeout_ms,
            normalize,
        ))
    }
}
