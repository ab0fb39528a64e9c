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
pub struct BitfinexAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl BitfinexAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

#[derive(Debug, Deserialize)]
struct BitfinexTicker {
    ask: Option<VendorValue>,
    bid: Option<VendorValue>,
    volume: Option<VendorValue>,
    timestamp: Option<VendorValue>,
}

fn normalize(
    ticker: &str,
    payload: BitfinexTicker,
    now: i64,
) -> Result<Option<ObservationRecord>, FetchError> {
    build_observation(
        Exchange::Bitfinex,
        normalize_currency_code(ticker, DEFAULT_BASE_TICKER),
        parse_epoch_seconds(payload.timestamp.as_ref()).unwrap_or(now),
        RawQuote {
            ask: payload.ask.as_ref(),
            bid: payload.bid.as_ref(),
            volume: payload.volume.as_ref(),
        },
    )
    .map(Some)
}

impl ExchangeAdapter for BitfinexAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bitfinex
    }

    fn poll<'a>(
        &'a self,
        config: &'a AppConfig,
    ) -> Pin<Box<dyn Future<Output = Vec<ObservationRecord>> + Send + 'a>> {
        Box::pin(poll_each_ticker(
            self.http_client.as_ref(),
            Exchange::Bitfinex,
            &config.exchanges.bitfinex,
            config.poll.request_timeout_ms,
            normalize,
        ))
    }
}
