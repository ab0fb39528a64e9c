use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use coinstats_warehouse::ObservationRecord;
use serde::Deserialize;

use super::poll_each_ticker;
use crate::config::AppConfig;
use crate::currency::{normalize_currency_code, VendorValue, DEFAULT_BASE_TICKER};
use crate::http_client::HttpClient;
use crate::source::{build_observation, ExchangeAdapter, FetchError, RawQuote};
use crate::Exchange;

/// Bitsquare answers each ticker with a one-element array.
#[derive(Clone)]
pub struct BitsquareAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl BitsquareAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

#[derive(Debug, Deserialize)]
struct BitsquareTicker {
    buy: Option<VendorValue>,
    sell: Option<VendorValue>,
    volume_right: Option<VendorValue>,
}

fn normalize(
    ticker: &str,
    payload: Vec<BitsquareTicker>,
    now: i64,
) -> Result<Option<ObservationRecord>, FetchError> {
    let Some(first) = payload.first() else {
        return Ok(None);
    };

    build_observation(
        Exchange::Bitsquare,
        normalize_currency_code(ticker, DEFAULT_BASE_TICKER),
        now,
        RawQuote {
            ask: first.sell.as_ref(),
            bid: first.buy.as_ref(),
            volume: first.volume_right.as_ref(),
        },
    )
    .map(Some)
}

impl ExchangeAdapter for BitsquareAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Bitsquare
    }

    fn poll<'a>(
        &'a self,
        config: &'a AppConfig,
    ) -> Pin<Box<dyn Future<Output = Vec<ObservationRecord>> + Send + 'a>> {
        Box::pin(poll_each_ticker(
            self.http_client.as_ref(),
            Exchange::Bitsquare,
            &config.exchanges.bitsquare,
            config.poll.request_timeout_ms,
            normalize,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::config_with;
    use crate::http_client::StubHttpClient;

    const BASE: &str = "https://market.bitsquare.test/api/ticker?market=";

    #[tokio::test]
    async fn sell_is_ask_and_buy_is_bid() {
        let client = StubHttpClient::new()
            .with_json(
                format!("{BASE}dash_btc"),
                r#"[{"buy": "0.0700", "high": "0.0800", "last": "0.0750", "low": "0.0700",
                     "sell": "0.0760", "volume_left": "10", "volume_right": "0.75"}]"#,
            )
            .with_json(format!("{BASE}xmr_btc"), "[]");
        let config = config_with(|c| {
            c.exchanges.bitsquare.url = BASE.to_owned();
            c.exchanges.bitsquare.tickers = String::from("dash_btc,xmr_btc");
        });

        let rows = BitsquareAdapter::new(Arc::new(client)).poll(&config).await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].currency_code, "DASH");
        assert_eq!(rows[0].ask, Some(0.076));
        assert_eq!(rows[0].bid, Some(0.07));
        assert_eq!(rows[0].volume, Some(0.75));
    }
}
