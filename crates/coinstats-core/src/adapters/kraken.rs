use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use coinstats_warehouse::ObservationRecord;
use serde::Deserialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::currency::{kraken_currency_code, parse_tickers, VendorValue};
use crate::http_client::HttpClient;
use crate::source::{build_observation, fetch_json, poll_time, ExchangeAdapter, FetchError, RawQuote};
use crate::Exchange;

/// Kraken public ticker, queried for several pairs in one request.
///
/// Disabled unless both an API key and secret are configured.
#[derive(Clone)]
pub struct KrakenAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl KrakenAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

#[derive(Debug, Deserialize)]
struct KrakenResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: BTreeMap<String, KrakenTicker>,
}

/// `a` = ask `[price, whole lot volume, lot volume]`, `b` = bid, `v` = volume `[today, last 24h]`.
#[derive(Debug, Deserialize)]
struct KrakenTicker {
    #[serde(default)]
    a: Vec<VendorValue>,
    #[serde(default)]
    b: Vec<VendorValue>,
    #[serde(default)]
    v: Vec<VendorValue>,
}

fn request_url(base: &str, pairs: &[&str]) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    let pairs: Vec<_> = pairs
        .iter()
        .map(|pair| urlencoding::encode(pair).into_owned())
        .collect();
    format!("{base}{separator}pair={}", pairs.join(","))
}

fn normalize(pair: &str, ticker: &KrakenTicker, now: i64) -> Result<ObservationRecord, FetchError> {
    build_observation(
        Exchange::Kraken,
        kraken_currency_code(pair),
        now,
        RawQuote {
            ask: ticker.a.first(),
            bid: ticker.b.first(),
            volume: ticker.v.first(),
        },
    )
}

impl ExchangeAdapter for KrakenAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Kraken
    }

    fn poll<'a>(
        &'a self,
        config: &'a AppConfig,
    ) -> Pin<Box<dyn Future<Output = Vec<ObservationRecord>> + Send + 'a>> {
        Box::pin(async move {
            let settings = &config.exchanges.kraken;
            if !settings.has_credentials() {
                debug!(exchange = %Exchange::Kraken, "credentials missing, exchange disabled");
                return Vec::new();
            }
            let pairs = parse_tickers(&settings.pairs);
            if settings.url.is_empty() || pairs.is_empty() {
                debug!(exchange = %Exchange::Kraken, "no url or pairs configured");
                return Vec::new();
            }

            let now = poll_time();
            let response = fetch_json::<KrakenResponse>(
                self.http_client.as_ref(),
                Exchange::Kraken,
                &request_url(&settings.url, &pairs),
                config.poll.request_timeout_ms,
            )
            .await
            .and_then(|response| {
                if response.error.is_empty() {
                    Ok(response)
                } else {
                    Err(FetchError::upstream(Exchange::Kraken, response.error.join("; ")))
                }
            });

            let response = match response {
                Ok(response) => response,
                Err(error) => {
                    error.log();
                    return Vec::new();
                }
            };

            response
                .result
                .iter()
                .filter_map(|(pair, ticker)| match normalize(pair, ticker, now) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::config_with;
    use crate::http_client::StubHttpClient;

    const BASE: &str = "https://api.kraken.test/0/public/Ticker";
    const URL: &str = "https://api.kraken.test/0/public/Ticker?pair=XXBTZEUR,XXBTZUSD,XXBTZGBP";

    fn enabled() -> AppConfig {
        config_with(|c| {
            c.exchanges.kraken.url = BASE.to_owned();
            c.exchanges.kraken.api_key = String::from("key");
            c.exchanges.kraken.api_secret = String::from("secret");
        })
    }

    #[tokio::test]
    async fn multi_pair_response_is_normalized_per_pair() {
        let client = StubHttpClient::new().with_json(
            URL,
            r#"{"error": [], "result": {
                "XXBTZEUR": {"a": ["2400.1", "1", "1.000"], "b": ["2399.9", "2", "2.000"], "v": ["100.5", "900.2"]},
                "XXBTZUSD": {"a": ["2700.0", "1", "1.000"], "b": ["2699.0", "1", "1.000"], "v": ["50.0", "500.0"]}
            }}"#,
        );

        let rows = KrakenAdapter::new(Arc::new(client)).poll(&enabled()).await;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].currency_code, "EUR");
        assert_eq!(rows[0].ask, Some(2400.1));
        assert_eq!(rows[0].bid, Some(2399.9));
        assert_eq!(rows[0].volume, Some(100.5));
        assert_eq!(rows[1].currency_code, "USD");
    }

    #[tokio::test]
    async fn missing_credentials_disable_the_exchange() {
        let client = Arc::new(StubHttpClient::new());
        let config = config_with(|c| c.exchanges.kraken.url = BASE.to_owned());

        let rows = KrakenAdapter::new(client.clone()).poll(&config).await;

        assert!(rows.is_empty());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn vendor_error_array_yields_nothing() {
        let client = StubHttpClient::new()
            .with_json(URL, r#"{"error": ["EQuery:Unknown asset pair"], "result": {}}"#);

        let rows = KrakenAdapter::new(Arc::new(client)).poll(&enabled()).await;

        assert!(rows.is_empty());
    }

    #[test]
    fn request_url_appends_pairs() {
        assert_eq!(request_url(BASE, &["XXBTZEUR"]), format!("{BASE}?pair=XXBTZEUR"));
        assert_eq!(
            request_url("https://k.test/t?x=1", &["XXBTZEUR", "XXBTZUSD"]),
            "https://k.test/t?x=1&pair=XXBTZEUR,XXBTZUSD"
        );
    }
}
