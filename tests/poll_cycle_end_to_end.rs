//! End-to-end: one poll cycle against stubbed exchanges, then the query API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use coinstats_core::{
    AppConfig, ConfigHandle, ObservationStore, PollScheduler, StubHttpClient,
};
use coinstats_web::create_router;
use serde_json::Value;
use tower::ServiceExt;

const BITSTAMP_URL: &str = "https://bitstamp.test/api/ticker/";
const BITFINEX_URL: &str = "https://bitfinex.test/v1/pubticker/";

async fn get(store: &ObservationStore, uri: &str) -> (StatusCode, String) {
    let response = create_router(store.clone())
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::HOST, "coinstats.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn when_one_exchange_is_malformed_only_the_healthy_one_is_served() {
    // Given: Bitstamp answers normally and Bitfinex answers with garbage
    let http = StubHttpClient::new()
        .with_json(
            BITSTAMP_URL,
            r#"{"high": "2600", "last": "2550", "timestamp": "1500000000", "bid": "2549.5",
                "vwap": "2560", "volume": "8000", "low": "2500", "ask": "2550.5", "open": "2530"}"#,
        )
        .with_json(format!("{BITFINEX_URL}btcusd"), "<html>502 Bad Gateway</html>");
    let mut config = AppConfig::default();
    config.exchanges.bitstamp.url = BITSTAMP_URL.to_owned();
    config.exchanges.bitfinex.url = BITFINEX_URL.to_owned();
    config.exchanges.bitfinex.tickers = String::from("btcusd");

    let store = ObservationStore::open_in_memory().expect("store");
    let scheduler = PollScheduler::with_default_adapters(
        Arc::new(http),
        store.clone(),
        Arc::new(ConfigHandle::fixed(config)),
    );

    // When: Exactly one cycle runs
    let report = scheduler.run_cycle().await;

    // Then: Only Bitstamp's observation was stored
    assert_eq!(report.observations_written, 1);
    assert_eq!(store.count().expect("count"), 1);
    assert_eq!(store.exchanges().expect("exchanges"), vec!["Bitstamp"]);

    // And: The healthy pair is served
    let (status, body) = get(&store, "/Bitstamp/USD").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["exchange"], "Bitstamp");
    assert_eq!(json["currencyCode"], "USD");
    assert_eq!(json["average"], 2550.0);
    assert_eq!(json["timestamp"], "2017-07-14 02:40:00");

    // And: The broken exchange is a plain-text 400
    let (status, body) = get(&store, "/Bitfinex").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "exchange doesn't exist");

    // And: Discovery links point back at this host
    let (status, body) = get(&store, "/").await;
    assert_eq!(status, StatusCode::OK);
    let links: Vec<String> = serde_json::from_str(&body).unwrap();
    assert_eq!(links, vec!["http://coinstats.test/Bitstamp"]);

    let (_, body) = get(&store, "/Bitstamp").await;
    let links: Vec<String> = serde_json::from_str(&body).unwrap();
    assert_eq!(links, vec!["http://coinstats.test/Bitstamp/USD"]);
}
