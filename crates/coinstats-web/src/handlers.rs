use axum::extract::{Host, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use coinstats_warehouse::{LatestObservation, ObservationStore, StoreError};
use tracing::info;

use crate::error::ApiError;
use crate::router::AppState;

/// `GET /`: one link per exchange with stored observations.
pub async fn list_exchanges(
    State(state): State<AppState>,
    host: Option<Host>,
    headers: HeaderMap,
) -> Result<Json<Vec<String>>, ApiError> {
    info!("listing exchanges");
    let base = base_url(host, &headers);
    let exchanges = query(state.store, |store| store.exchanges()).await?;

    Ok(Json(
        exchanges
            .into_iter()
            .map(|exchange| link(&base, &[&exchange]))
            .collect(),
    ))
}

/// `GET /{exchange}`: one link per currency code seen on that exchange.
pub async fn list_currency_codes(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
    host: Option<Host>,
    headers: HeaderMap,
) -> Result<Json<Vec<String>>, ApiError> {
    info!(%exchange, "listing currency codes");
    let base = base_url(host, &headers);
    let lookup = exchange.clone();
    let codes = query(state.store, move |store| store.currency_codes(&lookup)).await?;

    Ok(Json(
        codes
            .into_iter()
            .map(|code| link(&base, &[&exchange, &code]))
            .collect(),
    ))
}

/// `GET /{exchange}/{currencyCode}`: the latest observation.
pub async fn latest_observation(
    State(state): State<AppState>,
    Path((exchange, currency_code)): Path<(String, String)>,
) -> Result<Json<LatestObservation>, ApiError> {
    info!(%exchange, %currency_code, "fetching latest observation");
    let latest = query(state.store, move |store| store.latest(&exchange, &currency_code)).await?;
    Ok(Json(latest))
}

/// Run a store lookup off the async workers.
async fn query<T, F>(store: ObservationStore, lookup: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ObservationStore) -> Result<T, StoreError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || lookup(&store)).await?;
    Ok(result?)
}

/// `{scheme}://{host}` as the client addressed us. The host comes from the
/// forwarding headers, `Host`, or the request authority, in that order.
fn base_url(host: Option<Host>, headers: &HeaderMap) -> String {
    let host = host
        .map(|Host(host)| host)
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| String::from("localhost"));
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("http");
    format!("{scheme}://{host}")
}

/// `base` followed by each segment, percent-encoded.
fn link(base: &str, segments: &[&str]) -> String {
    segments.iter().fold(String::from(base), |mut url, segment| {
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
        url
    })
}
