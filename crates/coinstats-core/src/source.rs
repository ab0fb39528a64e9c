//! Exchange adapter contract and the fetch error taxonomy.
//!
//! An adapter turns one exchange's vendor JSON into canonical
//! [`ObservationRecord`]s. `poll` never fails: fetch, decode and field errors
//! are logged at the adapter boundary and cost only the affected request or row.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use coinstats_warehouse::ObservationRecord;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::error;

use crate::config::AppConfig;
use crate::currency::{parse_quantity, InvalidQuantity, VendorValue};
use crate::http_client::{HttpClient, HttpRequest};
use crate::Exchange;

/// One exchange's fetch-and-normalize step.
pub trait ExchangeAdapter: Send + Sync {
    fn exchange(&self) -> Exchange;

    /// Fetch and normalize the current quotes. Returns an empty list when the
    /// exchange is unconfigured, disabled, or unreachable.
    fn poll<'a>(
        &'a self,
        config: &'a AppConfig,
    ) -> Pin<Box<dyn Future<Output = Vec<ObservationRecord>> + Send + 'a>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection, DNS or timeout failure.
    Transport,
    /// Non-2xx HTTP status.
    UpstreamStatus,
    /// The vendor answered but reported an error in its payload.
    Upstream,
    /// Body was not the expected JSON shape.
    Decode,
    /// A field held a value that cannot be a price or volume.
    InvalidField,
}

/// Structured fetch failure for a single request or row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    exchange: Exchange,
    message: String,
}

impl FetchError {
    pub fn transport(exchange: Exchange, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Transport,
            exchange,
            message: message.into(),
        }
    }

    pub fn upstream_status(exchange: Exchange, status: u16) -> Self {
        Self {
            kind: FetchErrorKind::UpstreamStatus,
            exchange,
            message: format!("upstream returned status {status}"),
        }
    }

    pub fn upstream(exchange: Exchange, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Upstream,
            exchange,
            message: message.into(),
        }
    }

    pub fn decode(exchange: Exchange, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Decode,
            exchange,
            message: message.into(),
        }
    }

    pub fn invalid_field(exchange: Exchange, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::InvalidField,
            exchange,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub const fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::Transport => "fetch.transport",
            FetchErrorKind::UpstreamStatus => "fetch.upstream_status",
            FetchErrorKind::Upstream => "fetch.upstream",
            FetchErrorKind::Decode => "fetch.decode",
            FetchErrorKind::InvalidField => "fetch.invalid_field",
        }
    }

    /// Log at the adapter boundary.
    pub fn log(&self) {
        error!(
            exchange = %self.exchange,
            code = self.code(),
            "{}",
            self.message
        );
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.exchange, self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

/// GET `url` and decode the body as `T`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    client: &dyn HttpClient,
    exchange: Exchange,
    url: &str,
    timeout_ms: Option<u64>,
) -> Result<T, FetchError> {
    let request = HttpRequest::get(url)
        .with_header("accept", "application/json")
        .with_timeout_ms(timeout_ms);

    let response = client
        .execute(request)
        .await
        .map_err(|error| FetchError::transport(exchange, error.message()))?;

    if !response.is_success() {
        return Err(FetchError::upstream_status(exchange, response.status));
    }

    serde_json::from_str(&response.body)
        .map_err(|error| FetchError::decode(exchange, format!("{url}: {error}")))
}

/// Vendor price fields for one market, prior to validation.
pub(crate) struct RawQuote<'v> {
    pub ask: Option<&'v VendorValue>,
    pub bid: Option<&'v VendorValue>,
    pub volume: Option<&'v VendorValue>,
}

/// Validate quantities and assemble the canonical row.
pub(crate) fn build_observation(
    exchange: Exchange,
    currency_code: String,
    timestamp: i64,
    raw: RawQuote<'_>,
) -> Result<ObservationRecord, FetchError> {
    let field = |name, value| {
        parse_quantity(name, value).map_err(|InvalidQuantity { field, raw }| {
            FetchError::invalid_field(
                exchange,
                format!("{currency_code}: field '{field}' is not a non-negative number: '{raw}'"),
            )
        })
    };
    let ask = field("ask", raw.ask)?;
    let bid = field("bid", raw.bid)?;
    let volume = field("volume", raw.volume)?;

    Ok(ObservationRecord::new(exchange.as_str(), currency_code)
        .with_timestamp(Some(timestamp))
        .with_quote(ask, bid, volume))
}

pub(crate) fn poll_time() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
