//! Row types exchanged with the observation store.

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

/// One normalized quote as produced by an exchange adapter.
///
/// `None` means the vendor did not supply the field; the store fills in the
/// poll time for `timestamp` and `0` for the quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub exchange: String,
    pub currency_code: String,
    /// Epoch seconds.
    pub timestamp: Option<i64>,
    pub ask: Option<f64>,
    pub bid: Option<f64>,
    pub volume: Option<f64>,
}

impl ObservationRecord {
    pub fn new(exchange: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            currency_code: currency_code.into(),
            timestamp: None,
            ask: None,
            bid: None,
            volume: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<i64>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_quote(mut self, ask: Option<f64>, bid: Option<f64>, volume: Option<f64>) -> Self {
        self.ask = ask;
        self.bid = bid;
        self.volume = volume;
        self
    }
}

/// A persisted row with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObservation {
    pub id: i64,
    pub exchange: String,
    pub currency_code: String,
    pub timestamp: i64,
    pub ask: f64,
    pub bid: f64,
    pub volume: f64,
}

impl StoredObservation {
    /// Mid price rounded to 8 decimal places.
    pub fn mid_price(&self) -> f64 {
        round_to_8((self.ask + self.bid) / 2.0)
    }
}

/// The most recent observation for one (exchange, currency) pair, as served
/// over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestObservation {
    pub exchange: String,
    pub ask: f64,
    pub bid: f64,
    pub average: f64,
    pub volume: f64,
    /// UTC, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    #[serde(rename = "currencyCode")]
    pub currency_code: String,
}

impl From<StoredObservation> for LatestObservation {
    fn from(row: StoredObservation) -> Self {
        let average = row.mid_price();
        Self {
            timestamp: render_timestamp(row.timestamp),
            exchange: row.exchange,
            ask: row.ask,
            bid: row.bid,
            average,
            volume: row.volume,
            currency_code: row.currency_code,
        }
    }
}

/// Column selector for distinct-value lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctColumn {
    Exchange,
    CurrencyCode,
}

pub(crate) fn round_to_8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}

pub(crate) fn render_timestamp(epoch_seconds: i64) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::from_unix_timestamp(epoch_seconds)
        .ok()
        .and_then(|moment| moment.format(format).ok())
        .unwrap_or_else(|| epoch_seconds.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_price_is_rounded_to_eight_places() {
        let row = StoredObservation {
            id: 1,
            exchange: String::from("Kraken"),
            currency_code: String::from("EUR"),
            timestamp: 0,
            ask: 0.123456789,
            bid: 0.123456780,
            volume: 0.0,
        };

        assert_eq!(row.mid_price(), 0.12345678);
    }

    #[test]
    fn latest_observation_serializes_with_wire_field_names() {
        let latest = LatestObservation::from(StoredObservation {
            id: 3,
            exchange: String::from("Bitstamp"),
            currency_code: String::from("USD"),
            timestamp: 1_500_000_000,
            ask: 101.0,
            bid: 99.0,
            volume: 12.5,
        });

        let json = serde_json::to_value(&latest).expect("serialize");
        assert_eq!(json["currencyCode"], "USD");
        assert_eq!(json["average"], 100.0);
        assert_eq!(json["timestamp"], "2017-07-14 02:40:00");
        assert!(json.get("id").is_none());
    }
}
