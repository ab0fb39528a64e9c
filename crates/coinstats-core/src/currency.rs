//! Currency label normalization and vendor value parsing.
//!
//! Exchanges label the same market in different ways (`btcusd`, `dash_btc`,
//! `XXBTZEUR`). Everything here maps those labels onto a bare quote currency
//! and turns vendor-supplied strings or numbers into plain `f64`/`i64`.

use serde::Deserialize;

/// Base-asset ticker stripped from most vendor labels.
pub const DEFAULT_BASE_TICKER: &str = "BTC";

/// Base-asset ticker Kraken uses in its pair names.
pub const KRAKEN_BASE_TICKER: &str = "XBT";

/// Strip `base` (case-insensitive) and `_` separators, then upper-case.
pub fn normalize_currency_code(raw: &str, base: &str) -> String {
    let upper = raw.trim().to_ascii_uppercase();
    let stripped = if base.is_empty() {
        upper
    } else {
        upper.replace(&base.to_ascii_uppercase(), "")
    };
    stripped.replace('_', "")
}

/// Kraken pair keys look like `XXBTZEUR`: an `X`/`Z` class marker in front of
/// each four-letter asset. Drop the markers, then apply the generic strip.
pub fn kraken_currency_code(pair: &str) -> String {
    let pair = pair.trim();
    let bytes = pair.as_bytes();
    let is_marker = |byte: u8| byte == b'X' || byte == b'Z';

    let unmarked = if bytes.len() == 8 && is_marker(bytes[0]) && is_marker(bytes[4]) {
        format!("{}{}", &pair[1..4], &pair[5..])
    } else {
        pair.to_owned()
    };
    normalize_currency_code(&unmarked, KRAKEN_BASE_TICKER)
}

/// Split a comma separated ticker list, skipping blanks and one-character
/// leftovers from trailing separators.
pub fn parse_tickers(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|ticker| ticker.len() >= 2)
        .collect()
}

/// A vendor field that may arrive as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VendorValue {
    Number(f64),
    Text(String),
}

impl VendorValue {
    fn as_f64(&self) -> Option<Result<f64, ()>> {
        match self {
            Self::Number(value) => Some(Ok(*value)),
            Self::Text(text) if text.trim().is_empty() => None,
            Self::Text(text) => Some(text.trim().parse::<f64>().map_err(|_| ())),
        }
    }
}

/// Why a vendor quantity could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidQuantity {
    pub field: &'static str,
    pub raw: String,
}

/// Parse a price or volume. Absent or blank is `None`; anything that is not a
/// finite, non-negative number is rejected.
pub fn parse_quantity(
    field: &'static str,
    raw: Option<&VendorValue>,
) -> Result<Option<f64>, InvalidQuantity> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let invalid = || InvalidQuantity {
        field,
        raw: match raw {
            VendorValue::Number(value) => value.to_string(),
            VendorValue::Text(text) => text.clone(),
        },
    };

    match raw.as_f64() {
        None => Ok(None),
        Some(Ok(value)) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        Some(_) => Err(invalid()),
    }
}

/// Epoch seconds from a vendor timestamp. Fractional seconds are truncated;
/// malformed or non-positive values yield `None` so the poll time is used.
pub fn parse_epoch_seconds(raw: Option<&VendorValue>) -> Option<i64> {
    match raw?.as_f64()? {
        Ok(value) if value.is_finite() && value > 0.0 => Some(value.trunc() as i64),
        _ => None,
    }
}

/// Epoch seconds from a vendor timestamp expressed in milliseconds.
pub fn parse_epoch_millis(raw: Option<&VendorValue>) -> Option<i64> {
    match raw?.as_f64()? {
        Ok(value) if value.is_finite() && value > 0.0 => Some((value / 1000.0).trunc() as i64),
        _ => None,
    }
}
