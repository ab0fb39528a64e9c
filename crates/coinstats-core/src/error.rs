use thiserror::Error;

/// Validation errors for user-supplied identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "unknown exchange '{value}', expected one of Luno, Bitstamp, Kraken, Bitfinex, Bitsquare, BTCChina, OKCoin, Poloniex"
    )]
    UnknownExchange { value: String },
}
