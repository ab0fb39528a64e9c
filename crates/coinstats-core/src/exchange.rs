use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Exchanges the poller knows how to read.
///
/// The declaration order is the order adapters run within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Exchange {
    Luno,
    Bitstamp,
    Kraken,
    Bitfinex,
    Bitsquare,
    #[serde(rename = "BTCChina")]
    BtcChina,
    #[serde(rename = "OKCoin")]
    OkCoin,
    Poloniex,
}

impl Exchange {
    pub const ALL: [Self; 8] = [
        Self::Luno,
        Self::Bitstamp,
        Self::Kraken,
        Self::Bitfinex,
        Self::Bitsquare,
        Self::BtcChina,
        Self::OkCoin,
        Self::Poloniex,
    ];

    /// Name written to the `exchange` column and used in URLs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Luno => "Luno",
            Self::Bitstamp => "Bitstamp",
            Self::Kraken => "Kraken",
            Self::Bitfinex => "Bitfinex",
            Self::Bitsquare => "Bitsquare",
            Self::BtcChina => "BTCChina",
            Self::OkCoin => "OKCoin",
            Self::Poloniex => "Poloniex",
        }
    }
}

impl Display for Exchange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|exchange| exchange.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ValidationError::UnknownExchange {
                value: value.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_display_names_case_insensitively() {
        assert_eq!("btcchina".parse::<Exchange>(), Ok(Exchange::BtcChina));
        assert_eq!("OKCoin".parse::<Exchange>(), Ok(Exchange::OkCoin));
        assert!("coinbase".parse::<Exchange>().is_err());
    }

    #[test]
    fn run_order_starts_with_luno_and_ends_with_poloniex() {
        assert_eq!(Exchange::ALL.first(), Some(&Exchange::Luno));
        assert_eq!(Exchange::ALL.last(), Some(&Exchange::Poloniex));
        assert!(Exchange::ALL.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
