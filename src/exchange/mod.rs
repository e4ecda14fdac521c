// src/exchange/mod.rs
// Exchange adapters behind the uniform `Exchange` interface

pub mod bybit;
pub mod client;
pub mod gateio;
pub mod okx;
pub mod transport;

pub use bybit::BybitApi;
pub use client::{Context, Exchange, ExchangeSettings};
pub use gateio::GateioApi;
pub use okx::OkxApi;

use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::models::{Level, Pair, Quote};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// Cache key of the instrument list inside each adapter's cache
pub const PAIRS_CACHE_KEY: &str = "getPairs";

/// Inner join of listed instruments with the ticker snapshot. Instruments
/// without a live quote are dropped rather than reported with zero prices.
pub fn merge_pairs(instruments: &[Pair], tickers: &HashMap<String, Quote>) -> Vec<Pair> {
    instruments
        .iter()
        .filter_map(|pair| tickers.get(&pair.id).map(|quote| pair.with_quote(*quote)))
        .collect()
}

/// Instrument fields every adapter requires before listing a pair.
pub(crate) fn has_symbol_fields(id: &str, base: &str, quote: &str) -> bool {
    !id.is_empty() && !base.is_empty() && !quote.is_empty()
}

/// Ticker entry → quote, dropping empty symbols and non-positive prices.
pub(crate) fn ticker_entry(
    symbol: String,
    ask: Option<Decimal>,
    bid: Option<Decimal>,
) -> Option<(String, Quote)> {
    if symbol.is_empty() {
        return None;
    }
    let quote = Quote::new(ask?, bid?)?;
    Some((symbol, quote))
}

/// Converts raw book rows, failing the whole side if any row has the wrong
/// number of fields.
pub(crate) fn collect_levels(rows: &[Vec<Decimal>], fields: usize, side: &str) -> ExchangeResult<Vec<Level>> {
    rows.iter()
        .map(|row| {
            Level::from_row(row, fields).ok_or_else(|| {
                ExchangeError::Decode(format!(
                    "{} row has {} fields, expected {}: {:?}",
                    side,
                    row.len(),
                    fields,
                    row
                ))
            })
        })
        .collect()
}

/// Ticker prices arrive as strings, numbers, empty strings or null.
/// Anything that is not a decimal becomes `None`.
pub(crate) fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    let parse = |s: &str| {
        let s = s.trim();
        Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok()
    };

    Ok(match value {
        Some(Value::String(s)) => parse(&s),
        Some(Value::Number(n)) => parse(&n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Deserialize)]
    struct Price {
        #[serde(default, deserialize_with = "lenient_decimal")]
        px: Option<Decimal>,
    }

    fn px(json: &str) -> Option<Decimal> {
        serde_json::from_str::<Price>(json).unwrap().px
    }

    #[test]
    fn merge_is_an_inner_join() {
        let listed = vec![Pair::listed("BTC-USD", "BTC", "USD")];

        assert!(merge_pairs(&listed, &HashMap::new()).is_empty());

        let mut tickers = HashMap::new();
        tickers.insert("BTC-USD".to_string(), Quote::new(dec!(2), dec!(1)).unwrap());
        tickers.insert("ETH-USD".to_string(), Quote::new(dec!(4), dec!(3)).unwrap());

        let merged = merge_pairs(&listed, &tickers);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].ask, dec!(2));
        assert_eq!(merged[0].bid, dec!(1));
    }

    #[test]
    fn ticker_entry_drops_bad_rows() {
        assert!(ticker_entry(String::new(), Some(dec!(1)), Some(dec!(1))).is_none());
        assert!(ticker_entry("X".into(), Some(dec!(0)), Some(dec!(1))).is_none());
        assert!(ticker_entry("X".into(), Some(dec!(1)), Some(dec!(-1))).is_none());
        assert!(ticker_entry("X".into(), None, Some(dec!(1))).is_none());
        assert!(ticker_entry("X".into(), Some(dec!(1.1)), Some(dec!(1))).is_some());
    }

    #[test]
    fn collect_levels_fails_closed() {
        let rows = vec![vec![dec!(1), dec!(2)], vec![dec!(1), dec!(2), dec!(3)]];
        assert!(matches!(collect_levels(&rows, 2, "asks"), Err(ExchangeError::Decode(_))));

        let rows = vec![vec![dec!(1), dec!(2), dec!(0), dec!(4)]];
        assert_eq!(collect_levels(&rows, 4, "bids").unwrap(), vec![Level(dec!(1), dec!(2))]);
    }

    #[test]
    fn lenient_decimal_accepts_strings_and_numbers() {
        assert_eq!(px(r#"{"px":"0.00012"}"#), Some(dec!(0.00012)));
        assert_eq!(px(r#"{"px":42.5}"#), Some(dec!(42.5)));
        assert_eq!(px(r#"{"px":""}"#), None);
        assert_eq!(px(r#"{"px":null}"#), None);
        assert_eq!(px(r#"{}"#), None);
    }
}
