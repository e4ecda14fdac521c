// src/domain/models.rs
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A spot instrument that is currently tradable on one exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    /// Exchange-native symbol, e.g. "BTC-USDT" or "BTC_USDT"
    pub id: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub ask: Decimal,
    pub bid: Decimal,
}

impl Pair {
    /// Instrument as listed by the exchange, before any ticker is known.
    pub fn listed(id: &str, base_asset: &str, quote_asset: &str) -> Self {
        Self {
            id: id.to_string(),
            base_asset: base_asset.to_string(),
            quote_asset: quote_asset.to_string(),
            ask: Decimal::ZERO,
            bid: Decimal::ZERO,
        }
    }

    pub fn with_quote(&self, quote: Quote) -> Self {
        Self {
            ask: quote.ask,
            bid: quote.bid,
            ..self.clone()
        }
    }
}

/// Top of book from a ticker snapshot. Both sides are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub ask: Decimal,
    pub bid: Decimal,
}

impl Quote {
    pub fn new(ask: Decimal, bid: Decimal) -> Option<Self> {
        if ask <= Decimal::ZERO || bid <= Decimal::ZERO {
            return None;
        }
        Some(Self { ask, bid })
    }
}

/// One price level, serialized as `[price, size]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level(pub Decimal, pub Decimal);

impl Level {
    pub fn price(&self) -> Decimal {
        self.0
    }

    pub fn size(&self) -> Decimal {
        self.1
    }

    /// Accepts an upstream row only if it has exactly `expected` fields,
    /// keeping price and size.
    pub fn from_row(row: &[Decimal], expected: usize) -> Option<Self> {
        if expected < 2 || row.len() != expected {
            return None;
        }
        Some(Level(row[0], row[1]))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub ask: Vec<Level>,
    pub bid: Vec<Level>,
}

impl OrderBook {
    /// Asks ascending, bids descending by price.
    pub fn sort_levels(&mut self) {
        self.ask.sort_by(|a, b| a.price().cmp(&b.price()));
        self.bid.sort_by(|a, b| b.price().cmp(&a.price()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn quote_rejects_non_positive_prices() {
        assert!(Quote::new(dec!(0), dec!(1)).is_none());
        assert!(Quote::new(dec!(1), dec!(-1)).is_none());
        assert_eq!(
            Quote::new(dec!(101.5), dec!(101.4)),
            Some(Quote { ask: dec!(101.5), bid: dec!(101.4) })
        );
    }

    #[test]
    fn level_requires_exact_field_count() {
        assert_eq!(
            Level::from_row(&[dec!(100), dec!(2), dec!(0), dec!(7)], 4),
            Some(Level(dec!(100), dec!(2)))
        );
        assert!(Level::from_row(&[dec!(100)], 2).is_none());
        assert!(Level::from_row(&[dec!(100), dec!(2), dec!(0)], 2).is_none());
    }

    #[test]
    fn order_book_sorts_each_side() {
        let mut book = OrderBook {
            ask: vec![Level(dec!(102), dec!(1)), Level(dec!(101), dec!(3))],
            bid: vec![Level(dec!(99), dec!(1)), Level(dec!(100), dec!(5))],
        };

        book.sort_levels();

        assert_eq!(book.ask[0].price(), dec!(101));
        assert_eq!(book.bid[0].price(), dec!(100));
    }

    #[test]
    fn pair_serializes_with_snake_case_fields() {
        let pair = Pair::listed("BTCUSDT", "BTC", "USDT").with_quote(Quote {
            ask: dec!(30001.5),
            bid: dec!(30001),
        });

        let json = serde_json::to_value(&pair).unwrap();

        assert_eq!(json["base_asset"], "BTC");
        assert_eq!(json["quote_asset"], "USDT");
        assert_eq!(json["ask"], "30001.5");
    }

    #[test]
    fn level_serializes_as_two_element_array() {
        let json = serde_json::to_string(&Level(dec!(1.5), dec!(2))).unwrap();
        assert_eq!(json, r#"["1.5","2"]"#);
    }
}
