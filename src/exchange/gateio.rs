// src/exchange/gateio.rs
use crate::domain::errors::ExchangeResult;
use crate::domain::models::{OrderBook, Pair, Quote};
use crate::exchange::client::{Context, Exchange, ExchangeSettings};
use crate::exchange::transport::{ApiFault, Dialect, Transport};
use crate::exchange::{collect_levels, has_symbol_fields, lenient_decimal, merge_pairs, ticker_entry, PAIRS_CACHE_KEY};
use crate::infrastructure::cache::TtlCache;
use async_trait::async_trait;
use hyper::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const GATEIO_BASE_URL: &str = "https://api.gateio.ws/api/v4";

const BOOK_DEPTH: &str = "100";
const BOOK_ROW_FIELDS: usize = 2;

/// Gate.io v4 answers errors with a non-200 status and `{"label": ..., "message": ...}`.
pub struct GateioDialect;

#[derive(Debug, Deserialize)]
pub struct GateioEnvelope {
    #[serde(default)]
    label: String,
    #[serde(default)]
    message: String,
}

impl Dialect for GateioDialect {
    type Envelope = GateioEnvelope;

    fn fault(status: StatusCode, envelope: GateioEnvelope) -> Option<ApiFault> {
        if status == StatusCode::OK || envelope.label.is_empty() {
            return None;
        }
        Some(ApiFault {
            code: envelope.label,
            message: envelope.message,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CurrencyPair {
    #[serde(default)]
    id: String,
    #[serde(default)]
    base: String,
    #[serde(default)]
    quote: String,
    #[serde(default)]
    trade_status: String,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    #[serde(rename = "currency_pair", default)]
    id: String,
    #[serde(rename = "lowest_ask", default, deserialize_with = "lenient_decimal")]
    ask: Option<Decimal>,
    #[serde(rename = "highest_bid", default, deserialize_with = "lenient_decimal")]
    bid: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct Book {
    #[serde(default)]
    asks: Vec<Vec<Decimal>>,
    #[serde(default)]
    bids: Vec<Vec<Decimal>>,
}

/// Gate.io spot market data adapter
pub struct GateioApi {
    transport: Transport<GateioDialect>,
    cache: TtlCache<Arc<Vec<Pair>>>,
    pairs_ttl: Duration,
}

impl GateioApi {
    pub const ID: &'static str = "gateio";

    pub fn new(settings: &ExchangeSettings) -> Self {
        Self {
            transport: Transport::new(&settings.base_url, settings.pacing_interval, settings.debug),
            cache: TtlCache::new(),
            pairs_ttl: settings.pairs_ttl,
        }
    }

    async fn get_pairs(&self, ctx: &Context) -> ExchangeResult<Arc<Vec<Pair>>> {
        if let Some(pairs) = self.cache.get(PAIRS_CACHE_KEY) {
            return Ok(pairs);
        }

        let rows: Vec<CurrencyPair> = self.transport.public_get(ctx, "/spot/currency_pairs", &[]).await?;

        let pairs: Vec<Pair> = rows
            .into_iter()
            .filter(|row| row.trade_status == "tradable")
            .filter(|row| has_symbol_fields(&row.id, &row.base, &row.quote))
            .map(|row| Pair::listed(&row.id, &row.base, &row.quote))
            .collect();

        log::debug!("gateio: {} tradable currency pairs", pairs.len());

        let pairs = Arc::new(pairs);
        self.cache.set(PAIRS_CACHE_KEY, self.pairs_ttl, pairs.clone());
        Ok(pairs)
    }

    async fn get_tickers(&self, ctx: &Context) -> ExchangeResult<HashMap<String, Quote>> {
        let rows: Vec<Ticker> = self.transport.public_get(ctx, "/spot/tickers", &[]).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| ticker_entry(row.id, row.ask, row.bid))
            .collect())
    }
}

impl Default for GateioApi {
    fn default() -> Self {
        Self::new(&ExchangeSettings::new(GATEIO_BASE_URL))
    }
}

#[async_trait]
impl Exchange for GateioApi {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn list_pairs(&self, ctx: &Context) -> ExchangeResult<Vec<Pair>> {
        let pairs = self.get_pairs(ctx).await?;
        let tickers = self.get_tickers(ctx).await?;

        Ok(merge_pairs(&pairs, &tickers))
    }

    async fn get_order_book(&self, ctx: &Context, pair_id: &str) -> ExchangeResult<OrderBook> {
        let book: Book = self
            .transport
            .public_get(ctx, "/spot/order_book", &[("currency_pair", pair_id), ("limit", BOOK_DEPTH)])
            .await?;

        Ok(OrderBook {
            ask: collect_levels(&book.asks, BOOK_ROW_FIELDS, "gateio ask")?,
            bid: collect_levels(&book.bids, BOOK_ROW_FIELDS, "gateio bid")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::transport::detect_fault;

    #[test]
    fn label_on_error_status_is_a_fault() {
        let body = br#"{"label":"INVALID_CURRENCY_PAIR","message":"Invalid currency pair BTC_XXX"}"#;
        assert_eq!(
            detect_fault::<GateioDialect>(StatusCode::BAD_REQUEST, body),
            Some(ApiFault {
                code: "INVALID_CURRENCY_PAIR".to_string(),
                message: "Invalid currency pair BTC_XXX".to_string()
            })
        );
    }

    #[test]
    fn label_on_ok_status_is_ignored() {
        let body = br#"{"label":"X","message":"y"}"#;
        assert!(detect_fault::<GateioDialect>(StatusCode::OK, body).is_none());
    }

    #[test]
    fn unparsable_ticker_prices_are_absent() {
        let json = r#"[{"currency_pair":"BTC_USDT","lowest_ask":"n/a","highest_bid":"29999.9"}]"#;
        let rows: Vec<Ticker> = serde_json::from_str(json).unwrap();
        assert!(ticker_entry(rows[0].id.clone(), rows[0].ask, rows[0].bid).is_none());
    }
}
