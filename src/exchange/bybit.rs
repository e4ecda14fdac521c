// src/exchange/bybit.rs
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

pub const BYBIT_BASE_URL: &str = "https://api.bybit.com";

const BOOK_DEPTH: &str = "50";
const BOOK_ROW_FIELDS: usize = 2;

/// Bybit v5 wraps every response in `{"retCode": 0, "retMsg": "OK", ...}`.
pub struct BybitDialect;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitEnvelope {
    #[serde(default)]
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
}

impl Dialect for BybitDialect {
    type Envelope = BybitEnvelope;

    fn fault(_status: StatusCode, envelope: BybitEnvelope) -> Option<ApiFault> {
        if envelope.ret_code == 0 && envelope.ret_msg == "OK" {
            return None;
        }
        Some(ApiFault {
            code: envelope.ret_code.to_string(),
            message: envelope.ret_msg,
        })
    }
}

#[derive(Debug, Deserialize)]
struct InstrumentsResponse {
    #[serde(default)]
    result: InstrumentsResult,
}

#[derive(Debug, Default, Deserialize)]
struct InstrumentsResult {
    #[serde(default)]
    list: Vec<Instrument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instrument {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    base_coin: String,
    #[serde(default)]
    quote_coin: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct TickersResponse {
    #[serde(default)]
    result: TickersResult,
}

#[derive(Debug, Default, Deserialize)]
struct TickersResult {
    #[serde(default)]
    list: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    #[serde(default)]
    symbol: String,
    #[serde(rename = "ask1Price", default, deserialize_with = "lenient_decimal")]
    ask: Option<Decimal>,
    #[serde(rename = "bid1Price", default, deserialize_with = "lenient_decimal")]
    bid: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct OrderBookResponse {
    #[serde(default)]
    result: BookResult,
}

#[derive(Debug, Default, Deserialize)]
struct BookResult {
    #[serde(rename = "a", default)]
    asks: Vec<Vec<Decimal>>,
    #[serde(rename = "b", default)]
    bids: Vec<Vec<Decimal>>,
}

/// Bybit spot market data adapter
pub struct BybitApi {
    transport: Transport<BybitDialect>,
    cache: TtlCache<Arc<Vec<Pair>>>,
    pairs_ttl: Duration,
}

impl BybitApi {
    pub const ID: &'static str = "bybit";

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

        let response: InstrumentsResponse = self
            .transport
            .public_get(ctx, "/v5/market/instruments-info", &[("category", "spot")])
            .await?;

        let pairs: Vec<Pair> = response
            .result
            .list
            .into_iter()
            .filter(|row| row.status == "Trading")
            .filter(|row| has_symbol_fields(&row.symbol, &row.base_coin, &row.quote_coin))
            .map(|row| Pair::listed(&row.symbol, &row.base_coin, &row.quote_coin))
            .collect();

        log::debug!("bybit: {} trading spot instruments", pairs.len());

        let pairs = Arc::new(pairs);
        self.cache.set(PAIRS_CACHE_KEY, self.pairs_ttl, pairs.clone());
        Ok(pairs)
    }

    async fn get_tickers(&self, ctx: &Context) -> ExchangeResult<HashMap<String, Quote>> {
        let response: TickersResponse = self
            .transport
            .public_get(ctx, "/v5/market/tickers", &[("category", "spot")])
            .await?;

        Ok(response
            .result
            .list
            .into_iter()
            .filter_map(|row| ticker_entry(row.symbol, row.ask, row.bid))
            .collect())
    }
}

impl Default for BybitApi {
    fn default() -> Self {
        Self::new(&ExchangeSettings::new(BYBIT_BASE_URL))
    }
}

#[async_trait]
impl Exchange for BybitApi {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn list_pairs(&self, ctx: &Context) -> ExchangeResult<Vec<Pair>> {
        let pairs = self.get_pairs(ctx).await?;
        let tickers = self.get_tickers(ctx).await?;

        Ok(merge_pairs(&pairs, &tickers))
    }

    async fn get_order_book(&self, ctx: &Context, pair_id: &str) -> ExchangeResult<OrderBook> {
        let response: OrderBookResponse = self
            .transport
            .public_get(
                ctx,
                "/v5/market/orderbook",
                &[("category", "spot"), ("symbol", pair_id), ("limit", BOOK_DEPTH)],
            )
            .await?;

        Ok(OrderBook {
            ask: collect_levels(&response.result.asks, BOOK_ROW_FIELDS, "bybit ask")?,
            bid: collect_levels(&response.result.bids, BOOK_ROW_FIELDS, "bybit bid")?,
        })
    }
}
