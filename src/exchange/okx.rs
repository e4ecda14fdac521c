// src/exchange/okx.rs
use crate::domain::errors::{ExchangeError, ExchangeResult};
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

pub const OKX_BASE_URL: &str = "https://www.okx.com";

const BOOK_DEPTH: &str = "100";
// [price, size, deprecated, order count]
const BOOK_ROW_FIELDS: usize = 4;

/// OKX reports errors as `{"code": "...", "msg": "..."}`; success has an empty `msg`.
pub struct OkxDialect;

#[derive(Debug, Deserialize)]
pub struct OkxEnvelope {
    #[serde(default)]
    code: String,
    #[serde(default)]
    msg: String,
}

impl Dialect for OkxDialect {
    type Envelope = OkxEnvelope;

    fn fault(_status: StatusCode, envelope: OkxEnvelope) -> Option<ApiFault> {
        if envelope.msg.is_empty() {
            return None;
        }
        Some(ApiFault {
            code: envelope.code,
            message: envelope.msg,
        })
    }
}

#[derive(Debug, Deserialize)]
struct InstrumentsResponse {
    #[serde(default)]
    data: Vec<Instrument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instrument {
    #[serde(default)]
    inst_id: String,
    #[serde(default)]
    base_ccy: String,
    #[serde(default)]
    quote_ccy: String,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Deserialize)]
struct TickersResponse {
    #[serde(default)]
    data: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    #[serde(default)]
    inst_id: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    ask_px: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    bid_px: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct BooksResponse {
    #[serde(default)]
    data: Vec<Book>,
}

#[derive(Debug, Deserialize)]
struct Book {
    #[serde(default)]
    asks: Vec<Vec<Decimal>>,
    #[serde(default)]
    bids: Vec<Vec<Decimal>>,
}

/// OKX spot market data adapter
pub struct OkxApi {
    transport: Transport<OkxDialect>,
    cache: TtlCache<Arc<Vec<Pair>>>,
    pairs_ttl: Duration,
}

impl OkxApi {
    pub const ID: &'static str = "okx";

    pub fn new(settings: &ExchangeSettings) -> Self {
        Self {
            transport: Transport::new(&settings.base_url, settings.pacing_interval, settings.debug),
            cache: TtlCache::new(),
            pairs_ttl: settings.pairs_ttl,
        }
    }

    /// Live spot instruments, served from cache while fresh.
    async fn get_pairs(&self, ctx: &Context) -> ExchangeResult<Arc<Vec<Pair>>> {
        if let Some(pairs) = self.cache.get(PAIRS_CACHE_KEY) {
            return Ok(pairs);
        }

        let response: InstrumentsResponse = self
            .transport
            .public_get(ctx, "/api/v5/public/instruments", &[("instType", "SPOT")])
            .await?;

        let pairs: Vec<Pair> = response
            .data
            .into_iter()
            .filter(|row| row.state == "live")
            .filter(|row| has_symbol_fields(&row.inst_id, &row.base_ccy, &row.quote_ccy))
            .map(|row| Pair::listed(&row.inst_id, &row.base_ccy, &row.quote_ccy))
            .collect();

        log::debug!("okx: {} live spot instruments", pairs.len());

        let pairs = Arc::new(pairs);
        self.cache.set(PAIRS_CACHE_KEY, self.pairs_ttl, pairs.clone());
        Ok(pairs)
    }

    async fn get_tickers(&self, ctx: &Context) -> ExchangeResult<HashMap<String, Quote>> {
        let response: TickersResponse = self
            .transport
            .public_get(ctx, "/api/v5/market/tickers", &[("instType", "SPOT")])
            .await?;

        Ok(response
            .data
            .into_iter()
            .filter_map(|row| ticker_entry(row.inst_id, row.ask_px, row.bid_px))
            .collect())
    }
}

impl Default for OkxApi {
    fn default() -> Self {
        Self::new(&ExchangeSettings::new(OKX_BASE_URL))
    }
}

#[async_trait]
impl Exchange for OkxApi {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn list_pairs(&self, ctx: &Context) -> ExchangeResult<Vec<Pair>> {
        let pairs = self.get_pairs(ctx).await?;
        let tickers = self.get_tickers(ctx).await?;

        Ok(merge_pairs(&pairs, &tickers))
    }

    async fn get_order_book(&self, ctx: &Context, pair_id: &str) -> ExchangeResult<OrderBook> {
        let response: BooksResponse = self
            .transport
            .public_get(ctx, "/api/v5/market/books", &[("instId", pair_id), ("sz", BOOK_DEPTH)])
            .await?;

        // The snapshot comes wrapped in a single-element list.
        let [book]: [Book; 1] = response.data.try_into().map_err(|data: Vec<Book>| {
            ExchangeError::Decode(format!(
                "okx order book for {}: expected 1 data entry, got {}",
                pair_id,
                data.len()
            ))
        })?;

        Ok(OrderBook {
            ask: collect_levels(&book.asks, BOOK_ROW_FIELDS, "okx ask")?,
            bid: collect_levels(&book.bids, BOOK_ROW_FIELDS, "okx bid")?,
        })
    }
}
