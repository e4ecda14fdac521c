// src/exchange/client.rs
use crate::domain::errors::ExchangeResult;
use crate::domain::models::{OrderBook, Pair};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Uniform market-data interface every exchange adapter implements.
///
/// The dispatcher only ever sees `dyn Exchange`; nothing outside an adapter
/// depends on its wire format.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Stable identifier used in routes, e.g. "okx"
    fn id(&self) -> &str;

    /// Tradable spot pairs with a current positive ask and bid
    async fn list_pairs(&self, ctx: &Context) -> ExchangeResult<Vec<Pair>>;

    /// Order book snapshot for one exchange-native pair id
    async fn get_order_book(&self, ctx: &Context, pair_id: &str) -> ExchangeResult<OrderBook>;
}

/// Request-scoped deadline carried into every upstream call.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    deadline: Instant,
}

impl Context {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Per-adapter connection settings.
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    /// Base URL the REST endpoints are appended to
    pub base_url: String,

    /// Minimum spacing between two outbound requests of the same adapter
    pub pacing_interval: Duration,

    /// How long the instrument list stays cached
    pub pairs_ttl: Duration,

    /// Log method, URL, status and body of every upstream response
    pub debug: bool,
}

impl ExchangeSettings {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            pacing_interval: Duration::from_millis(100),
            pairs_ttl: Duration::from_secs(5 * 60),
            debug: false,
        }
    }
}
