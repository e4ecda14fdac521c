// src/exchange/transport.rs
// Rate-limited public REST transport shared by all exchange adapters

use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::exchange::client::Context;
use hyper::body::Bytes;
use hyper::client::HttpConnector;
use hyper::header::ACCEPT;
use hyper::{Body, Client, Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use url::Url;

/// Error reported by an exchange inside its own response envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFault {
    pub code: String,
    pub message: String,
}

/// How one exchange reports failures in its response bodies.
pub trait Dialect: Send + Sync + 'static {
    /// Shape of the error envelope, deserialized from any JSON object body
    type Envelope: DeserializeOwned;

    fn fault(status: StatusCode, envelope: Self::Envelope) -> Option<ApiFault>;
}

/// Looks for a dialect error envelope in a response body. Only JSON objects
/// are inspected; arrays and non-JSON bodies never carry an envelope.
pub fn detect_fault<D: Dialect>(status: StatusCode, body: &[u8]) -> Option<ApiFault> {
    let value: Value = serde_json::from_slice(body).ok()?;
    if !value.is_object() {
        return None;
    }
    let envelope: D::Envelope = serde_json::from_value(value).ok()?;
    D::fault(status, envelope)
}

/// Fixed-interval limiter: no request starts earlier than `interval` after
/// the previous one completed.
///
/// The caller whose request just finished is not delayed; the next caller
/// waits inside `acquire`.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_completed: Mutex<Option<Instant>>,
}

/// Held while a request is in flight. Dropping it stamps the completion time.
pub struct PacerPermit<'a> {
    last_completed: MutexGuard<'a, Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_completed: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn acquire(&self) -> PacerPermit<'_> {
        let last_completed = self.last_completed.lock().await;
        if let Some(at) = *last_completed {
            tokio::time::sleep_until(at + self.interval).await;
        }
        PacerPermit { last_completed }
    }
}

impl Drop for PacerPermit<'_> {
    fn drop(&mut self) {
        *self.last_completed = Some(Instant::now());
    }
}

/// Public (unauthenticated) GET client for one exchange.
pub struct Transport<D> {
    client: Client<HttpsConnector<HttpConnector>>,
    base_url: String,
    pacer: Pacer,
    debug: bool,
    _dialect: PhantomData<fn() -> D>,
}

impl<D: Dialect> Transport<D> {
    pub fn new(base_url: &str, pacing_interval: Duration, debug: bool) -> Self {
        let client = Client::builder().build::<_, Body>(HttpsConnector::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pacer: Pacer::new(pacing_interval),
            debug,
            _dialect: PhantomData,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `endpoint` with `query`, check the exchange envelope and decode the
    /// body into `T`. The whole call, pacing wait included, is bounded by the
    /// context deadline.
    pub async fn public_get<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> ExchangeResult<T> {
        let url = self.build_url(endpoint, query)?;

        let (status, body) = match tokio::time::timeout_at(ctx.deadline(), self.send(&url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ExchangeError::DeadlineExceeded {
                    method: Method::GET.to_string(),
                    url: url.to_string(),
                })
            }
        };

        self.decode(&url, status, &body)
    }

    fn build_url(&self, endpoint: &str, query: &[(&str, &str)]) -> ExchangeResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(|e| ExchangeError::Transport(format!("Invalid URL {}{}: {}", self.base_url, endpoint, e)))?;

        if !query.is_empty() {
            let mut pairs = query.to_vec();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }

    async fn send(&self, url: &Url) -> ExchangeResult<(StatusCode, Bytes)> {
        let _permit = self.pacer.acquire().await;

        let request = Request::builder()
            .method(Method::GET)
            .uri(url.as_str())
            .header(ACCEPT, "application/json")
            .body(Body::empty())?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ExchangeError::Transport(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| ExchangeError::Transport(format!("GET {}: reading body: {}", url, e)))?;

        Ok((status, body))
    }

    fn decode<T: DeserializeOwned>(&self, url: &Url, status: StatusCode, body: &[u8]) -> ExchangeResult<T> {
        if self.debug {
            log::debug!("GET {} {}\n{}", url, status.as_u16(), String::from_utf8_lossy(body));
        }

        if let Some(fault) = detect_fault::<D>(status, body) {
            return Err(ExchangeError::UpstreamApi {
                method: Method::GET.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                code: fault.code,
                message: fault.message,
            });
        }

        if status != StatusCode::OK {
            return Err(ExchangeError::UpstreamStatus {
                method: Method::GET.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        serde_json::from_slice(body).map_err(|e| ExchangeError::Decode(format!("GET {}: {}", url, e)))
    }
}
