// src/adapter/router.rs
// HTTP request dispatch onto the registered exchanges

use crate::adapter::registry::Registry;
use crate::domain::errors::{AppError, AppResult};
use crate::exchange::client::Context;
use futures_util::future::BoxFuture;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;
use tower::Service;

#[derive(Debug, PartialEq)]
enum Route<'a> {
    Exchanges,
    Pairs(&'a str),
    OrderBook(&'a str, &'a str),
}

/// Strict routing: no trailing slashes, no empty segments.
fn route(path: &str) -> Option<Route<'_>> {
    let segments: Vec<&str> = path.strip_prefix('/')?.split('/').collect();

    match segments.as_slice() {
        ["exchanges"] => Some(Route::Exchanges),
        [exchange, "pairs"] if !exchange.is_empty() => Some(Route::Pairs(*exchange)),
        [exchange, "orderbook", pair] if !exchange.is_empty() && !pair.is_empty() => {
            Some(Route::OrderBook(*exchange, *pair))
        }
        _ => None,
    }
}

/// Routes requests to exchanges; every adapter call gets a fresh
/// `request_timeout` deadline.
#[derive(Clone)]
pub struct Router {
    registry: Arc<Registry>,
    request_timeout: Duration,
}

impl Router {
    pub fn new(registry: Registry, request_timeout: Duration) -> Self {
        Self {
            registry: Arc::new(registry),
            request_timeout,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Never fails: errors become empty-bodied status responses.
    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let path = req.uri().path().to_string();

        let result = match route(&path) {
            None => Err(AppError::NotFound(path.clone())),
            Some(_) if req.method() != Method::GET => Err(AppError::MethodNotAllowed(req.method().to_string())),
            Some(Route::Exchanges) => json(&self.registry.ids()),
            Some(Route::Pairs(exchange)) => self.pairs(exchange).await,
            Some(Route::OrderBook(exchange, pair)) => self.order_book(exchange, pair).await,
        };

        match result {
            Ok(response) => {
                log::debug!("{} {} {}", req.method(), path, response.status().as_u16());
                response
            }
            Err(AppError::NotFound(_)) => empty(StatusCode::NOT_FOUND),
            Err(AppError::MethodNotAllowed(_)) => empty(StatusCode::METHOD_NOT_ALLOWED),
            Err(err) => {
                log::error!("{} [path: {}]", err, path);
                empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    async fn pairs(&self, exchange_id: &str) -> AppResult<Response<Body>> {
        let exchange = self
            .registry
            .get(exchange_id)
            .ok_or_else(|| AppError::NotFound(exchange_id.to_string()))?;

        let ctx = Context::with_timeout(self.request_timeout);
        let mut pairs = exchange.list_pairs(&ctx).await?;
        pairs.sort_by(|a, b| a.id.cmp(&b.id));

        json(&pairs)
    }

    async fn order_book(&self, exchange_id: &str, pair_id: &str) -> AppResult<Response<Body>> {
        let exchange = self
            .registry
            .get(exchange_id)
            .ok_or_else(|| AppError::NotFound(exchange_id.to_string()))?;

        let ctx = Context::with_timeout(self.request_timeout);
        let mut book = exchange.get_order_book(&ctx, pair_id).await?;
        book.sort_levels();

        json(&book)
    }
}

impl Service<Request<Body>> for Router {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response<Body>, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let router = self.clone();
        Box::pin(async move { Ok(router.handle(req).await) })
    }
}

fn json<T: Serialize>(value: &T) -> AppResult<Response<Body>> {
    let body = serde_json::to_vec(value)?;
    let mut response = Response::new(Body::from(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

fn empty(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}
