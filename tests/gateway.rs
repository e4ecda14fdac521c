mod common;

use common::MockUpstream;
use hyper::{Body, Request, StatusCode};
use spot_gateway::adapter::{Registry, Router};
use spot_gateway::exchange::BybitApi;
use std::time::Duration;

async fn router_with_bybit() -> (MockUpstream, Router) {
    let upstream = MockUpstream::start().await;
    upstream.route(
        "/v5/market/instruments-info",
        200,
        r#"{"retCode":0,"retMsg":"OK","result":{"list":[
            {"symbol":"BTCUSDT","baseCoin":"BTC","quoteCoin":"USDT","status":"Trading"},
            {"symbol":"ETHUSDT","baseCoin":"ETH","quoteCoin":"USDT","status":"Trading"}
        ]}}"#,
    );
    upstream.route(
        "/v5/market/tickers",
        200,
        r#"{"retCode":0,"retMsg":"OK","result":{"list":[
            {"symbol":"BTCUSDT","ask1Price":"30001","bid1Price":"30000"}
        ]}}"#,
    );
    upstream.route(
        "/v5/market/orderbook",
        200,
        r#"{"retCode":0,"retMsg":"OK","result":{"a":[["30002","1"],["30001","2"]],"b":[["29999","1"],["30000","3"]]}}"#,
    );

    let registry = Registry::new().with(BybitApi::new(&upstream.settings()));
    (upstream, Router::new(registry, Duration::from_secs(5)))
}

fn get(path: &str) -> Request<Body> {
    Request::get(path).body(Body::empty()).unwrap()
}

async fn json(response: hyper::Response<Body>) -> serde_json::Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn pairs_endpoint_returns_merged_pairs() {
    let (_upstream, router) = router_with_bybit().await;

    let response = router.handle(get("/bybit/pairs")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json(response).await,
        serde_json::json!([{
            "id": "BTCUSDT",
            "base_asset": "BTC",
            "quote_asset": "USDT",
            "ask": "30001",
            "bid": "30000"
        }])
    );
}

#[tokio::test]
async fn order_book_endpoint_sorts_both_sides() {
    let (_upstream, router) = router_with_bybit().await;

    let response = router.handle(get("/bybit/orderbook/BTCUSDT")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json(response).await,
        serde_json::json!({
            "ask": [["30001", "2"], ["30002", "1"]],
            "bid": [["30000", "3"], ["29999", "1"]]
        })
    );
}

#[tokio::test]
async fn exchanges_endpoint_lists_registered_ids() {
    let (_upstream, router) = router_with_bybit().await;

    let response = router.handle(get("/exchanges")).await;

    assert_eq!(json(response).await, serde_json::json!(["bybit"]));
}

#[tokio::test]
async fn unknown_exchange_never_reaches_upstream() {
    let (upstream, router) = router_with_bybit().await;

    let response = router.handle(get("/unknown/pairs")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert!(body.is_empty());
    assert!(upstream.hits().is_empty());
}

#[tokio::test]
async fn upstream_failure_becomes_500() {
    let (upstream, router) = router_with_bybit().await;
    upstream.route("/v5/market/orderbook", 502, "bad gateway");

    let response = router.handle(get("/bybit/orderbook/BTCUSDT")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
