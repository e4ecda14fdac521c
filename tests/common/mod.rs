// Canned-response upstream for exercising adapters over real HTTP.
#![allow(dead_code)]

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use spot_gateway::exchange::ExchangeSettings;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub query: String,
    pub at: Instant,
}

#[derive(Default)]
struct State {
    routes: HashMap<String, (u16, String)>,
    hits: Vec<Hit>,
}

/// Serves fixed `(status, body)` pairs by path and records every request.
#[derive(Clone)]
pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(State::default()));
        let shared = state.clone();

        let make_svc = make_service_fn(move |_conn| {
            let state = shared.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                    let state = state.clone();
                    async move { Ok::<_, Infallible>(respond(&state, &req)) }
                }))
            }
        });

        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = Server::bind(&addr).serve(make_svc);
        let addr = server.local_addr();
        tokio::spawn(server);

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn settings(&self) -> ExchangeSettings {
        ExchangeSettings {
            base_url: self.url(),
            pacing_interval: Duration::from_millis(1),
            pairs_ttl: Duration::from_secs(60),
            debug: true,
        }
    }

    pub fn route(&self, path: &str, status: u16, body: &str) {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.lock().unwrap().hits.clone()
    }

    pub fn hit_count(&self, path: &str) -> usize {
        self.hits().iter().filter(|hit| hit.path == path).count()
    }
}

fn respond(state: &Mutex<State>, req: &Request<Body>) -> Response<Body> {
    let mut state = state.lock().unwrap();
    let path = req.uri().path().to_string();
    state.hits.push(Hit {
        path: path.clone(),
        query: req.uri().query().unwrap_or_default().to_string(),
        at: Instant::now(),
    });

    let (status, body) = state
        .routes
        .get(&path)
        .cloned()
        .unwrap_or((404, String::new()));

    Response::builder()
        .status(StatusCode::from_u16(status).unwrap())
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}
