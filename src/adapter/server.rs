// src/adapter/server.rs
// HTTP front door with bounded graceful shutdown

use crate::adapter::router::Router;
use crate::domain::errors::{AppError, AppResult};
use hyper::service::make_service_fn;
use hyper::Server;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinError;

/// Serve `router` on `addr` until `shutdown` resolves, then give in-flight
/// requests up to `shutdown_timeout` to finish.
pub async fn serve<F>(addr: SocketAddr, router: Router, shutdown_timeout: Duration, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()>,
{
    let make_svc = make_service_fn(move |_conn| {
        let router = router.clone();
        async move { Ok::<_, Infallible>(router) }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    log::info!("Listening on {}", server.local_addr());

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let graceful = server.with_graceful_shutdown(async move {
        let _ = stop_rx.await;
    });
    let mut handle = tokio::spawn(graceful);

    tokio::select! {
        joined = &mut handle => return flatten(joined),
        _ = shutdown => {}
    }

    log::info!("Shutdown signal received, draining connections...");
    let _ = stop_tx.send(());

    match tokio::time::timeout(shutdown_timeout, &mut handle).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            log::warn!("Graceful shutdown did not finish within {:?}, aborting", shutdown_timeout);
            handle.abort();
            Ok(())
        }
    }
}

fn flatten(joined: Result<hyper::Result<()>, JoinError>) -> AppResult<()> {
    match joined {
        Ok(result) => result.map_err(AppError::from),
        Err(e) => Err(AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))),
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
