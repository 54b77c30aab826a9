//! Query listener tasks.
//!
//! Each task binds its address, reports the outcome on a oneshot, then
//! serves until the stop signal flips.

use super::RuntimeError;
use axum::Router;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub(crate) type Readiness = oneshot::Receiver<Result<SocketAddr, RuntimeError>>;

pub(crate) struct ListenerTask {
    pub addr: SocketAddr,
    pub handle: JoinHandle<Result<(), RuntimeError>>,
}

pub(crate) fn spawn(
    addr: SocketAddr,
    router: Router,
    mut stop: watch::Receiver<bool>,
) -> (ListenerTask, Readiness) {
    let (ready_tx, ready_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let bound = TcpListener::bind(addr)
            .await
            .and_then(|listener| listener.local_addr().map(|local| (listener, local)));
        let (listener, local) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                // Reported through readiness; the task itself has nothing left to do.
                let _ = ready_tx.send(Err(RuntimeError::BindFailure { addr, source }));
                return Ok(());
            }
        };

        if ready_tx.send(Ok(local)).is_err() {
            debug!(%local, "Runtime stopped waiting for readiness");
            return Ok(());
        }
        info!(%local, "Query listener accepting connections");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = stop.wait_for(|stopped| *stopped).await;
            })
            .await
            .map_err(|source| RuntimeError::Server { addr: local, source })
    });

    (ListenerTask { addr, handle }, ready_rx)
}

/// Await one readiness report. A dropped sender means the task died first.
pub(crate) async fn await_ready(addr: SocketAddr, ready: Readiness) -> Result<SocketAddr, RuntimeError> {
    ready.await.unwrap_or_else(|_| {
        Err(RuntimeError::Server {
            addr,
            source: io::Error::other("listener exited before reporting readiness"),
        })
    })
}
