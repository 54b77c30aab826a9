//! # Service Runtime
//!
//! Owns the process lifecycle: binds the query listeners, waits for a
//! shutdown trigger and releases resources in a fixed order.
//!
//! ## Startup
//!
//! 1. `Created -> Starting` via a single compare-exchange. Any later or
//!    concurrent start call is a no-op that returns `Ok(())`.
//! 2. One task per configured address binds and reports readiness.
//! 3. The runtime waits for every report (barrier) before `Running`.
//!
//! ## Teardown
//!
//! Runs after shutdown and after a failed startup alike:
//!
//! 1. Signal graceful shutdown to every listener (stop accepting)
//! 2. Await the listener tasks (listeners closed)
//! 3. Close the finality store
//!
//! A failing step is logged and the next step still runs.

mod listeners;
mod state;

pub use state::RuntimeState;

use crate::config::ServerConfig;
use fg_02_finality_store::FinalityStore;
use fg_03_finality::{FinalityQueryApi, FinalityService};
use fg_04_query_api::build_router;
use futures::future::join_all;
use listeners::ListenerTask;
use parking_lot::Mutex;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A listener could not be bound. Fatal to startup.
    #[error("failed to bind query listener on {addr}: {source}")]
    BindFailure {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// A bound listener failed while serving.
    #[error("query listener on {addr} failed: {source}")]
    Server {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

pub struct ServiceRuntime<S: FinalityStore> {
    config: ServerConfig,
    service: Arc<FinalityService<S>>,
    state: AtomicU8,
    state_tx: watch::Sender<RuntimeState>,
    stop_tx: watch::Sender<bool>,
    listeners: Mutex<Vec<ListenerTask>>,
    bound: Mutex<Vec<SocketAddr>>,
}

impl<S: FinalityStore> ServiceRuntime<S> {
    pub fn new(config: ServerConfig, service: Arc<FinalityService<S>>) -> Self {
        let (state_tx, _) = watch::channel(RuntimeState::Created);
        let (stop_tx, _) = watch::channel(false);
        Self {
            config,
            service,
            state: AtomicU8::new(RuntimeState::Created as u8),
            state_tx,
            stop_tx,
            listeners: Mutex::new(Vec::new()),
            bound: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> RuntimeState {
        RuntimeState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<RuntimeState> {
        self.state_tx.subscribe()
    }

    /// Local addresses of the bound listeners (resolved ports included).
    pub fn bound_addrs(&self) -> Vec<SocketAddr> {
        self.bound.lock().clone()
    }

    pub fn service(&self) -> &Arc<FinalityService<S>> {
        &self.service
    }

    /// Start, serve until `shutdown` resolves, then tear down.
    ///
    /// Returns `Ok(())` immediately if the runtime was already started.
    pub async fn run_until_shutdown<F>(&self, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        if !self.try_begin_start() {
            debug!(state = %self.state(), "Runtime already started, ignoring start");
            return Ok(());
        }

        if let Err(e) = self.start_listeners().await {
            error!(error = %e, "Startup failed, tearing down");
            self.teardown().await;
            return Err(e);
        }

        self.set_state(RuntimeState::Running);
        info!(addrs = ?self.bound_addrs(), "Finality query service running");

        shutdown.await;
        info!("Shutdown signal received");
        self.teardown().await;
        Ok(())
    }

    fn try_begin_start(&self) -> bool {
        let won = self
            .state
            .compare_exchange(
                RuntimeState::Created as u8,
                RuntimeState::Starting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if won {
            self.state_tx.send_replace(RuntimeState::Starting);
        }
        won
    }

    fn set_state(&self, next: RuntimeState) {
        self.state.store(next as u8, Ordering::Release);
        self.state_tx.send_replace(next);
        debug!(state = %next, "Runtime state changed");
    }

    async fn start_listeners(&self) -> Result<(), RuntimeError> {
        let api: Arc<dyn FinalityQueryApi> = self.service.clone();
        let router = build_router(api, &self.config.api);

        let mut pending = Vec::with_capacity(self.config.listen_addrs.len());
        {
            let mut tasks = self.listeners.lock();
            for &addr in &self.config.listen_addrs {
                let (task, ready) = listeners::spawn(addr, router.clone(), self.stop_tx.subscribe());
                tasks.push(task);
                pending.push(listeners::await_ready(addr, ready));
            }
        }

        let mut first_error = None;
        let mut bound = Vec::new();
        for result in join_all(pending).await {
            match result {
                Ok(local) => bound.push(local),
                Err(e) => {
                    error!(error = %e, "Query listener failed to start");
                    first_error.get_or_insert(e);
                }
            }
        }
        *self.bound.lock() = bound;

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn teardown(&self) {
        self.set_state(RuntimeState::ShuttingDown);

        self.stop_tx.send_replace(true);
        debug!("Stopped accepting query requests");

        let tasks = std::mem::take(&mut *self.listeners.lock());
        for ListenerTask { addr, handle } in tasks {
            match handle.await {
                Ok(Ok(())) => debug!(%addr, "Query listener closed"),
                Ok(Err(e)) => error!(%addr, error = %e, "Query listener closed with error"),
                Err(e) => error!(%addr, error = %e, "Query listener task aborted"),
            }
        }

        match self.service.store().close() {
            Ok(()) => debug!("Finality store closed"),
            Err(e) => warn!(error = %e, "Failed to close finality store"),
        }

        self.set_state(RuntimeState::Stopped);
        info!("Runtime stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_02_finality_store::InMemoryFinalityStore;
    use fg_04_query_api::QueryApiConfig;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn config(addrs: Vec<SocketAddr>) -> ServerConfig {
        ServerConfig {
            listen_addrs: addrs,
            api: QueryApiConfig::default(),
        }
    }

    fn ephemeral() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    fn runtime(addrs: Vec<SocketAddr>) -> (Arc<ServiceRuntime<InMemoryFinalityStore>>, InMemoryFinalityStore) {
        let store = InMemoryFinalityStore::new();
        let service = Arc::new(FinalityService::new(Arc::new(store.clone())));
        (Arc::new(ServiceRuntime::new(config(addrs), service)), store)
    }

    async fn wait_for(runtime: &ServiceRuntime<InMemoryFinalityStore>, state: RuntimeState) {
        let mut rx = runtime.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| *s == state))
            .await
            .expect("timed out waiting for state")
            .unwrap();
    }

    #[tokio::test]
    async fn test_lifecycle_and_teardown_order() {
        let (runtime, store) = runtime(vec![ephemeral(), ephemeral()]);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = {
            let runtime = runtime.clone();
            tokio::spawn(async move {
                runtime
                    .run_until_shutdown(async {
                        let _ = stop_rx.await;
                    })
                    .await
            })
        };

        wait_for(&runtime, RuntimeState::Running).await;
        let addrs = runtime.bound_addrs();
        assert_eq!(addrs.len(), 2);
        assert_ne!(addrs[0], addrs[1]);
        assert!(!store.is_closed());
        for addr in &addrs {
            assert!(tokio::net::TcpStream::connect(addr).await.is_ok());
        }

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(runtime.state(), RuntimeState::Stopped);
        assert!(store.is_closed());
        for addr in &addrs {
            assert!(tokio::net::TcpStream::connect(addr).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_concurrent_start_binds_once() {
        let (runtime, _store) = runtime(vec![ephemeral()]);
        let (stop_tx, stop_rx) = watch::channel(false);

        let spawn_start = |mut stop: watch::Receiver<bool>| {
            let runtime = runtime.clone();
            tokio::spawn(async move {
                runtime
                    .run_until_shutdown(async move {
                        let _ = stop.wait_for(|stopped| *stopped).await;
                    })
                    .await
            })
        };
        let first = spawn_start(stop_rx.clone());
        let second = spawn_start(stop_rx);

        // Whichever call lost the race returns at once; the winner keeps serving.
        wait_for(&runtime, RuntimeState::Running).await;
        assert_eq!(runtime.bound_addrs().len(), 1);

        stop_tx.send_replace(true);
        let (first, second) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(first, second)
        })
        .await
        .unwrap_or_else(|_| panic!("one start call never returned"));
        assert!(first.unwrap().is_ok());
        assert!(second.unwrap().is_ok());
        assert_eq!(runtime.state(), RuntimeState::Stopped);

        // Restarting a stopped runtime is also a no-op.
        runtime.run_until_shutdown(std::future::pending()).await.unwrap();
        assert_eq!(runtime.state(), RuntimeState::Stopped);
    }

    #[tokio::test]
    async fn test_bind_failure_still_tears_down() {
        let occupied = std::net::TcpListener::bind(ephemeral()).unwrap();
        let taken = occupied.local_addr().unwrap();
        let (runtime, store) = runtime(vec![ephemeral(), taken]);

        let result = runtime.run_until_shutdown(std::future::pending()).await;

        match result {
            Err(RuntimeError::BindFailure { addr, .. }) => assert_eq!(addr, taken),
            other => panic!("expected bind failure, got {other:?}"),
        }
        assert_eq!(runtime.state(), RuntimeState::Stopped);
        assert!(store.is_closed());
        assert_eq!(runtime.bound_addrs().len(), 1);
    }
}
