//! Background HTTP listeners.
//!
//! Each endpoint gets its own router, its own socket and its own task.
//! Bind and serve failures are logged through the core logger and never
//! reach the caller of [`crate::Core::new`].

pub mod health;
pub mod metrics;

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Dispatch, instrument::WithSubscriber};

pub use health::{HEALTH_PATH, HealthResponse, health_router};
pub use metrics::{METRICS_PATH, metrics_router};

/// Which built-in endpoint a listener serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Metrics,
    Health,
}

impl Endpoint {
    /// Value of the `service` field on this listener's log lines.
    #[must_use]
    pub const fn service(self) -> &'static str {
        match self {
            Self::Metrics => "MetricsServer",
            Self::Health => "HealthcheckServer",
        }
    }

    const fn failure_message(self) -> &'static str {
        match self {
            Self::Metrics => "failed to run metrics exporter endpoint",
            Self::Health => "failed to run healthcheck server endpoint",
        }
    }
}

/// Handle to one spawned listener.
///
/// Dropping the handle leaves the listener running; call [`ServerHandle::stop`]
/// to drain it.
#[derive(Debug)]
pub struct ServerHandle {
    endpoint: Endpoint,
    cancel: CancellationToken,
    bound: watch::Receiver<Option<SocketAddr>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Spawn `router` on `runtime`, listening on `addr`.
    ///
    /// Returns immediately; binding happens on the spawned task.
    #[must_use]
    pub fn spawn(
        runtime: &Handle,
        endpoint: Endpoint,
        addr: String,
        router: Router,
        logger: Dispatch,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (bound_tx, bound) = watch::channel(None);

        let task = runtime.spawn(
            serve(endpoint, addr, router, cancel.clone(), bound_tx).with_subscriber(logger),
        );

        Self {
            endpoint,
            cancel,
            bound,
            task,
        }
    }

    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Wait until the listener is bound and return its local address.
    ///
    /// Returns `None` if binding failed or the listener already exited.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        let mut bound = self.bound.clone();
        bound.wait_for(Option::is_some).await.ok().and_then(|addr| *addr)
    }

    /// Request a graceful drain and wait up to `timeout` for it.
    ///
    /// The task is aborted if it does not finish in time. Returns `true` when
    /// the drain completed within the timeout.
    pub async fn stop(self, timeout: Duration) -> bool {
        let Self {
            endpoint,
            cancel,
            mut task,
            ..
        } = self;
        cancel.cancel();

        if tokio::time::timeout(timeout, &mut task).await.is_ok() {
            true
        } else {
            tracing::warn!(
                service = endpoint.service(),
                ?timeout,
                "listener did not drain in time, aborting"
            );
            task.abort();
            false
        }
    }
}

async fn serve(
    endpoint: Endpoint,
    addr: String,
    router: Router,
    cancel: CancellationToken,
    bound: watch::Sender<Option<SocketAddr>>,
) {
    if let Err(e) = run_listener(endpoint, &addr, router, cancel, &bound).await {
        tracing::error!(
            service = endpoint.service(),
            error = %format!("{e:#}"),
            "{}",
            endpoint.failure_message()
        );
    }
    bound.send_replace(None);
}

async fn run_listener(
    endpoint: Endpoint,
    addr: &str,
    router: Router,
    cancel: CancellationToken,
    bound: &watch::Sender<Option<SocketAddr>>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind '{addr}': {e}"))?;
    let local = listener.local_addr()?;
    bound.send_replace(Some(local));

    tracing::info!(service = endpoint.service(), "listening at {local}");

    axum::serve(listener, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(service = endpoint.service(), "listener stopped");
    Ok(())
}
