//! Bootstrap orchestrator.
//!
//! [`Core::new`] validates the options, builds the tracer providers, and spawns
//! the metrics and health listeners. The steps run in a fixed order:
//!
//! 1. service name check (the only hard validation)
//! 2. HTTP tracer provider, if `jaeger_http_addr` is set
//! 3. gRPC tracer provider, if `jaeger_grpc_addr` is set
//! 4. metrics listener, if `metrics_addr` is set
//! 5. health listener, if `health_check_addr` is set
//!
//! A tracer failure aborts bootstrap and drops whatever was already built.
//! Listeners are spawned and not awaited; their failures only reach the log.

use std::time::Duration;

use opentelemetry_sdk::{error::OTelSdkError, trace::SdkTracerProvider};
use prometheus::Registry;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{Dispatch, instrument::WithSubscriber};

use crate::config::CoreOpts;
use crate::error::CoreError;
use crate::logging::{DEFAULT_LOG_LEVEL, build_logger};
use crate::server::{Endpoint, ServerHandle, health_router, metrics_router};
use crate::telemetry::{Transport, init_grpc_tracer, init_http_tracer};

/// Handle to everything bootstrap constructed.
///
/// `None` fields were not configured; callers treat them as no-ops.
#[derive(Debug)]
pub struct Core {
    pub logger: Dispatch,
    pub http_trace_provider: Option<SdkTracerProvider>,
    pub grpc_trace_provider: Option<SdkTracerProvider>,
    pub prom_registry: Option<Registry>,
    metrics_server: Option<ServerHandle>,
    health_server: Option<ServerHandle>,
}

impl Core {
    /// Bootstrap from [`CoreOpts::from_env`].
    ///
    /// # Errors
    /// See [`Core::new`].
    pub fn from_env(cancel: &CancellationToken) -> Result<Self, CoreError> {
        Self::new(cancel, &CoreOpts::from_env())
    }

    /// Bootstrap from explicit options.
    ///
    /// `cancel` is only consulted while the tracer providers are built.
    /// Anything beyond the logger and the HTTP tracer needs a Tokio runtime.
    ///
    /// # Errors
    /// - [`CoreError::NoServiceName`] if the service name is missing or empty
    /// - [`CoreError::TraceProvider`] if a tracer provider cannot be built
    /// - [`CoreError::MetricsRegistry`] if the metrics endpoint cannot register its collector
    /// - [`CoreError::NoRuntime`] if a component needs a Tokio runtime and none is running
    pub fn new(cancel: &CancellationToken, opts: &CoreOpts) -> Result<Self, CoreError> {
        let service_name = opts.service_name().ok_or(CoreError::NoServiceName)?;

        let logger = build_logger(opts.log_level().unwrap_or(DEFAULT_LOG_LEVEL));
        let _log_guard = tracing::dispatcher::set_default(&logger);

        let http_trace_provider = opts
            .jaeger_http_addr()
            .map(|addr| {
                let provider = init_http_tracer(cancel, service_name, addr).map_err(|source| {
                    CoreError::TraceProvider {
                        transport: Transport::Http,
                        source,
                    }
                })?;
                tracing::info!(service = service_name, "init http trace provider");
                Ok::<_, CoreError>(provider)
            })
            .transpose()?;

        let grpc_trace_provider = opts
            .jaeger_grpc_addr()
            .map(|addr| {
                // tonic needs a reactor to set up its lazy channel
                runtime("gRPC trace exporter")?;
                let provider = init_grpc_tracer(cancel, service_name, addr).map_err(|source| {
                    CoreError::TraceProvider {
                        transport: Transport::Grpc,
                        source,
                    }
                })?;
                tracing::info!(service = service_name, "init grpc trace provider");
                Ok::<_, CoreError>(provider)
            })
            .transpose()?;

        let (prom_registry, metrics_server) = if let Some(addr) = opts.metrics_addr() {
            let registry = Registry::new();
            let router = metrics_router(registry.clone())?;
            let server = ServerHandle::spawn(
                &runtime("metrics endpoint")?,
                Endpoint::Metrics,
                addr.to_owned(),
                router,
                logger.clone(),
            );
            (Some(registry), Some(server))
        } else {
            (None, None)
        };

        let health_server = opts
            .health_check_addr()
            .map(|addr| {
                Ok::<_, CoreError>(ServerHandle::spawn(
                    &runtime("health endpoint")?,
                    Endpoint::Health,
                    addr.to_owned(),
                    health_router(),
                    logger.clone(),
                ))
            })
            .transpose()?;

        Ok(Self {
            logger,
            http_trace_provider,
            grpc_trace_provider,
            prom_registry,
            metrics_server,
            health_server,
        })
    }

    #[must_use]
    pub const fn tracer_provider(&self, transport: Transport) -> Option<&SdkTracerProvider> {
        match transport {
            Transport::Http => self.http_trace_provider.as_ref(),
            Transport::Grpc => self.grpc_trace_provider.as_ref(),
        }
    }

    #[must_use]
    pub const fn metrics_server(&self) -> Option<&ServerHandle> {
        self.metrics_server.as_ref()
    }

    #[must_use]
    pub const fn health_server(&self) -> Option<&ServerHandle> {
        self.health_server.as_ref()
    }

    /// Stop the listeners and flush and shut down the tracer providers.
    ///
    /// Each step waits at most `timeout`. Listeners that do not drain in time
    /// are aborted. Every component is attempted even after a failure.
    ///
    /// # Errors
    /// Returns the first failure: [`CoreError::ShutdownTimeout`] or
    /// [`CoreError::TraceProviderShutdown`].
    pub async fn shutdown(self, timeout: Duration) -> Result<(), CoreError> {
        let logger = self.logger.clone();
        self.shutdown_all(timeout).with_subscriber(logger).await
    }

    async fn shutdown_all(self, timeout: Duration) -> Result<(), CoreError> {
        let Self {
            http_trace_provider,
            grpc_trace_provider,
            metrics_server,
            health_server,
            ..
        } = self;
        let mut first_error = None;

        for server in [metrics_server, health_server].into_iter().flatten() {
            let endpoint = server.endpoint();
            if !server.stop(timeout).await {
                first_error.get_or_insert(CoreError::ShutdownTimeout {
                    component: endpoint.service().to_owned(),
                    timeout,
                });
            }
        }

        let providers = [
            (Transport::Http, http_trace_provider),
            (Transport::Grpc, grpc_trace_provider),
        ];
        for (transport, provider) in providers {
            let Some(provider) = provider else {
                continue;
            };
            if let Err(e) = shutdown_provider(transport, provider, timeout).await {
                tracing::warn!(error = %e, "trace provider shutdown failed");
                first_error.get_or_insert(e);
            }
        }

        tracing::info!("core shut down");
        first_error.map_or(Ok(()), Err)
    }
}

fn runtime(component: &'static str) -> Result<Handle, CoreError> {
    Handle::try_current().map_err(|_| CoreError::NoRuntime(component))
}

async fn shutdown_provider(
    transport: Transport,
    provider: SdkTracerProvider,
    timeout: Duration,
) -> Result<(), CoreError> {
    // The batch processor blocks while it flushes.
    let task = tokio::task::spawn_blocking(move || provider.shutdown());

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => {
            result.map_err(|source| CoreError::TraceProviderShutdown { transport, source })
        }
        Ok(Err(join_error)) => Err(CoreError::TraceProviderShutdown {
            transport,
            source: OTelSdkError::InternalFailure(join_error.to_string()),
        }),
        Err(_) => Err(CoreError::ShutdownTimeout {
            component: format!("{transport}-trace-provider"),
            timeout,
        }),
    }
}
