use std::time::Duration;

use crate::telemetry::Transport;

/// Errors returned by [`crate::Core`] bootstrap and shutdown.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    #[error("service name not set or empty string")]
    NoServiceName,

    #[error("failed to init {transport}-trace-provider")]
    TraceProvider {
        transport: Transport,
        #[source]
        source: TracerInitError,
    },

    #[error("failed to register metrics endpoint collectors: {0}")]
    MetricsRegistry(#[from] prometheus::Error),

    #[error("no Tokio runtime available to run the {0}")]
    NoRuntime(&'static str),

    #[error("failed to shut down {transport}-trace-provider")]
    TraceProviderShutdown {
        transport: Transport,
        #[source]
        source: opentelemetry_sdk::error::OTelSdkError,
    },

    #[error("{component} did not stop within {timeout:?}")]
    ShutdownTimeout {
        component: String,
        timeout: Duration,
    },
}

/// Errors from building a tracer provider.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TracerInitError {
    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("collector endpoint must not be empty")]
    EmptyEndpoint,

    #[error("tracer setup cancelled")]
    Cancelled,

    #[error("failed to build OTLP span exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),
}
