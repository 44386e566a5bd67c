//! Tracer provider construction for the gRPC and HTTP OTLP transports.

use std::fmt;

use opentelemetry::KeyValue;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    Resource,
    trace::{Sampler, SdkTracerProvider},
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::TracerInitError;

/// Version reported in the `service.version` resource attribute.
pub const SERVICE_VERSION: &str = "0.0.1";

/// Path appended to HTTP collector addresses that do not carry one.
pub const HTTP_TRACES_PATH: &str = "/v1/traces";

const SEMCONV_SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.4.0";

/// OTLP transport used by a tracer provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Grpc,
    Http,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grpc => f.write_str("grpc"),
            Self::Http => f.write_str("http"),
        }
    }
}

/// Build a tracer provider exporting spans over OTLP/gRPC.
///
/// `endpoint` may be a bare `host:port`; plaintext `http://` is assumed.
/// The exporter connects lazily, so an unreachable collector does not fail
/// here. Must be called from within a Tokio runtime.
///
/// # Errors
/// Returns [`TracerInitError`] if an input is empty, `cancel` has fired, or
/// the exporter cannot be built (for example, a malformed endpoint URI).
pub fn init_grpc_tracer(
    cancel: &CancellationToken,
    service_name: &str,
    endpoint: &str,
) -> Result<SdkTracerProvider, TracerInitError> {
    check_inputs(cancel, service_name, endpoint)?;

    let endpoint = grpc_endpoint(endpoint);
    tracing::debug!(%endpoint, "building OTLP gRPC span exporter");

    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    Ok(build_provider(exporter, service_name))
}

/// Build a tracer provider exporting spans over OTLP/HTTP with protobuf bodies.
///
/// `endpoint` may be a bare `host:port`; plaintext `http://` and the
/// [`HTTP_TRACES_PATH`] path are assumed when missing.
///
/// # Errors
/// Returns [`TracerInitError`] if an input is empty, `cancel` has fired, or
/// the exporter cannot be built.
pub fn init_http_tracer(
    cancel: &CancellationToken,
    service_name: &str,
    endpoint: &str,
) -> Result<SdkTracerProvider, TracerInitError> {
    check_inputs(cancel, service_name, endpoint)?;

    let endpoint = http_endpoint(endpoint);
    tracing::debug!(%endpoint, "building OTLP HTTP span exporter");

    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .build()?;

    Ok(build_provider(exporter, service_name))
}

fn check_inputs(
    cancel: &CancellationToken,
    service_name: &str,
    endpoint: &str,
) -> Result<(), TracerInitError> {
    if service_name.is_empty() {
        return Err(TracerInitError::EmptyServiceName);
    }
    if endpoint.is_empty() {
        return Err(TracerInitError::EmptyEndpoint);
    }
    if cancel.is_cancelled() {
        return Err(TracerInitError::Cancelled);
    }
    Ok(())
}

fn build_resource(service_name: &str) -> Resource {
    Resource::builder_empty()
        .with_schema_url(
            [
                KeyValue::new("service.name", service_name.to_owned()),
                KeyValue::new("service.version", SERVICE_VERSION),
            ],
            SEMCONV_SCHEMA_URL,
        )
        .build()
}

fn build_provider(exporter: SpanExporter, service_name: &str) -> SdkTracerProvider {
    SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_batch_exporter(exporter)
        .with_resource(build_resource(service_name))
        .build()
}

fn with_scheme(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_owned()
    } else {
        format!("http://{addr}")
    }
}

fn grpc_endpoint(addr: &str) -> String {
    with_scheme(addr)
}

fn http_endpoint(addr: &str) -> String {
    let url = with_scheme(addr);
    let path = url
        .split_once("://")
        .and_then(|(_, rest)| rest.find('/').map(|i| &rest[i..]))
        .unwrap_or_default();
    if path.is_empty() || path == "/" {
        format!("{}{HTTP_TRACES_PATH}", url.trim_end_matches('/'))
    } else {
        url
    }
}
