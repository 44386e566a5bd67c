//! OpenTelemetry tracer providers exporting over OTLP
//!
//! Two transports are supported: gRPC (tonic) and HTTP (protobuf body).
//! Providers are returned to the caller and never installed globally.

pub mod init;

pub use init::{
    HTTP_TRACES_PATH, SERVICE_VERSION, Transport, init_grpc_tracer, init_http_tracer,
};
