//! Observability bootstrap for backend services.
//!
//! One call to [`Core::new`] (or [`Core::from_env`]) gives a service a JSON
//! logger, OTLP tracer providers over gRPC and HTTP, a Prometheus scrape
//! endpoint with its own registry, and a static health endpoint. Every
//! component except the logger is optional and enabled by its address.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod signals;
pub mod telemetry;

pub use bootstrap::Core;
pub use config::{CoreOpts, check_env};
pub use error::{CoreError, TracerInitError};
pub use logging::build_logger;
pub use server::{Endpoint, ServerHandle};
pub use signals::{ShutdownReason, wait_for_shutdown};
pub use telemetry::{Transport, init_grpc_tracer, init_http_tracer};
