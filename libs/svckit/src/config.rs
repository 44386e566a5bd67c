//! Environment-derived bootstrap configuration.
//!
//! Values are read once at process start. An empty string still counts as
//! "set" when reading the environment; whether an empty value enables a
//! component is decided later by the orchestrator.

use serde::{Deserialize, Serialize};

pub const SERVICE_NAME_ENV: &str = "SERVICE_NAME";
pub const JAEGER_GRPC_ADDR_ENV: &str = "JAEGER_GRPC_ADDR";
pub const JAEGER_HTTP_ADDR_ENV: &str = "JAEGER_HTTP_ADDR";
pub const METRICS_ADDR_ENV: &str = "METRICS_ADDR";
pub const HEALTH_CHECK_ADDR_ENV: &str = "HEALTH_CHECK_ADDR";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

pub const DEFAULT_JAEGER_GRPC_ADDR: &str = "0.0.0.0:4317";
pub const DEFAULT_JAEGER_HTTP_ADDR: &str = "0.0.0.0:4318";
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9101";

/// Bootstrap options for [`crate::Core`].
///
/// Every field is optional. Address fields enable their component only when
/// present and non-empty; `service_name` is mandatory at bootstrap time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreOpts {
    pub service_name: Option<String>,
    pub jaeger_grpc_addr: Option<String>,
    pub jaeger_http_addr: Option<String>,
    pub metrics_addr: Option<String>,
    pub health_check_addr: Option<String>,
    pub log_level: Option<String>,
}

impl CoreOpts {
    /// Options with only the service name set. All other components are off.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: Some(service_name.into()),
            ..Default::default()
        }
    }

    /// Read options from the process environment.
    ///
    /// Collector and metrics addresses fall back to their fixed defaults when
    /// the variable is unset. The health endpoint stays disabled unless
    /// `HEALTH_CHECK_ADDR` is set.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            service_name: Some(check_env(SERVICE_NAME_ENV, "")),
            jaeger_grpc_addr: Some(check_env(JAEGER_GRPC_ADDR_ENV, DEFAULT_JAEGER_GRPC_ADDR)),
            jaeger_http_addr: Some(check_env(JAEGER_HTTP_ADDR_ENV, DEFAULT_JAEGER_HTTP_ADDR)),
            metrics_addr: Some(check_env(METRICS_ADDR_ENV, DEFAULT_METRICS_ADDR)),
            health_check_addr: lookup_env(HEALTH_CHECK_ADDR_ENV),
            log_level: lookup_env(LOG_LEVEL_ENV),
        }
    }

    #[must_use]
    pub fn with_jaeger_grpc_addr(mut self, addr: impl Into<String>) -> Self {
        self.jaeger_grpc_addr = Some(addr.into());
        self
    }

    #[must_use]
    pub fn with_jaeger_http_addr(mut self, addr: impl Into<String>) -> Self {
        self.jaeger_http_addr = Some(addr.into());
        self
    }

    #[must_use]
    pub fn with_metrics_addr(mut self, addr: impl Into<String>) -> Self {
        self.metrics_addr = Some(addr.into());
        self
    }

    #[must_use]
    pub fn with_health_check_addr(mut self, addr: impl Into<String>) -> Self {
        self.health_check_addr = Some(addr.into());
        self
    }

    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Service name, if present and non-empty.
    #[must_use]
    pub fn service_name(&self) -> Option<&str> {
        non_empty(self.service_name.as_deref())
    }

    #[must_use]
    pub fn jaeger_grpc_addr(&self) -> Option<&str> {
        non_empty(self.jaeger_grpc_addr.as_deref())
    }

    #[must_use]
    pub fn jaeger_http_addr(&self) -> Option<&str> {
        non_empty(self.jaeger_http_addr.as_deref())
    }

    #[must_use]
    pub fn metrics_addr(&self) -> Option<&str> {
        non_empty(self.metrics_addr.as_deref())
    }

    #[must_use]
    pub fn health_check_addr(&self) -> Option<&str> {
        non_empty(self.health_check_addr.as_deref())
    }

    #[must_use]
    pub fn log_level(&self) -> Option<&str> {
        non_empty(self.log_level.as_deref())
    }
}

/// Returns the value of `variable_name` if it is set (even to an empty
/// string), otherwise `default_value`.
#[must_use]
pub fn check_env(variable_name: &str, default_value: &str) -> String {
    lookup_env(variable_name).unwrap_or_else(|| default_value.to_owned())
}

fn lookup_env(variable_name: &str) -> Option<String> {
    std::env::var_os(variable_name).map(|v| v.to_string_lossy().into_owned())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
