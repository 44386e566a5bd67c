//! Process logger owned by the bootstrap handle.
//!
//! The logger is a standalone [`Dispatch`] rather than the global default, so
//! the core can log through it even when the host has already installed its
//! own subscriber. Hosts that want it globally call
//! [`tracing::dispatcher::set_global_default`] with a clone.

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Build a JSON-lines logger writing to stdout.
///
/// `level` is an `EnvFilter` directive string (`"info"`, `"warn,svckit=debug"`).
/// Invalid directives fall back to [`DEFAULT_LOG_LEVEL`].
#[must_use]
pub fn build_logger(level: &str) -> Dispatch {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let subscriber = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_target(true)
        .with_writer(std::io::stdout)
        .with_env_filter(filter)
        .finish();

    Dispatch::new(subscriber)
}
