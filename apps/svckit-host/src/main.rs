use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use opentelemetry::trace::{Tracer as _, TracerProvider as _};
use svckit::{Core, CoreOpts, Transport, wait_for_shutdown};
use tokio_util::sync::CancellationToken;

/// Runs the svckit observability stack until Ctrl+C or SIGTERM.
///
/// Components are configured through the environment: `SERVICE_NAME`,
/// `JAEGER_GRPC_ADDR`, `JAEGER_HTTP_ADDR`, `METRICS_ADDR`, `HEALTH_CHECK_ADDR`
/// and `LOG_LEVEL`.
#[derive(Parser)]
#[command(name = "svckit-host")]
#[command(version)]
struct Cli {
    /// Log level override (takes precedence over `LOG_LEVEL`)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Seconds to wait for each component during shutdown
    #[arg(long, default_value_t = 10)]
    shutdown_timeout: u64,

    /// Print the effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut opts = CoreOpts::from_env();
    if let Some(level) = cli.log_level {
        opts = opts.with_log_level(level);
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&opts)?);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let core = Core::new(&cancel, &opts).context("bootstrap failed")?;
    tracing::dispatcher::set_global_default(core.logger.clone())
        .context("failed to install the core logger")?;

    for transport in [Transport::Grpc, Transport::Http] {
        if let Some(provider) = core.tracer_provider(transport) {
            provider
                .tracer("svckit-host")
                .in_span("startup_check", |_cx| {
                    tracing::info!(%transport, "startup span emitted");
                });
        }
    }
    tracing::info!("svckit-host started");

    let reason = wait_for_shutdown(&cancel).await?;
    cancel.cancel();
    tracing::info!(?reason, "stopping");

    core.shutdown(Duration::from_secs(cli.shutdown_timeout))
        .await
        .context("shutdown did not complete cleanly")?;
    Ok(())
}
