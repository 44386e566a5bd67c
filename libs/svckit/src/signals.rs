use anyhow::Result;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// What ended [`wait_for_shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    CtrlC,
    Sigterm,
    /// The root token was cancelled from inside the process.
    Cancelled,
}

/// Wait for Ctrl+C, SIGTERM, or cancellation of `cancel`, whichever comes first.
///
/// # Errors
/// Returns an error if a signal handler cannot be installed.
pub async fn wait_for_shutdown(cancel: &CancellationToken) -> Result<ShutdownReason> {
    let reason = tokio::select! {
        result = wait_ctrl_c() => result?,
        result = wait_sigterm() => result?,
        () = cancel.cancelled() => ShutdownReason::Cancelled,
    };

    tracing::info!(?reason, "shutdown requested");
    Ok(reason)
}

async fn wait_ctrl_c() -> Result<ShutdownReason> {
    signal::ctrl_c().await.map_err(|e| {
        tracing::error!(%e, "error handling Ctrl+C signal");
        e
    })?;
    Ok(ShutdownReason::CtrlC)
}

#[cfg(unix)]
async fn wait_sigterm() -> Result<ShutdownReason> {
    let mut handler =
        signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(|e| {
            tracing::error!(%e, "failed to install SIGTERM handler");
            e
        })?;
    handler.recv().await;
    Ok(ShutdownReason::Sigterm)
}

#[cfg(not(unix))]
async fn wait_sigterm() -> Result<ShutdownReason> {
    std::future::pending::<Result<ShutdownReason>>().await
}
