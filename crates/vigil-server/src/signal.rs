use tracing::{info, warn};

/// Why the service is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM
    Term,
    /// SIGINT, Ctrl+C
    Interrupt,
}

/// Resolves on SIGINT or SIGTERM.
///
/// When the handlers cannot be installed this never resolves and the process
/// has to be stopped from outside.
pub async fn shutdown_signal() -> ShutdownSignal {
    match system_signal().await {
        Ok(signal) => signal,
        Err(e) => {
            warn!(error = %e, "Cannot listen for OS signals");
            std::future::pending().await
        }
    }
}

#[cfg(unix)]
async fn system_signal() -> std::io::Result<ShutdownSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
            Ok(ShutdownSignal::Term)
        }
        _ = sigint.recv() => {
            info!("Received SIGINT");
            Ok(ShutdownSignal::Interrupt)
        }
    }
}

#[cfg(not(unix))]
async fn system_signal() -> std::io::Result<ShutdownSignal> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C");
    Ok(ShutdownSignal::Interrupt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_waits_without_a_signal() {
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown_signal()).await;
        assert!(waited.is_err());
    }
}
