use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use eyre::Result;
use tokio::{signal, sync::broadcast};

/// Represents different shutdown reasons
#[derive(Debug, Clone)]
pub enum ShutdownReason {
    /// Graceful shutdown requested (SIGTERM, SIGINT)
    Graceful,
}

/// Manages graceful shutdown of the gateway process.
///
/// In-flight outbound calls are not cancelled; they run to completion or
/// timeout before their result is discarded.
pub struct GracefulShutdown {
    /// Broadcast sender for shutdown signals
    shutdown_tx: broadcast::Sender<ShutdownReason>,
    /// Flag indicating if shutdown has been initiated
    shutdown_initiated: Arc<AtomicBool>,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            shutdown_tx,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a receiver for shutdown signals
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.shutdown_tx.subscribe()
    }

    /// Check if shutdown has been initiated
    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Relaxed)
    }

    /// Manually trigger shutdown
    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            tracing::info!("Shutdown triggered: {:?}", reason);
            let _ = self.shutdown_tx.send(reason);
        }
    }

    /// Start listening for OS signals and manage the shutdown process
    pub async fn run_signal_handler(&self) -> Result<()> {
        tracing::info!("Signal handler started. Listening for SIGTERM and SIGINT");

        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                self.trigger_shutdown(ShutdownReason::Graceful);
            }
            _ = Self::wait_for_sigterm() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                self.trigger_shutdown(ShutdownReason::Graceful);
            }
        }

        tracing::info!("Signal handler shutting down");
        Ok(())
    }

    /// Wait until a shutdown signal has been broadcast.
    pub async fn wait_for_shutdown_signal(&self) -> ShutdownReason {
        let mut rx = self.subscribe();
        // A trigger that raced ahead of the subscription still counts
        if self.is_shutdown_initiated() {
            return ShutdownReason::Graceful;
        }
        rx.recv().await.unwrap_or(ShutdownReason::Graceful)
    }

    #[cfg(unix)]
    async fn wait_for_sigterm() {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    async fn wait_for_sigterm() {
        // On non-Unix systems, we only have Ctrl+C
        std::future::pending::<()>().await;
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_fires_subscribers_once() {
        let shutdown = GracefulShutdown::new();
        let mut rx = shutdown.subscribe();

        assert!(!shutdown.is_shutdown_initiated());
        shutdown.trigger_shutdown(ShutdownReason::Graceful);
        shutdown.trigger_shutdown(ShutdownReason::Graceful);

        assert!(shutdown.is_shutdown_initiated());
        assert!(matches!(rx.recv().await, Ok(ShutdownReason::Graceful)));
        // Second trigger was a no-op
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn wait_for_shutdown_signal_returns_reason() {
        let shutdown = Arc::new(GracefulShutdown::new());
        let waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.wait_for_shutdown_signal().await });

        // Give the waiter a chance to subscribe
        tokio::task::yield_now().await;
        shutdown.trigger_shutdown(ShutdownReason::Graceful);

        assert!(matches!(handle.await.unwrap(), ShutdownReason::Graceful));
    }
}
