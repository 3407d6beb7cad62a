// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Shutdown coordination shared between the signal task and the accept loop
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    notify: Notify,
    requested: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake the accept loop
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
        // notify_one stores a permit, so a trigger before the loop waits is not lost
        self.notify.notify_one();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested
    pub async fn wait(&self) {
        if self.is_requested() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Spawn a task that triggers `shutdown` on SIGTERM or SIGINT (Unix)
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<ShutdownSignal>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        logger::log_info(&format!("{name} received, initiating graceful shutdown"));
        shutdown.trigger();
    });
    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<ShutdownSignal>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::log_info("Ctrl+C received, initiating graceful shutdown");
            shutdown.trigger();
        }
    });
    Ok(())
}
