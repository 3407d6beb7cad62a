// Server module entry point
// Listener setup, connection handling, the accept loop and signal-driven shutdown

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;
use connection::accept_connection;

pub use listener::create_listener;
pub use signal::{start_signal_handler, ShutdownSignal};

/// How long in-flight connections may keep running after shutdown is requested
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept connections until `shutdown` fires, then wait for open connections to drain
pub async fn run(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<ShutdownSignal>) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = shutdown.wait() => break,
        }
    }

    drop(listener);
    logger::log_info("Listener closed, draining open connections");

    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    while active_connections.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutdown with {} connection(s) still open",
                active_connections.load(Ordering::SeqCst)
            ));
            break;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
    logger::log_info("Server stopped");
}
