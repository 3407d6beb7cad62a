// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing the configured connection limit
///
/// Returns `false` when the connection was rejected.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) -> bool {
    // Increment first, then check, so concurrent accepts cannot both slip under the limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return false;
        }
    }

    logger::log_debug(&format!("Accepted connection from {peer_addr}"));
    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
    );
    true
}

/// Serve one connection with HTTP/1.1, then release its slot in the counter
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_secs = state.config.performance.connection_timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.performance.keep_alive);

        let service_state = Arc::clone(&state);
        let service = service_fn(move |req| {
            handler::handle_request(req, Arc::clone(&service_state), peer_addr)
        });
        let conn = builder.serve_connection(io, service);

        if timeout_secs == 0 {
            if let Err(err) = conn.await {
                logger::log_connection_error(&err);
            }
        } else {
            match tokio::time::timeout(Duration::from_secs(timeout_secs), conn).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => logger::log_connection_error(&err),
                Err(_) => logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {timeout_secs} seconds"
                )),
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
