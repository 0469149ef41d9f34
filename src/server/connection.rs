// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing the connection limit.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
/// * `graceful` - Shutdown watcher the connection registers with
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    graceful: &GracefulShutdown,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    if let Err(e) = stream.set_nodelay(true) {
        logger::log_warning(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        graceful,
    );
}

/// Serve one connection in a spawned task.
///
/// The connection is bounded by the larger of the read and write timeouts
/// (no bound when both are 0) and decrements `conn_counter` when it ends.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    graceful: &GracefulShutdown,
) {
    let io = TokioIo::new(stream);
    let performance = &state.config.performance;

    let lifetime = match performance.read_timeout.max(performance.write_timeout) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    let mut builder = http1::Builder::new();
    builder
        .keep_alive(performance.keep_alive)
        .timer(TokioTimer::new())
        .header_read_timeout(
            (performance.read_timeout > 0).then(|| Duration::from_secs(performance.read_timeout)),
        );

    let service = service_fn(move |req: Request<Incoming>| {
        // Request bodies are never read by any route
        let (parts, _body) = req.into_parts();
        handler::handle_request(Request::from_parts(parts, ()), Arc::clone(&state), peer_addr)
    });

    let conn = graceful.watch(builder.serve_connection(io, service));

    tokio::spawn(async move {
        let result = match lifetime {
            Some(limit) => tokio::time::timeout(limit, conn).await,
            None => Ok(conn.await),
        };

        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_warning(&format!(
                "Connection from {peer_addr} closed after {}s timeout",
                lifetime.map_or(0, |d| d.as_secs())
            )),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
