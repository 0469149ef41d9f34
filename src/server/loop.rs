// Server loop module
// Accepts connections until shutdown, then drains in-flight requests

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How long open connections get to finish after shutdown is requested
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Accept loop
///
/// Stops accepting as soon as `shutdown` resolves, closes the listener, then
/// waits up to [`SHUTDOWN_GRACE`] for open connections to complete.
pub async fn start_server_loop<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            &graceful,
                        );
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = &mut shutdown => {
                logger::log_shutdown_started();
                break;
            }
        }
    }

    drop(listener);

    tokio::select! {
        () = graceful.shutdown() => {}
        () = tokio::time::sleep(SHUTDOWN_GRACE) => {
            logger::log_warning(&format!(
                "Shutdown grace period of {}s elapsed with connections still open",
                SHUTDOWN_GRACE.as_secs()
            ));
        }
    }

    logger::log_shutdown_complete(active_connections.load(Ordering::SeqCst));
}
