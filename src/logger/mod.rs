//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Subscriber setup (pretty or JSON output, `RUST_LOG` override)
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging

mod format;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use crate::error::ServerError;
use std::net::SocketAddr;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target used for access log events, so they can be filtered separately
pub const ACCESS_TARGET: &str = "access";

/// Initialize the global tracing subscriber
///
/// Should be called once at application startup. `RUST_LOG` takes
/// precedence over `logging.level` when set.
pub fn init(config: &LoggingConfig) -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ServerError::Logging(format!("invalid log level '{}': {e}", config.level)))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.format == "json" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init()
    };

    result.map_err(|e| ServerError::Logging(e.to_string()))
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    info!("Server is running on port {}", addr.port());
    info!(
        address = %addr,
        environment = %config.app.environment,
        public_dir = %config.app.public_dir,
        "Listening on: http://{addr}"
    );
    match config.server.workers {
        Some(workers) => info!("Worker threads: {workers}"),
        None => info!("Worker threads: default (CPU cores)"),
    }
    if let Some(max) = config.performance.max_connections {
        info!("Max connections: {max}");
    }
}

pub fn log_shutdown_started() {
    info!("Shutdown requested, no longer accepting connections");
}

pub fn log_shutdown_complete(active_connections: usize) {
    info!(active_connections, "Server stopped");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    debug!(peer = %peer_addr, "Connection accepted");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    warn!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    error!("{message}");
}

pub fn log_warning(message: &str) {
    warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    info!(target: ACCESS_TARGET, "{}", entry.format(format));
}
