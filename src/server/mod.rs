// Server module entry point
// Listener creation, connection serving and the shutdown-aware accept loop

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is exposed as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{AppState, Config};
use crate::error::Result;
use crate::logger;

pub use listener::create_listener;
pub use server_loop::start_server_loop;

/// A bound HTTP server
///
/// Created with [`Server::bind`], which opens the listener immediately, and
/// torn down when the shutdown future given to [`Server::run_until`] resolves.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    /// Bind the configured address. Must be called inside a Tokio runtime.
    pub fn bind(config: &Config) -> Result<Self> {
        let addr = config.get_socket_addr()?;
        let listener = create_listener(addr)?;

        Ok(Self {
            listener,
            state: Arc::new(AppState::new(config)),
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound, useful when the configured port is 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until SIGINT or SIGTERM
    pub async fn run(self) -> Result<()> {
        self.run_until(signal::shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        logger::log_server_start(&addr, &self.state.config);

        start_server_loop(self.listener, self.state, self.active_connections, shutdown).await;
        Ok(())
    }
}
