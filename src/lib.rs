//! Minimal HTTP demo service
//!
//! Serves a landing page and static assets from a public directory, plus two
//! JSON endpoints: `GET /api/health` and `GET /api/message`.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::{AppState, Config};
pub use error::{Result, ServerError};
pub use server::Server;
