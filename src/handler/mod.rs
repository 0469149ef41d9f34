//! Request handler module
//!
//! Responsible for request routing dispatch: the JSON API, the landing page and static assets.

pub mod api;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
