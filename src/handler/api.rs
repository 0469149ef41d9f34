//! JSON API handlers
//!
//! `GET /api/health` and `GET /api/message`. Both build their payload fresh per request.

use chrono::{SecondsFormat, Utc};
use hyper::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::http::{build_json_response, HttpResponse};

pub const HEALTH_PATH: &str = "/api/health";
pub const MESSAGE_PATH: &str = "/api/message";

/// Service version reported by the health check
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HEALTHY: &str = "healthy";
pub const GREETING: &str = "Hello from CI/CD Pipeline!";

/// Health check payload
///
/// ```json
/// { "status": "healthy", "timestamp": "2026-01-01T12:00:00.000Z", "version": "1.0.0" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// UTC time of the check, RFC 3339 with millisecond precision
    pub timestamp: String,
    pub version: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: HEALTHY.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            version: VERSION.to_string(),
        }
    }
}

/// Static greeting plus the environment the service runs in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
    pub environment: String,
}

impl Message {
    pub fn new(environment: &str) -> Self {
        Self {
            message: GREETING.to_string(),
            environment: environment.to_string(),
        }
    }
}

pub fn health() -> HttpResponse {
    build_json_response(StatusCode::OK, &HealthStatus::healthy())
}

pub fn message(app: &AppConfig) -> HttpResponse {
    build_json_response(StatusCode::OK, &Message::new(&app.environment))
}
