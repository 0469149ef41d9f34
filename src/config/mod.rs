// Configuration module entry point
// Loads layered configuration and holds the runtime state built from it

mod state;
mod types;

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::{AppConfig, Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Config file loaded when `DEMO_CONFIG` is not set (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "config";

/// Variable naming an alternate config file
pub const CONFIG_PATH_VAR: &str = "DEMO_CONFIG";

/// Prefix for per-key overrides, e.g. `DEMO__LOGGING__LEVEL=debug`
pub const ENV_PREFIX: &str = "DEMO";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ENVIRONMENT: &str = "development";

impl Config {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let vars: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self::load_from(&vars)
    }

    /// Load configuration using `vars` in place of the process environment
    ///
    /// Precedence, lowest first: built-in defaults, the config file,
    /// `DEMO__*` variables, then `PORT` and `APP_ENV` (or `NODE_ENV`).
    /// Empty values count as unset.
    pub fn load_from(vars: &HashMap<String, String>) -> Result<Self, config::ConfigError> {
        let lookup = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();

        let config_path = lookup(CONFIG_PATH_VAR).unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        let environment = lookup("APP_ENV").or_else(|| lookup("NODE_ENV"));

        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("app.environment", DEFAULT_ENVIRONMENT)?
            .set_default("app.public_dir", "public")?
            .set_default("app.index_file", "index.html")?
            .set_default("app.static_max_age", 0)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default(
                "http.server_name",
                concat!("pipeline-demo/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 102_400)? // 100kb
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            )
            .set_override_option("server.port", lookup("PORT"))?
            .set_override_option("app.environment", environment)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ServerError::InvalidAddress { addr, source })
    }
}
