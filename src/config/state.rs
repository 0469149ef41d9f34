// Application state module
// Read-only state shared by every connection

use std::path::PathBuf;

use super::types::Config;

/// Application state
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    /// Directory static assets are served from
    pub public_dir: PathBuf,
    /// Path of the landing page served for `GET /`
    pub index_path: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let public_dir = PathBuf::from(&config.app.public_dir);
        let index_path = public_dir.join(&config.app.index_file);

        Self {
            config: config.clone(),
            public_dir,
            index_path,
        }
    }

    /// Whether an access log line is written per request
    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}
