pub mod assignment;
pub mod config;
pub mod error;
pub mod model;
pub mod progress;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use config::AppConfig;
use storage::Storage;

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub storage: Arc<Storage>,
    pub started_at: std::time::Instant,
}
