use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 5000;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP server port (default: 5000).
    port: Option<u16>,
    /// Log level filter string, e.g. "debug", "info,studiod=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default) | "json" (structured for log aggregators).
    log_format: Option<String>,
    /// Bind address for the HTTP server (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

/// Resolved server configuration, constructed once in `main` and passed
/// down through `AppContext`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub log: String,
    pub log_format: String,
}

impl AppConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());
        let log_format = std::env::var("STUDIOD_LOG_FORMAT")
            .ok()
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());
        let bind_address = bind_address
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        Self {
            port,
            bind_address,
            data_dir,
            log,
            log_format,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/studiod
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("studiod");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/studiod or ~/.local/share/studiod
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("studiod");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("studiod");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\studiod
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("studiod");
        }
    }
    PathBuf::from(".studiod")
}
