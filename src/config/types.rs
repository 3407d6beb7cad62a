// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub streaming: StreamingConfig,
    pub routes: RoutesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads (defaults to CPU cores)
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Log every request header at debug level
    pub show_headers: bool,
    /// Access log format (combined, common or json)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Upper bound on a connection's lifetime in seconds (0 disables)
    pub connection_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
}

/// Streaming behaviour configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StreamingConfig {
    /// Directory served by the filesystem store
    pub storage_root: String,
    /// Client cache lifetime in seconds; 0 sends no-cache headers
    pub expires_secs: u64,
    /// Copy buffer size in bytes
    pub buffer_size: usize,
    pub multipart_boundary: String,
}

/// Routes configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// Liveness probe path
    pub health_path: String,
}

/// Per-request view of the streaming settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub expires_secs: u64,
    pub buffer_size: usize,
    pub multipart_boundary: String,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            expires_secs: crate::http::cache::DEFAULT_EXPIRES_SECS,
            buffer_size: crate::streaming::DEFAULT_BUFFER_SIZE,
            multipart_boundary: crate::streaming::DEFAULT_BOUNDARY.to_string(),
        }
    }
}

impl From<&StreamingConfig> for StreamSettings {
    fn from(cfg: &StreamingConfig) -> Self {
        Self {
            expires_secs: cfg.expires_secs,
            buffer_size: cfg.buffer_size,
            multipart_boundary: cfg.multipart_boundary.clone(),
        }
    }
}
