// Configuration module entry point
// Layered configuration: built-in defaults, optional TOML file, environment

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, LoggingConfig, PerformanceConfig, RoutesConfig, ServerConfig, StreamSettings,
    StreamingConfig,
};

pub const DEFAULT_CONFIG_PATH: &str = "config";
pub const ENV_PREFIX: &str = "RANGESERVE";

impl Config {
    /// Load configuration from the default `config.toml` (if present)
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (extension optional)
    ///
    /// Environment variables such as `RANGESERVE__SERVER__PORT=9000` override the file.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 300)?
            .set_default("streaming.storage_root", "./resources")?
            .set_default(
                "streaming.expires_secs",
                crate::http::cache::DEFAULT_EXPIRES_SECS,
            )?
            .set_default(
                "streaming.buffer_size",
                crate::streaming::DEFAULT_BUFFER_SIZE as u64,
            )?
            .set_default(
                "streaming.multipart_boundary",
                crate::streaming::DEFAULT_BOUNDARY,
            )?
            .set_default("routes.health_path", "/healthz")?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("/nonexistent/rangeserve-config").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.streaming.expires_secs, 2_592_000);
        assert_eq!(cfg.streaming.buffer_size, 10_240);
        assert_eq!(cfg.streaming.multipart_boundary, "MULTIPART_BYTERANGES");
        assert_eq!(cfg.routes.health_path, "/healthz");
        assert!(cfg.get_socket_addr().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[server]\nport = 9090\n\n[streaming]\nexpires_secs = 0").unwrap();

        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.streaming.expires_secs, 0);
        assert_eq!(StreamSettings::from(&cfg.streaming).expires_secs, 0);
    }
}
