//! Access log format module
//!
//! Supported formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (one JSON object per line)
//!
//! Unknown format names fall back to `combined`.

use chrono::{DateTime, Local};
use serde_json::json;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Access log entry for one streamed request
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// HTTP version (1.0, 1.1, 2)
    pub http_version: String,
    pub status: u16,
    /// Declared body size (`Content-Length`, 0 when chunked or absent)
    pub body_bytes: u64,
    /// Raw `Range` request header, if any
    pub range: Option<String>,
    pub user_agent: Option<String>,
    /// Time until the response head was ready, in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            range: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "common" => self.format_common(),
            "json" => self.format_json(),
            _ => self.format_combined(),
        }
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.method,
            self.path,
            self.http_version,
            self.status,
            self.body_bytes,
        )
    }

    /// Common format plus range and user agent
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\" {:.3}",
            self.format_common(),
            self.range.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
            self.request_time_secs(),
        )
    }

    fn format_json(&self) -> String {
        json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "range": self.range,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    #[allow(clippy::cast_precision_loss)]
    fn request_time_secs(&self) -> f64 {
        self.request_time_us as f64 / 1_000_000.0
    }
}
