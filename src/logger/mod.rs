//! Logger module
//!
//! Provides logging utilities for the streaming server including:
//! - Leveled diagnostic logging (debug/info/warn/error)
//! - Per-request decision logging for terminal response states
//! - Access logging with multiple formats
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Log severity, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup. An unknown level falls back to info.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse().unwrap_or(LogLevel::Info);
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        level,
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_debug(message: &str) {
    if writer::enabled(LogLevel::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_info(message: &str) {
    if writer::enabled(LogLevel::Info) {
        write_info(&format!("[INFO] {message}"));
    }
}

pub fn log_warning(message: &str) {
    if writer::enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

/// Log a terminal decision of the streaming state machine
///
/// Client-side outcomes (304) go to debug, refusals to warn.
pub fn log_decision(status: u16, id: &str, extension: &str, message: &str) {
    let line = format!("Response {status} for resource {id}.{extension}: {message}");
    if status < 400 {
        log_debug(&line);
    } else {
        log_warning(&line);
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Streaming server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    write_info(&format!("Storage root: {}", config.streaming.storage_root));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}
