//! Range-aware resource streaming server
//!
//! Serves stored resources over HTTP with byte-range (`206`/`multipart/byteranges`),
//! conditional (`304`/`412`) and cache-control semantics.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod resource;
pub mod server;
pub mod store;
pub mod streaming;
