//! HTTP protocol layer module
//!
//! Range parsing, conditional request evaluation, cache and content headers,
//! and response bodies. Nothing here touches storage.

pub mod body;
pub mod cache;
pub mod conditional;
pub mod date;
pub mod headers;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, requested_ranges, ByteRange, RangeParseResult};
pub use response::{
    build_404_response, build_405_response, build_500_response, build_error_response,
    build_health_response, build_options_response, build_response,
};
