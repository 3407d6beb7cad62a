//! Request handler module
//!
//! Routing dispatch plus the streaming orchestrator that decides status,
//! headers and body for each stream request.

pub mod router;
pub mod stream;

// Re-export main entry point
pub use router::handle_request;
