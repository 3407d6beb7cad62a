//! Resource lookup module
//!
//! The streaming core never touches storage directly. It asks a [`ResourceStore`]
//! to resolve an `id` + `extension` pair into a [`Resource`] and to open a
//! byte stream over it. Implementations must be shareable across requests.

mod fs;
mod memory;

pub use fs::FileSystemStore;
pub use memory::MemoryStore;

use std::io::{self, Read};
use std::time::SystemTime;
use thiserror::Error;

/// Metadata of a stored resource as reported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub extension: String,
    /// File name presented to clients (used for `Content-Disposition`)
    pub filename: String,
    pub size_in_bytes: u64,
    pub last_modified: SystemTime,
}

/// Store lookup failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource {id}.{extension} not found")]
    NotFound { id: String, extension: String },

    #[error("I/O error on resource {id}.{extension}: {source}")]
    Io {
        id: String,
        extension: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn not_found(id: &str, extension: &str) -> Self {
        Self::NotFound {
            id: id.to_string(),
            extension: extension.to_string(),
        }
    }

    pub fn io(id: &str, extension: &str, source: io::Error) -> Self {
        Self::Io {
            id: id.to_string(),
            extension: extension.to_string(),
            source,
        }
    }
}

/// Source of streamable resources
pub trait ResourceStore: Send + Sync {
    /// Resolve a resource by id and extension
    fn find(&self, id: &str, extension: &str) -> Result<Resource, StoreError>;

    /// Open a fresh byte stream positioned at the start of the resource
    fn open_stream(&self, resource: &Resource) -> Result<Box<dyn Read + Send>, StoreError>;
}
