//! Per-request resource metadata snapshot

use crate::http::mime;
use crate::store::Resource;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Immutable metadata of the resource being served
///
/// Built once per request from the store lookup result. `last_modified` is kept
/// in whole seconds since the epoch because HTTP dates carry no finer precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    pub id: String,
    pub file_extension: String,
    pub file_name: String,
    pub length: u64,
    pub last_modified: u64,
    pub content_type: String,
    pub etag: String,
}

impl ResourceInfo {
    pub fn new(id: &str, resource: &Resource) -> Self {
        let length = resource.size_in_bytes;
        let last_modified = resource
            .last_modified
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let file_extension = Path::new(&resource.filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(&resource.extension)
            .to_string();
        let content_type = mime::get_content_type(Some(&file_extension)).to_string();
        let etag = format!("{id}.{file_extension}_{length}_{last_modified}");

        Self {
            id: id.to_string(),
            file_extension,
            file_name: resource.filename.clone(),
            length,
            last_modified,
            content_type,
            etag,
        }
    }
}
