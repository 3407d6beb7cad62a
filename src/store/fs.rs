//! Filesystem-backed resource store
//!
//! Resolves `<root>/<id>.<extension>`.

use super::{Resource, ResourceStore, StoreError};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the on-disk path, refusing anything that could escape the root
    fn resolve(&self, id: &str, extension: &str) -> Option<PathBuf> {
        let is_safe = |segment: &str| {
            !segment.is_empty()
                && !segment.contains("..")
                && !segment.contains(['/', '\\', '\0'])
        };
        if !is_safe(id) || !is_safe(extension) {
            return None;
        }
        Some(self.root.join(format!("{id}.{extension}")))
    }
}

impl ResourceStore for FileSystemStore {
    fn find(&self, id: &str, extension: &str) -> Result<Resource, StoreError> {
        let Some(path) = self.resolve(id, extension) else {
            return Err(StoreError::not_found(id, extension));
        };

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(id, extension));
            }
            Err(e) => return Err(StoreError::io(id, extension, e)),
        };
        if !metadata.is_file() {
            return Err(StoreError::not_found(id, extension));
        }

        let last_modified = metadata
            .modified()
            .map_err(|e| StoreError::io(id, extension, e))?;

        Ok(Resource {
            id: id.to_string(),
            extension: extension.to_string(),
            filename: format!("{id}.{extension}"),
            size_in_bytes: metadata.len(),
            last_modified,
        })
    }

    fn open_stream(&self, resource: &Resource) -> Result<Box<dyn Read + Send>, StoreError> {
        let path = self
            .resolve(&resource.id, &resource.extension)
            .ok_or_else(|| StoreError::not_found(&resource.id, &resource.extension))?;
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::not_found(&resource.id, &resource.extension),
            _ => StoreError::io(&resource.id, &resource.extension, e),
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store_with(name: &str, content: &[u8]) -> (tempfile::TempDir, FileSystemStore) {
        let dir = tempfile::tempdir().unwrap();
        let mut f = File::create(dir.path().join(name)).unwrap();
        f.write_all(content).unwrap();
        let store = FileSystemStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_find_existing() {
        let (_dir, store) = store_with("clip.mp4", b"0123456789");
        let resource = store.find("clip", "mp4").unwrap();
        assert_eq!(resource.size_in_bytes, 10);
        assert_eq!(resource.filename, "clip.mp4");
    }

    #[test]
    fn test_find_missing() {
        let (_dir, store) = store_with("clip.mp4", b"x");
        assert!(matches!(
            store.find("other", "mp4"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, store) = store_with("clip.mp4", b"x");
        assert!(matches!(
            store.find("../clip", "mp4"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.find("a/b", "mp4"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_open_stream_reads_content() {
        let (_dir, store) = store_with("notes.txt", b"hello");
        let resource = store.find("notes", "txt").unwrap();
        let mut out = String::new();
        store
            .open_stream(&resource)
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "hello");
    }
}
