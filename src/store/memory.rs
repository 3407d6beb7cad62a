//! In-memory resource store, used for embedding and tests

use super::{Resource, ResourceStore, StoreError};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

#[derive(Debug, Clone)]
struct Entry {
    data: Arc<[u8]>,
    last_modified: SystemTime,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(String, String), Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a resource
    pub fn insert(
        &self,
        id: &str,
        extension: &str,
        data: impl Into<Vec<u8>>,
        last_modified: SystemTime,
    ) {
        let entry = Entry {
            data: Arc::from(data.into()),
            last_modified,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((id.to_string(), extension.to_string()), entry);
    }

    fn entry(&self, id: &str, extension: &str) -> Option<Entry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(id.to_string(), extension.to_string()))
            .cloned()
    }
}

impl ResourceStore for MemoryStore {
    fn find(&self, id: &str, extension: &str) -> Result<Resource, StoreError> {
        let entry = self
            .entry(id, extension)
            .ok_or_else(|| StoreError::not_found(id, extension))?;
        Ok(Resource {
            id: id.to_string(),
            extension: extension.to_string(),
            filename: format!("{id}.{extension}"),
            size_in_bytes: entry.data.len() as u64,
            last_modified: entry.last_modified,
        })
    }

    fn open_stream(&self, resource: &Resource) -> Result<Box<dyn Read + Send>, StoreError> {
        let entry = self
            .entry(&resource.id, &resource.extension)
            .ok_or_else(|| StoreError::not_found(&resource.id, &resource.extension))?;
        Ok(Box::new(Cursor::new(entry.data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_insert_and_read_back() {
        let store = MemoryStore::new();
        store.insert("a", "txt", "hello", SystemTime::now());
        let resource = store.find("a", "txt").unwrap();
        assert_eq!(resource.size_in_bytes, 5);
        assert_eq!(resource.filename, "a.txt");

        let mut text = String::new();
        store.open_stream(&resource).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello");
        assert!(matches!(store.find("a", "mp4"), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_poisoned_lock_still_stores() {
        let store = Arc::new(MemoryStore::new());
        let poisoner = Arc::clone(&store);
        let result = std::thread::spawn(move || {
            let _guard = poisoner.entries.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());
        assert!(store.entries.is_poisoned());

        store.insert("b", "bin", vec![1, 2, 3], SystemTime::now());
        assert_eq!(store.find("b", "bin").unwrap().size_in_bytes, 3);
    }
}
