//! Test doubles shared by unit and integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::migrate::{ObjectStore, ObjectStoreError};

/// In-memory object store with per-key failure injection.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object so later copies from its key succeed.
    pub fn put(&self, key: &str, content: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), content.to_vec());
    }

    /// Make every copy or delete touching `key` fail.
    pub fn fail_key(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn check_failure(&self, key: &str) -> Result<(), ObjectStoreError> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(ObjectStoreError::Io(format!("injected failure for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        self.check_failure(from)?;
        self.check_failure(to)?;
        let mut objects = self.objects.lock().unwrap();
        let content = objects
            .get(from)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(from.to_string()))?;
        objects.insert(to.to_string(), content);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.check_failure(key)?;
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }
}
