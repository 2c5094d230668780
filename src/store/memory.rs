//! In-process counter store.
//!
//! Backs development runs and tests; production deployments use
//! [`RedisStore`](super::RedisStore).

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;

use super::CounterStore;

enum Entry {
    Hash(BTreeMap<String, u64>),
    Value(String),
}

/// Counter store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a plain string value (e.g. a file-to-video mapping).
    pub async fn put_string(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), Entry::Value(value.to_string()));
    }

    /// Seed a hash field directly, replacing any existing value.
    pub async fn put_field(&self, key: &str, field: &str, amount: u64) {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(BTreeMap::new()));
        if let Entry::Hash(hash) = entry {
            hash.insert(field.to_string(), amount);
        }
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &str, field: &str, amount: u64) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(BTreeMap::new()));
        if let Entry::Hash(hash) = entry {
            *hash.entry(field.to_string()).or_insert(0) += amount;
        }
        Ok(())
    }

    async fn read_field(&self, key: &str, field: &str) -> Result<Option<u64>> {
        let entries = self.entries.lock().await;
        Ok(match entries.get(key) {
            Some(Entry::Hash(hash)) => hash.get(field).copied(),
            _ => None,
        })
    }

    async fn read_counter(&self, key: &str) -> Result<BTreeMap<String, u64>> {
        let entries = self.entries.lock().await;
        Ok(match entries.get(key) {
            Some(Entry::Hash(hash)) => hash.clone(),
            _ => BTreeMap::new(),
        })
    }

    async fn delete_field(&self, key: &str, field: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        Ok(match entries.get_mut(key) {
            Some(Entry::Hash(hash)) => hash.remove(field).is_some(),
            _ => false,
        })
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
        let entries = self.entries.lock().await;
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn read_string(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(match entries.get(key) {
            Some(Entry::Value(value)) => Some(value.clone()),
            _ => None,
        })
    }
}
