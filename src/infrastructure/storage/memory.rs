use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::KvStore;
use super::Partition;
use crate::domain::models::ChatError;

/// In-memory key-value storage for tests and ephemeral runs. Nothing survives
/// the process. Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<(Partition, String), String>>,
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, partition: Partition, key: &str) -> Result<Option<String>, ChatError> {
        let value = self
            .entries
            .get(&(partition, key.to_string()))
            .map(|entry| return entry.value().to_string());

        return Ok(value);
    }

    async fn set(&self, partition: Partition, key: &str, value: &str) -> Result<(), ChatError> {
        self.entries
            .insert((partition, key.to_string()), value.to_string());

        return Ok(());
    }
}
