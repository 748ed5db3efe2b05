mod file;
mod memory;

pub use file::*;
pub use memory::*;

use async_trait::async_trait;

use crate::domain::models::ChatError;

/// The two logical partitions of durable storage: a small settings partition
/// and a local partition holding the session registry. No transactions,
/// last-write-wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Partition {
    Settings,
    Local,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Settings => return "settings",
            Partition::Local => return "local",
        }
    }
}

/// Async get/set key-value storage, the contract the chat core holds durable
/// storage to. Values are opaque strings; callers own the encoding.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, partition: Partition, key: &str) -> Result<Option<String>, ChatError>;

    async fn set(&self, partition: Partition, key: &str, value: &str) -> Result<(), ChatError>;
}
