#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::path;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::KvStore;
use super::Partition;
use crate::domain::models::ChatError;

/// Key-value storage backed by one YAML file per partition.
pub struct FileStore {
    pub dir: path::PathBuf,
}

impl Default for FileStore {
    fn default() -> FileStore {
        let dir = dirs::data_dir().unwrap().join("pagepal/storage");

        return FileStore::new(dir);
    }
}

impl FileStore {
    pub fn new(dir: path::PathBuf) -> FileStore {
        return FileStore { dir };
    }

    fn partition_path(&self, partition: Partition) -> path::PathBuf {
        return self.dir.join(format!("{}.yaml", partition.as_str()));
    }

    async fn read_partition(
        &self,
        partition: Partition,
    ) -> Result<BTreeMap<String, String>, ChatError> {
        let file_path = self.partition_path(partition);
        if !file_path.exists() {
            return Ok(BTreeMap::new());
        }

        let payload = fs::read_to_string(file_path)
            .await
            .map_err(|err| return ChatError::Storage(err.to_string()))?;
        let entries = serde_yaml::from_str::<BTreeMap<String, String>>(&payload)
            .map_err(|err| return ChatError::Storage(err.to_string()))?;

        return Ok(entries);
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, partition: Partition, key: &str) -> Result<Option<String>, ChatError> {
        let entries = self.read_partition(partition).await?;
        return Ok(entries.get(key).cloned());
    }

    async fn set(&self, partition: Partition, key: &str, value: &str) -> Result<(), ChatError> {
        let mut entries = self.read_partition(partition).await?;
        entries.insert(key.to_string(), value.to_string());

        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .await
                .map_err(|err| return ChatError::Storage(err.to_string()))?;
        }

        let payload = serde_yaml::to_string(&entries)
            .map_err(|err| return ChatError::Storage(err.to_string()))?;

        let mut file = fs::File::create(self.partition_path(partition))
            .await
            .map_err(|err| return ChatError::Storage(err.to_string()))?;
        file.write_all(payload.as_bytes())
            .await
            .map_err(|err| return ChatError::Storage(err.to_string()))?;

        return Ok(());
    }
}
