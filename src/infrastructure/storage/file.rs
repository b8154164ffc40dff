#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::KeyValueStore;

/// Stores every key as its own JSON file inside a directory.
pub struct FileStore {
    pub dir: path::PathBuf,
}

impl Default for FileStore {
    fn default() -> FileStore {
        return FileStore::new(path::PathBuf::from(Config::get(ConfigKey::StorageDir)));
    }
}

impl FileStore {
    pub fn new(dir: path::PathBuf) -> FileStore {
        return FileStore { dir };
    }

    /// Keys map to a single file name inside `dir`. Path separators in a key
    /// are escaped so a key can never point outside the directory.
    fn get_file_path(&self, key: &str) -> path::PathBuf {
        let file_name = key
            .chars()
            .map(|ch| {
                return match ch {
                    ':' => "__".to_string(),
                    '%' => "%25".to_string(),
                    '/' => "%2F".to_string(),
                    '\\' => "%5C".to_string(),
                    _ => ch.to_string(),
                };
            })
            .collect::<String>();

        return self.dir.join(format!("{file_name}.json"));
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    #[allow(clippy::implicit_return)]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let file_path = self.get_file_path(key);
        if !file_path.exists() {
            return Ok(None);
        }

        let payload = fs::read_to_string(file_path).await?;
        return Ok(Some(payload));
    }

    #[allow(clippy::implicit_return)]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
        }

        // Replaced atomically via rename.
        let file_path = self.get_file_path(key);
        let tmp_path = file_path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&tmp_path, &file_path).await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn remove(&self, key: &str) -> Result<()> {
        let file_path = self.get_file_path(key);
        if !file_path.exists() {
            return Ok(());
        }

        fs::remove_file(file_path).await?;
        return Ok(());
    }
}
