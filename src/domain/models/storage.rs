use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Durable string key/value persistence. Keys are namespaced by the caller.
#[async_trait]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a key that doesn't exist is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

pub type SharedKeyValueStore = Arc<dyn KeyValueStore + Send + Sync>;
