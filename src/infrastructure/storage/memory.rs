use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::models::KeyValueStore;

/// Keeps everything in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Makes every following operation fail, the way a full or locked disk
    /// would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("Storage is unavailable");
        }

        return Ok(());
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    #[allow(clippy::implicit_return)]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        return Ok(self.entries.get(key).map(|value| {
            return value.to_string();
        }));
    }

    #[allow(clippy::implicit_return)]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_available()?;
        self.entries.insert(key.to_string(), value.to_string());
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn remove(&self, key: &str) -> Result<()> {
        self.check_available()?;
        self.entries.remove(key);
        return Ok(());
    }
}
