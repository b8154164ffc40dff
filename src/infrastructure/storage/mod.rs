pub mod file;
pub mod memory;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use strum::EnumVariantNames;

use crate::domain::models::SharedKeyValueStore;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StorageName {
    File,
    Memory,
}

impl StorageName {
    pub fn parse(text: String) -> Option<StorageName> {
        return match text.as_str() {
            "file" => Some(StorageName::File),
            "memory" => Some(StorageName::Memory),
            _ => None,
        };
    }
}

pub struct StorageManager {}

impl StorageManager {
    pub fn get(name: &str) -> Result<SharedKeyValueStore> {
        match StorageName::parse(name.to_string()) {
            Some(StorageName::File) => return Ok(Arc::new(file::FileStore::default())),
            Some(StorageName::Memory) => return Ok(Arc::new(memory::MemoryStore::default())),
            None => bail!(format!("No storage implemented for {name}")),
        }
    }
}
