//! Persistence layer for the deployment registry

use crate::error::StorageError;
use crate::store::{DeploymentRecord, DeploymentRegistry};
use std::path::Path;

const CURRENT_PREFIX: &str = "current/";
const HISTORY_PREFIX: &str = "history/";

/// Sled-based implementation of DeploymentRegistry
pub struct SledDeploymentRegistry {
    db: sled::Db,
}

fn current_key(network: &str, name: &str) -> String {
    format!("{}{}/{}", CURRENT_PREFIX, network, name)
}

fn history_prefix(network: &str, name: &str) -> String {
    format!("{}{}/{}/", HISTORY_PREFIX, network, name)
}

fn sled_error(context: &str, e: sled::Error) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("{}: {}", context, e),
    ))
}

fn decode(value: &[u8]) -> Result<DeploymentRecord, StorageError> {
    bincode::deserialize(value).map_err(|e| {
        StorageError::Serialization(format!("Failed to deserialize deployment record: {}", e))
    })
}

impl SledDeploymentRegistry {
    /// Open (or create) a registry database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| sled_error("Failed to open sled database", e))?;
        Ok(Self { db })
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| sled_error("Failed to flush database", e))?;
        Ok(())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<DeploymentRecord>, StorageError> {
        let mut records = Vec::new();
        for item in self.db.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item.map_err(|e| sled_error("Failed to iterate registry", e))?;
            records.push(decode(&value)?);
        }
        Ok(records)
    }
}

impl DeploymentRegistry for SledDeploymentRegistry {
    fn get(&self, network: &str, name: &str) -> Result<Option<DeploymentRecord>, StorageError> {
        match self
            .db
            .get(current_key(network, name).as_bytes())
            .map_err(|e| sled_error("Failed to get deployment record", e))?
        {
            Some(value) => Ok(Some(decode(&value)?)),
            None => Ok(None),
        }
    }

    fn put(&self, record: &DeploymentRecord) -> Result<(), StorageError> {
        let value = bincode::serialize(record).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize deployment record: {}", e))
        })?;

        // Zero-padded sequence keeps history keys in write order
        let prefix = history_prefix(&record.network, &record.name);
        let sequence = self.db.scan_prefix(prefix.as_bytes()).count();
        let history_key = format!("{}{:020}", prefix, sequence);

        let mut batch = sled::Batch::default();
        batch.insert(history_key.as_bytes(), value.clone());
        batch.insert(current_key(&record.network, &record.name).as_bytes(), value);

        self.db
            .apply_batch(batch)
            .map_err(|e| sled_error("Failed to store deployment record", e))?;
        self.flush()
    }

    fn history(&self, network: &str, name: &str) -> Result<Vec<DeploymentRecord>, StorageError> {
        self.scan(&history_prefix(network, name))
    }

    fn list(&self, network: &str) -> Result<Vec<DeploymentRecord>, StorageError> {
        let prefix = format!("{}{}/", CURRENT_PREFIX, network);
        self.scan(&prefix)
    }
}
