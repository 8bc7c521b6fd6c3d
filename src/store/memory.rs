//! In-memory deployment registry for dry runs and tests

use crate::error::StorageError;
use crate::store::{DeploymentRecord, DeploymentRegistry};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Registry held in process memory; the last record per key is current
#[derive(Default)]
pub struct MemoryDeploymentRegistry {
    records: RwLock<BTreeMap<(String, String), Vec<DeploymentRecord>>>,
}

impl MemoryDeploymentRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeploymentRegistry for MemoryDeploymentRegistry {
    fn get(&self, network: &str, name: &str) -> Result<Option<DeploymentRecord>, StorageError> {
        Ok(self
            .records
            .read()
            .get(&(network.to_string(), name.to_string()))
            .and_then(|history| history.last().cloned()))
    }

    fn put(&self, record: &DeploymentRecord) -> Result<(), StorageError> {
        self.records
            .write()
            .entry((record.network.clone(), record.name.clone()))
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn history(&self, network: &str, name: &str) -> Result<Vec<DeploymentRecord>, StorageError> {
        Ok(self
            .records
            .read()
            .get(&(network.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn list(&self, network: &str) -> Result<Vec<DeploymentRecord>, StorageError> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|((net, _), _)| net == network)
            .filter_map(|(_, history)| history.last().cloned())
            .collect())
    }
}
