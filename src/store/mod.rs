//! Deployment Registry
//!
//! Maps (network, logical name) to the current deployment record. Records
//! are immutable once written; a superseding deployment becomes the new
//! current record and the previous one stays in the history. Nothing is
//! ever deleted.

pub mod memory;
pub mod persistence;

pub use memory::MemoryDeploymentRegistry;
pub use persistence::SledDeploymentRegistry;

use crate::error::StorageError;
use crate::ledger::Receipt;
use crate::types::{serde_hash, Address, Hash, NetworkId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction summary kept with a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSummary {
    pub tx_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
}

impl From<&Receipt> for ReceiptSummary {
    fn from(receipt: &Receipt) -> Self {
        Self {
            tx_hash: receipt.tx_hash.clone(),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        }
    }
}

/// DeploymentRecord: one confirmed deployment of a logical component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub name: String,
    pub network: NetworkId,
    pub artifact: String,
    #[serde(with = "serde_hash")]
    pub fingerprint: Hash,
    pub address: Address,
    pub deployed_at: DateTime<Utc>,
    pub receipt: ReceiptSummary,
}

/// Deployment registry interface
pub trait DeploymentRegistry: Send + Sync {
    /// Current record for a logical name on a network
    fn get(&self, network: &str, name: &str) -> Result<Option<DeploymentRecord>, StorageError>;

    /// Append a record and make it current for its (network, name)
    fn put(&self, record: &DeploymentRecord) -> Result<(), StorageError>;

    /// Every record ever written for (network, name), oldest first
    fn history(&self, network: &str, name: &str) -> Result<Vec<DeploymentRecord>, StorageError>;

    /// Current records on a network, ordered by name
    fn list(&self, network: &str) -> Result<Vec<DeploymentRecord>, StorageError>;
}

/// Look up a current record, failing when absent
pub fn require(
    registry: &dyn DeploymentRegistry,
    network: &str,
    name: &str,
) -> Result<DeploymentRecord, StorageError> {
    registry
        .get(network, name)?
        .ok_or_else(|| StorageError::RecordNotFound {
            name: name.to_string(),
            network: network.to_string(),
        })
}
