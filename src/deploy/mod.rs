//! Content-addressed deployments
//!
//! A deployment's identity is the fingerprint of its code, resolved
//! constructor arguments and linked data, not its name. The resolver reuses
//! an existing instance when the fingerprint matches and deploys otherwise.

pub mod fingerprint;
pub mod resolver;

pub use fingerprint::compute_fingerprint;
pub use resolver::{DeploymentResolver, Resolution};

use crate::ledger::{Artifact, SignerSpec};
use crate::types::{serde_amount, serde_hash, Address, Amount, Hash, NetworkId};
use serde::{Deserialize, Serialize};

/// Constructor argument before dependency resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ConstructorArg {
    Address(Address),
    /// Address of another logical deployment on the same network
    Dependency(String),
    Uint(#[serde(with = "serde_amount")] Amount),
    Bytes32(#[serde(with = "serde_hash")] Hash),
    Bool(bool),
    String(String),
}

/// Everything needed to resolve one logical deployment
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub name: String,
    pub network: NetworkId,
    pub artifact: Artifact,
    pub signer: SignerSpec,
    pub args: Vec<ConstructorArg>,
    /// Payload bound into identity without being a constructor argument
    pub linked_data: serde_json::Value,
    /// Upstream deployments that must exist even if no argument names them
    pub dependencies: Vec<String>,
}

impl DeploymentRequest {
    pub fn new(name: impl Into<String>, network: impl Into<NetworkId>, artifact: Artifact) -> Self {
        Self {
            name: name.into(),
            network: network.into(),
            artifact,
            signer: SignerSpec::named("deployer"),
            args: Vec::new(),
            linked_data: serde_json::Value::Null,
            dependencies: Vec::new(),
        }
    }

    pub fn with_signer(mut self, signer: SignerSpec) -> Self {
        self.signer = signer;
        self
    }

    pub fn with_args(mut self, args: Vec<ConstructorArg>) -> Self {
        self.args = args;
        self
    }

    pub fn with_linked_data(mut self, linked_data: serde_json::Value) -> Self {
        self.linked_data = linked_data;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Every dependency name, from arguments first, then the explicit list
    pub fn dependency_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .args
            .iter()
            .filter_map(|arg| match arg {
                ConstructorArg::Dependency(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        for name in &self.dependencies {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }
}

/// What to do when the recorded fingerprint differs from the computed one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    #[default]
    Redeploy,
    Reject,
}
