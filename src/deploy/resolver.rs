//! Deployment resolver: reuse on fingerprint match, deploy otherwise

use crate::deploy::fingerprint::compute_fingerprint;
use crate::deploy::{ConstructorArg, DeploymentRequest, MismatchPolicy};
use crate::error::ApiError;
use crate::ledger::{Artifact, LedgerClient, Receipt, SignerSpec, Value};
use crate::store::{DeploymentRecord, DeploymentRegistry, ReceiptSummary};
use crate::types::{hash_hex, Address, Hash};
use chrono::Utc;
use tracing::{info, instrument, warn};

/// Outcome of resolving one logical deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub address: Address,
    pub newly_deployed: bool,
    pub fingerprint: Hash,
    /// Present only for a fresh deployment
    pub receipt: Option<Receipt>,
}

/// Resolves deployments against a registry, deploying through a ledger client
pub struct DeploymentResolver<'a> {
    ledger: &'a dyn LedgerClient,
    registry: &'a dyn DeploymentRegistry,
    policy: MismatchPolicy,
}

impl<'a> DeploymentResolver<'a> {
    pub fn new(ledger: &'a dyn LedgerClient, registry: &'a dyn DeploymentRegistry) -> Self {
        Self {
            ledger,
            registry,
            policy: MismatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MismatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Address of an upstream deployment, or `MissingDependency`
    pub fn dependency_address(&self, network: &str, name: &str) -> Result<Address, ApiError> {
        match self.registry.get(network, name)? {
            Some(record) => Ok(record.address),
            None => Err(ApiError::MissingDependency {
                name: name.to_string(),
                network: network.to_string(),
            }),
        }
    }

    /// Check every dependency and substitute addresses into the arguments
    pub fn resolve_args(&self, request: &DeploymentRequest) -> Result<Vec<Value>, ApiError> {
        for name in request.dependency_names() {
            self.dependency_address(&request.network, name)?;
        }

        request
            .args
            .iter()
            .map(|arg| {
                Ok(match arg {
                    ConstructorArg::Address(a) => Value::Address(*a),
                    ConstructorArg::Dependency(name) => {
                        Value::Address(self.dependency_address(&request.network, name)?)
                    }
                    ConstructorArg::Uint(n) => Value::Uint(*n),
                    ConstructorArg::Bytes32(h) => Value::Bytes32(*h),
                    ConstructorArg::Bool(b) => Value::Bool(*b),
                    ConstructorArg::String(s) => Value::String(s.clone()),
                })
            })
            .collect()
    }

    /// Fingerprint a request without touching the ledger
    pub fn fingerprint(&self, request: &DeploymentRequest) -> Result<Hash, ApiError> {
        let args = self.resolve_args(request)?;
        compute_fingerprint(&request.artifact, &args, &request.linked_data)
    }

    /// Reuse the recorded instance when fingerprints match, otherwise deploy
    ///
    /// Performs exactly one deployment transaction per distinct fingerprint
    /// and none on the reuse path.
    #[instrument(skip(self, request), fields(name = %request.name, network = %request.network))]
    pub async fn resolve(&self, request: &DeploymentRequest) -> Result<Resolution, ApiError> {
        let args = self.resolve_args(request)?;
        let fingerprint = compute_fingerprint(&request.artifact, &args, &request.linked_data)?;

        if let Some(existing) = self.registry.get(&request.network, &request.name)? {
            if existing.fingerprint == fingerprint {
                info!(address = %existing.address, "Reusing {} at {}", request.name, existing.address);
                return Ok(Resolution {
                    address: existing.address,
                    newly_deployed: false,
                    fingerprint,
                    receipt: None,
                });
            }

            match self.policy {
                MismatchPolicy::Reject => {
                    warn!(
                        recorded = %hash_hex(&existing.fingerprint),
                        computed = %hash_hex(&fingerprint),
                        "Fingerprint changed; redeploy rejected by policy"
                    );
                    return Err(ApiError::FingerprintMismatch {
                        name: request.name.clone(),
                        network: request.network.clone(),
                        recorded: hash_hex(&existing.fingerprint),
                        computed: hash_hex(&fingerprint),
                    });
                }
                MismatchPolicy::Redeploy => {
                    warn!(
                        previous = %existing.address,
                        recorded = %hash_hex(&existing.fingerprint),
                        computed = %hash_hex(&fingerprint),
                        "Fingerprint changed; redeploying"
                    );
                }
            }
        }

        let deployed = self
            .ledger
            .deploy(&request.name, &request.signer, &request.artifact, &args)
            .await?;

        let record = DeploymentRecord {
            name: request.name.clone(),
            network: request.network.clone(),
            artifact: request.artifact.name.clone(),
            fingerprint,
            address: deployed.address,
            deployed_at: Utc::now(),
            receipt: ReceiptSummary::from(&deployed.receipt),
        };
        self.registry.put(&record)?;

        info!(
            address = %deployed.address,
            tx = %deployed.receipt.tx_hash,
            gas_used = deployed.receipt.gas_used,
            "{} deployed at {} for gas {}",
            request.name,
            deployed.address,
            deployed.receipt.gas_used
        );

        Ok(Resolution {
            address: deployed.address,
            newly_deployed: true,
            fingerprint,
            receipt: Some(deployed.receipt),
        })
    }

    /// Address of a dependency, deploying a stand-in when allowed
    ///
    /// Stand-ins (fake oracles, fake stable assets) are only deployed when
    /// `allow_fallback` is set, which callers tie to non-live networks.
    pub async fn ensure_dependency(
        &self,
        network: &str,
        name: &str,
        fallback: Option<&Artifact>,
        signer: &SignerSpec,
        allow_fallback: bool,
    ) -> Result<Address, ApiError> {
        if let Some(record) = self.registry.get(network, name)? {
            return Ok(record.address);
        }

        match fallback {
            Some(artifact) if allow_fallback => {
                info!(dependency = name, artifact = %artifact.name, "Setting up a fallback {}", name);
                let request = DeploymentRequest::new(name, network, artifact.clone())
                    .with_signer(signer.clone());
                Ok(self.resolve(&request).await?.address)
            }
            _ => Err(ApiError::MissingDependency {
                name: name.to_string(),
                network: network.to_string(),
            }),
        }
    }
}
