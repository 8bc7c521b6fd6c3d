//! Ledger Client Abstraction
//!
//! The remote ledger is an external collaborator. Contracts are addressed by
//! logical name; encoding, gas and broadcast are the client's business.
//! Every call is one blocking round trip from the caller's point of view.

pub mod gateway;

pub use gateway::GatewayLedgerClient;

use crate::error::LedgerError;
use crate::types::{serde_amount, serde_hash, Address, Amount, Hash};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Typed argument or return value of a contract call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Address(Address),
    AddressList(Vec<Address>),
    Uint(#[serde(with = "serde_amount")] Amount),
    Bytes32(#[serde(with = "serde_hash")] Hash),
    String(String),
}

impl Value {
    pub fn as_bool(&self, contract: &str, function: &str) -> Result<bool, LedgerError> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(unexpected(contract, function, "bool")),
        }
    }

    pub fn as_address(&self, contract: &str, function: &str) -> Result<Address, LedgerError> {
        match self {
            Value::Address(a) => Ok(*a),
            _ => Err(unexpected(contract, function, "address")),
        }
    }

    pub fn as_address_list(
        &self,
        contract: &str,
        function: &str,
    ) -> Result<Vec<Address>, LedgerError> {
        match self {
            Value::AddressList(list) => Ok(list.clone()),
            _ => Err(unexpected(contract, function, "address list")),
        }
    }

    pub fn as_uint(&self, contract: &str, function: &str) -> Result<Amount, LedgerError> {
        match self {
            Value::Uint(n) => Ok(*n),
            _ => Err(unexpected(contract, function, "uint")),
        }
    }
}

fn unexpected(contract: &str, function: &str, expected: &'static str) -> LedgerError {
    LedgerError::UnexpectedValue {
        contract: contract.to_string(),
        function: function.to_string(),
        expected,
    }
}

/// Who signs a write: a named account known to the ledger client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSpec {
    pub from: String,
    /// Let the client skip the call when it holds no key for `from`
    #[serde(default)]
    pub skip_unknown_signer: bool,
}

impl SignerSpec {
    pub fn named(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            skip_unknown_signer: false,
        }
    }
}

/// Confirmed transaction summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
}

/// Code identity of a deployable contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    /// BLAKE3 of the creation bytecode, when the bytecode is available locally
    #[serde(default)]
    pub bytecode_digest: Option<String>,
}

impl Artifact {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytecode_digest: None,
        }
    }

    pub fn from_bytecode(name: impl Into<String>, bytecode: &[u8]) -> Self {
        Self {
            name: name.into(),
            bytecode_digest: Some(blake3::hash(bytecode).to_hex().to_string()),
        }
    }
}

/// Result of a confirmed deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub address: Address,
    pub receipt: Receipt,
}

/// Ledger client interface
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Call a view function
    async fn read(&self, contract: &str, function: &str, args: &[Value])
        -> Result<Value, LedgerError>;

    /// Send a state-changing call and wait for its receipt
    async fn execute(
        &self,
        contract: &str,
        signer: &SignerSpec,
        function: &str,
        args: &[Value],
    ) -> Result<Receipt, LedgerError>;

    /// Deploy `artifact` under logical `name` and wait for confirmation
    async fn deploy(
        &self,
        name: &str,
        signer: &SignerSpec,
        artifact: &Artifact,
        args: &[Value],
    ) -> Result<DeployedContract, LedgerError>;

    /// Send native currency
    async fn raw_transfer(
        &self,
        to: &Address,
        from: &SignerSpec,
        amount: Amount,
    ) -> Result<Receipt, LedgerError>;

    /// Native currency balance of an address
    async fn native_balance(&self, address: &Address) -> Result<Amount, LedgerError>;
}
