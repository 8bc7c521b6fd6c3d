//! Sale Allowlist
//!
//! Admitted (beneficiary, parcel, price) tuples committed offline into a
//! Merkle root. The sale contract stores only the root; purchasers present
//! their entry together with a proof path.

pub mod builder;
pub mod hasher;
pub mod proof;

pub use builder::{build_allowlist, Allowlist, AllowlistBuilder, ProofPath};
pub use proof::{verify_proof, ProofBundle};

use crate::error::{AllowlistError, ApiError};
use crate::types::{parse_amount, parse_hash, serde_amount, serde_hash, Address, Amount, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One admitted purchase: who may buy which parcel at what price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowlistEntry {
    pub beneficiary: Address,
    pub x: i64,
    pub y: i64,
    pub size: u64,
    #[serde(with = "serde_amount")]
    pub price: Amount,
    pub reserved: Option<Address>,
    #[serde(with = "serde_hash")]
    pub salt: Hash,
}

/// Composite uniqueness key of an entry within one sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    pub beneficiary: Address,
    pub x: i64,
    pub y: i64,
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@({},{})", self.beneficiary, self.x, self.y)
    }
}

/// Raw allowlist record as prepared upstream
///
/// Parcel overlap is not checked here; data preparation owns that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowlistInput {
    #[serde(default)]
    pub beneficiary: Option<String>,
    pub x: i64,
    pub y: i64,
    pub size: i64,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub reserved: Option<String>,
    pub salt: String,
}

impl AllowlistEntry {
    pub fn key(&self) -> EntryKey {
        EntryKey {
            beneficiary: self.beneficiary,
            x: self.x,
            y: self.y,
        }
    }

    /// Validate and convert a raw record
    ///
    /// `index` is only used for error messages. An absent beneficiary falls
    /// back to `default_beneficiary`; an empty `reserved` string means no
    /// reservation.
    pub fn from_input(
        index: usize,
        input: &AllowlistInput,
        default_beneficiary: Option<Address>,
    ) -> Result<Self, AllowlistError> {
        let invalid = |source| AllowlistError::InvalidField { index, source };

        let beneficiary = match input.beneficiary.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.parse().map_err(invalid)?,
            _ => default_beneficiary.ok_or(AllowlistError::MissingBeneficiary { index })?,
        };

        if input.size <= 0 {
            return Err(AllowlistError::NonPositiveSize {
                index,
                size: input.size,
            });
        }

        let price = match input.price.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => parse_amount(text).map_err(invalid)?,
            _ => return Err(AllowlistError::MissingPrice { index }),
        };

        let reserved = match input.reserved.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(text.parse().map_err(invalid)?),
            _ => None,
        };

        let salt = parse_hash(&input.salt).map_err(invalid)?;

        Ok(Self {
            beneficiary,
            x: input.x,
            y: input.y,
            size: input.size as u64,
            price,
            reserved,
            salt,
        })
    }
}

/// Convert every raw record, stopping at the first invalid one
pub fn entries_from_inputs(
    inputs: &[AllowlistInput],
    default_beneficiary: Option<Address>,
) -> Result<Vec<AllowlistEntry>, AllowlistError> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| AllowlistEntry::from_input(index, input, default_beneficiary))
        .collect()
}

/// Load raw records from a JSON array file
pub fn load_inputs(path: &Path) -> Result<Vec<AllowlistInput>, ApiError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ApiError::ConfigError(format!("Failed to read allowlist {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        ApiError::ConfigError(format!("Failed to parse allowlist {}: {}", path.display(), e))
    })
}
