//! Shared primitive types: digests, account addresses, amounts.
//!
//! `Address` is the single place where address text is normalized. Every
//! comparison in the crate goes through its canonical lowercase form, so
//! two spellings of the same account that differ only in letter case are
//! the same value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 32-byte BLAKE3 digest
pub type Hash = [u8; 32];

/// Chain identifier as configured (e.g. "1", "4", "31337")
pub type NetworkId = String;

/// Native or token amount in the smallest unit
pub type Amount = u128;

/// Error produced when parsing primitive values from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid address '{0}': expected 0x followed by 40 hex characters")]
    Address(String),

    #[error("invalid 32-byte hex value '{0}'")]
    Hash(String),

    #[error("invalid decimal amount '{0}'")]
    Amount(String),
}

/// 20-byte account or contract address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address, used as the "no reservation" sentinel
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Canonical text form: `0x` + 40 lowercase hex characters
    pub fn canonical(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ParseError::Address(s.to_string()))?;
        if body.len() != 40 {
            return Err(ParseError::Address(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body.to_ascii_lowercase(), &mut bytes)
            .map_err(|_| ParseError::Address(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.canonical())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a 32-byte value from `0x`-prefixed (or bare) hex
pub fn parse_hash(s: &str) -> Result<Hash, ParseError> {
    let body = s.trim().trim_start_matches("0x");
    let mut out = [0u8; 32];
    hex::decode_to_slice(body, &mut out).map_err(|_| ParseError::Hash(s.to_string()))?;
    Ok(out)
}

/// Render a digest as `0x`-prefixed lowercase hex
pub fn hash_hex(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parse a non-negative integer amount written in decimal
pub fn parse_amount(s: &str) -> Result<Amount, ParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::Amount(s.to_string()));
    }
    trimmed
        .parse::<Amount>()
        .map_err(|_| ParseError::Amount(s.to_string()))
}

/// Serde adapter: amounts as decimal strings (JSON consumers lose precision on large numbers)
pub mod serde_amount {
    use super::{parse_amount, Amount};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_amount(&text).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: 32-byte values as `0x` hex strings
pub mod serde_hash {
    use super::{hash_hex, parse_hash, Hash};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hash_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_hash(&text).map_err(serde::de::Error::custom)
    }
}
