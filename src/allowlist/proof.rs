//! Off-chain proof verification and proof bundle export
//!
//! `verify_proof` mirrors what the sale contract does on-chain: fold the
//! sibling digests into the leaf with the sorted-pair rule and compare to
//! the committed root.

use crate::allowlist::hasher::{self, LEAF_TAG};
use crate::allowlist::{Allowlist, AllowlistEntry};
use crate::types::{hash_hex, Hash};
use serde::{Deserialize, Serialize};

/// Verify that `entry` is committed under `root`
pub fn verify_proof(root: &Hash, entry: &AllowlistEntry, proof: &[Hash]) -> bool {
    verify_leaf(root, &hasher::compute_leaf_hash(entry), proof)
}

/// Verify a precomputed leaf digest against `root`
pub fn verify_leaf(root: &Hash, leaf: &Hash, proof: &[Hash]) -> bool {
    let computed = proof
        .iter()
        .fold(*leaf, |acc, sibling| hasher::compute_pair_hash(&acc, sibling));
    &computed == root
}

/// Distributable JSON form of an allowlist: root plus every entry with its proof
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofBundle {
    pub leaf_encoding: String,
    pub root: String,
    pub entries: Vec<BundleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleEntry {
    #[serde(flatten)]
    pub entry: AllowlistEntry,
    pub proof: Vec<String>,
}

impl ProofBundle {
    pub fn from_allowlist(allowlist: &Allowlist) -> Self {
        let entries = allowlist
            .entries
            .iter()
            .map(|entry| BundleEntry {
                entry: entry.clone(),
                proof: allowlist
                    .proof(&entry.key())
                    .map(|path| path.iter().map(hash_hex).collect())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            leaf_encoding: String::from_utf8_lossy(LEAF_TAG).into_owned(),
            root: hash_hex(&allowlist.root),
            entries,
        }
    }
}
