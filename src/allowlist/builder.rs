//! Allowlist tree builder

use crate::allowlist::hasher::{self, SortedPairHasher, PADDING_LEAF};
use crate::allowlist::{AllowlistEntry, EntryKey};
use crate::error::AllowlistError;
use crate::types::Hash;
use rs_merkle::MerkleTree;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Sibling digests from leaf to root
pub type ProofPath = Vec<Hash>;

/// A finalized allowlist: root, the entries it commits to, and one proof per entry
#[derive(Debug, Clone)]
pub struct Allowlist {
    pub root: Hash,
    pub entries: Vec<AllowlistEntry>,
    pub proofs: BTreeMap<EntryKey, ProofPath>,
    /// Leaf count after padding
    pub padded_leaves: usize,
}

impl Allowlist {
    pub fn proof(&self, key: &EntryKey) -> Option<&ProofPath> {
        self.proofs.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for allowlist Merkle trees
pub struct AllowlistBuilder {
    entries: Vec<AllowlistEntry>,
}

impl AllowlistBuilder {
    pub fn new(entries: Vec<AllowlistEntry>) -> Self {
        Self { entries }
    }

    /// Build the tree bottom-up
    ///
    /// Leaves keep input order; the leaf layer is padded with `PADDING_LEAF`
    /// up to the next power of two. Fails on an empty set or a duplicate
    /// (beneficiary, x, y) key.
    #[instrument(skip(self), fields(entries = self.entries.len()))]
    pub fn build(self) -> Result<Allowlist, AllowlistError> {
        let start = Instant::now();

        if self.entries.is_empty() {
            warn!("Refusing to build an empty allowlist");
            return Err(AllowlistError::Empty);
        }

        // Step 1: reject duplicate keys
        let mut seen = BTreeMap::new();
        for (index, entry) in self.entries.iter().enumerate() {
            if let Some(previous) = seen.insert(entry.key(), index) {
                warn!(first = previous, duplicate = index, key = %entry.key(), "Duplicate allowlist entry");
                return Err(AllowlistError::DuplicateEntry {
                    beneficiary: entry.beneficiary.canonical(),
                    x: entry.x,
                    y: entry.y,
                });
            }
        }

        // Step 2: hash leaves and pad
        let mut leaves: Vec<Hash> = self.entries.iter().map(hasher::compute_leaf_hash).collect();
        let padded_leaves = leaves.len().next_power_of_two();
        leaves.resize(padded_leaves, PADDING_LEAF);
        debug!(leaves = self.entries.len(), padded_leaves, "Hashed allowlist leaves");

        // Step 3: build tree and collect proofs
        let (root, proofs) = if padded_leaves == 1 {
            let mut proofs = BTreeMap::new();
            proofs.insert(self.entries[0].key(), Vec::new());
            (leaves[0], proofs)
        } else {
            let tree = MerkleTree::<SortedPairHasher>::from_leaves(&leaves);
            let root = tree.root().ok_or(AllowlistError::Empty)?;
            let proofs = self
                .entries
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    let path = tree.proof(&[index]).proof_hashes().to_vec();
                    (entry.key(), path)
                })
                .collect();
            (root, proofs)
        };

        info!(
            root = %hex::encode(root),
            entries = self.entries.len(),
            padded_leaves,
            duration_ms = start.elapsed().as_millis(),
            "Allowlist build completed"
        );

        Ok(Allowlist {
            root,
            entries: self.entries,
            proofs,
            padded_leaves,
        })
    }
}

/// Build an allowlist from entries in their given order
pub fn build_allowlist(entries: &[AllowlistEntry]) -> Result<Allowlist, AllowlistError> {
    AllowlistBuilder::new(entries.to_vec()).build()
}
