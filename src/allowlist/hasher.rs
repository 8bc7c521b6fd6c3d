//! Leaf and node hashing for allowlist trees using BLAKE3
//!
//! The leaf encoding is versioned: any change to field order or widths must
//! bump `LEAF_TAG`, since it changes every root.

use crate::allowlist::AllowlistEntry;
use crate::types::{Address, Hash};
use blake3::Hasher;

/// Domain tag for leaf hashes
pub const LEAF_TAG: &[u8] = b"allowlist-leaf:v1";

/// Domain tag for internal node hashes
pub const NODE_TAG: &[u8] = b"allowlist-node:v1";

/// Filler leaf used to pad the leaf layer to a power of two
pub const PADDING_LEAF: Hash = [0u8; 32];

/// Compute the leaf hash of an entry
///
/// Leaf = hash(LEAF_TAG || beneficiary || x || y || size || price || reserved || salt)
///
/// Integers are big-endian at fixed width (i64, i64, u64, u128). A missing
/// reservation is encoded as the zero address.
pub fn compute_leaf_hash(entry: &AllowlistEntry) -> Hash {
    let mut hasher = Hasher::new();

    hasher.update(LEAF_TAG);
    hasher.update(entry.beneficiary.as_bytes());
    hasher.update(&entry.x.to_be_bytes());
    hasher.update(&entry.y.to_be_bytes());
    hasher.update(&entry.size.to_be_bytes());
    hasher.update(&entry.price.to_be_bytes());
    hasher.update(entry.reserved.unwrap_or(Address::ZERO).as_bytes());
    hasher.update(&entry.salt);

    *hasher.finalize().as_bytes()
}

/// Compute the parent of two sibling digests
///
/// The pair is sorted before concatenation, so the result does not depend
/// on which side each child sits.
pub fn compute_pair_hash(a: &Hash, b: &Hash) -> Hash {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };

    let mut hasher = Hasher::new();
    hasher.update(NODE_TAG);
    hasher.update(low);
    hasher.update(high);
    *hasher.finalize().as_bytes()
}

/// rs_merkle hasher with the sorted-pair node rule
#[derive(Clone)]
pub struct SortedPairHasher;

impl rs_merkle::Hasher for SortedPairHasher {
    type Hash = Hash;

    fn hash(data: &[u8]) -> Hash {
        *blake3::hash(data).as_bytes()
    }

    fn concat_and_hash(left: &Hash, right: Option<&Hash>) -> Hash {
        match right {
            Some(right) => compute_pair_hash(left, right),
            // Trees are padded to a power of two; a lone node only occurs at the root.
            None => *left,
        }
    }

    fn hash_size() -> usize {
        32
    }
}
