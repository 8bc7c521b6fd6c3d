//! Property tests: every proof verifies, roots are deterministic

use converge::allowlist::{build_allowlist, verify_proof, AllowlistEntry};
use converge::deploy::compute_fingerprint;
use converge::ledger::{Artifact, Value};
use converge::types::Address;
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn entries_strategy() -> impl Strategy<Value = Vec<AllowlistEntry>> {
    btree_map(
        (any::<u8>(), -500i64..500, -500i64..500),
        (1u64..20, any::<u64>(), any::<[u8; 32]>()),
        1..40,
    )
    .prop_map(|parcels| {
        parcels
            .into_iter()
            .map(|((who, x, y), (size, price, salt))| {
                let mut bytes = [0u8; 20];
                bytes[19] = who;
                AllowlistEntry {
                    beneficiary: Address::from_bytes(bytes),
                    x,
                    y,
                    size,
                    price: u128::from(price),
                    reserved: None,
                    salt,
                }
            })
            .collect()
    })
}

/// Every entry's proof verifies against the root it was built with
#[test]
fn test_every_proof_verifies_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&entries_strategy(), |entries| {
            let allowlist = build_allowlist(&entries).unwrap();
            prop_assert!(allowlist.padded_leaves.is_power_of_two());
            prop_assert!(allowlist.padded_leaves >= entries.len());

            for entry in &entries {
                let proof = allowlist.proof(&entry.key()).unwrap();
                prop_assert!(verify_proof(&allowlist.root, entry, proof));
            }
            Ok(())
        })
        .unwrap();
}

/// Building twice from the same entries yields the same root
#[test]
fn test_root_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&entries_strategy(), |entries| {
            let first = build_allowlist(&entries).unwrap();
            let second = build_allowlist(&entries.clone()).unwrap();
            prop_assert_eq!(first.root, second.root);
            Ok(())
        })
        .unwrap();
}

/// A proof never verifies for an entry with a different price
#[test]
fn test_altered_entry_fails_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(entries_strategy(), any::<prop::sample::Index>()), |(entries, index)| {
            let allowlist = build_allowlist(&entries).unwrap();
            let original = &entries[index.index(entries.len())];
            let proof = allowlist.proof(&original.key()).unwrap();

            let mut altered = original.clone();
            altered.price = altered.price.wrapping_add(1);
            prop_assert!(!verify_proof(&allowlist.root, &altered, proof));
            Ok(())
        })
        .unwrap();
}

/// Fingerprints depend only on content
#[test]
fn test_fingerprint_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(any::<String>(), vec(any::<u64>(), 0..8), any::<u64>()),
            |(name, numbers, marker)| {
                let artifact = Artifact::named(name);
                let args: Vec<Value> = numbers.iter().map(|n| Value::Uint(u128::from(*n))).collect();
                let linked = serde_json::json!({ "marker": marker });

                let first = compute_fingerprint(&artifact, &args, &linked).unwrap();
                let second = compute_fingerprint(&artifact, &args, &linked).unwrap();
                prop_assert_eq!(first, second);

                let other = serde_json::json!({ "marker": marker.wrapping_add(1) });
                let changed = compute_fingerprint(&artifact, &args, &other).unwrap();
                prop_assert_ne!(first, changed);
                Ok(())
            },
        )
        .unwrap();
}
