//! Allowlist tests against the land presale fixture

use crate::integration::test_utils::{fixture_beneficiary, fixture_entries, fixture_inputs};
use converge::allowlist::{
    build_allowlist, entries_from_inputs, verify_proof, AllowlistBuilder, EntryKey, ProofBundle,
};
use converge::error::AllowlistError;
use converge::types::hash_hex;

fn key_at(x: i64, y: i64) -> EntryKey {
    EntryKey {
        beneficiary: fixture_beneficiary(),
        x,
        y,
    }
}

#[test]
fn test_fixture_root_is_deterministic() {
    let first = build_allowlist(&fixture_entries()).unwrap();
    let second = build_allowlist(&fixture_entries()).unwrap();
    assert_eq!(first.root, second.root);
    assert_eq!(first.len(), 6);
    assert_eq!(first.padded_leaves, 8);
}

#[test]
fn test_every_fixture_proof_verifies() {
    let allowlist = build_allowlist(&fixture_entries()).unwrap();
    for entry in &allowlist.entries {
        let proof = allowlist.proof(&entry.key()).unwrap();
        assert_eq!(proof.len(), 3);
        assert!(verify_proof(&allowlist.root, entry, proof), "{}", entry.key());
    }
}

#[test]
fn test_parcel_36_114_proof_fails_against_root_without_it() {
    let entries = fixture_entries();
    let full = build_allowlist(&entries).unwrap();

    let target = entries.iter().find(|e| e.x == 36 && e.y == 114).unwrap().clone();
    let proof = full.proof(&key_at(36, 114)).unwrap().clone();
    assert!(verify_proof(&full.root, &target, &proof));

    let without: Vec<_> = entries.into_iter().filter(|e| e.key() != target.key()).collect();
    let reduced = build_allowlist(&without).unwrap();
    assert_ne!(reduced.root, full.root);
    assert!(!verify_proof(&reduced.root, &target, &proof));
}

#[test]
fn test_changed_price_changes_root_and_breaks_old_proof() {
    let entries = fixture_entries();
    let original = build_allowlist(&entries).unwrap();

    let mut changed = entries.clone();
    changed[3].price += 1;
    let rebuilt = build_allowlist(&changed).unwrap();
    assert_ne!(original.root, rebuilt.root);

    let old_proof = original.proof(&key_at(36, 114)).unwrap();
    assert!(!verify_proof(&original.root, &changed[3], old_proof));
}

#[test]
fn test_empty_reserved_means_unreserved() {
    let entries = fixture_entries();
    assert!(entries.iter().all(|e| e.reserved.is_none()));
    assert!(entries.iter().all(|e| e.beneficiary == fixture_beneficiary()));
}

#[test]
fn test_missing_beneficiary_without_default_rejected() {
    let err = entries_from_inputs(&fixture_inputs(), None).unwrap_err();
    assert_eq!(err, AllowlistError::MissingBeneficiary { index: 0 });
}

#[test]
fn test_duplicate_parcel_for_same_beneficiary_rejected() {
    let mut entries = fixture_entries();
    let mut duplicate = entries[0].clone();
    duplicate.price = 1;
    entries.push(duplicate);
    assert!(matches!(
        AllowlistBuilder::new(entries).build(),
        Err(AllowlistError::DuplicateEntry { x: 400, y: 106, .. })
    ));
}

#[test]
fn test_proof_bundle_carries_root_and_proofs() {
    let allowlist = build_allowlist(&fixture_entries()).unwrap();
    let bundle = ProofBundle::from_allowlist(&allowlist);
    assert_eq!(bundle.root, hash_hex(&allowlist.root));
    assert_eq!(bundle.entries.len(), 6);
    assert!(bundle.entries.iter().all(|e| e.proof.len() == 3));

    let json = serde_json::to_value(&bundle).unwrap();
    assert_eq!(json["entries"][0]["x"], 400);
    assert_eq!(json["entries"][0]["price"], "4047");
}
