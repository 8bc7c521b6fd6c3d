//! Merge policy

pub mod merge_policy;
