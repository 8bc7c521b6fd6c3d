//! Converge: Idempotent Ledger Bootstrap
//!
//! Deploys and configures contracts on a remote ledger so that every run
//! converges on the same end state. Deployments are content-addressed by
//! fingerprint, the land sale allowlist is committed as a Merkle root, and
//! role and balance state is driven by a check-then-act reconciler.

pub mod allowlist;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod logging;
pub mod pipeline;
pub mod reconcile;
pub mod store;
pub mod types;
