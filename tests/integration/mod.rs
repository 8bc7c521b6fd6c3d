//! Integration tests for the converge bootstrap pipelines

mod allowlist_fixture;
mod config_integration;
mod pipelines;
mod reconciliation;
