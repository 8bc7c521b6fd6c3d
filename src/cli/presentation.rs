//! CLI presentation: text and json formatters per command family.

mod allowlist;
mod config;
mod deploy;
mod reconcile;
mod registry;
mod shared;

pub use allowlist::{format_allowlist_build, format_bundle_verification, BundleVerification};
pub use config::format_config;
pub use deploy::{format_fingerprint, format_sale_deployment, FingerprintStatus};
pub use reconcile::{format_plan, format_report};
pub use registry::{format_record, format_records};
pub use shared::to_json;
