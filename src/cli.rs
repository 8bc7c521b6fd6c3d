//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to pipelines and services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, is_mutating};
pub use output::{error_category, map_error, partial_output};
pub use parse::{
    AllowlistCommands, Cli, Commands, ConfigCommands, DeployCommands, ReconcileCommands,
    RegistryCommands,
};
pub use presentation::{
    format_allowlist_build, format_bundle_verification, format_config, format_fingerprint,
    format_plan, format_record, format_records, format_report, format_sale_deployment,
    BundleVerification, FingerprintStatus,
};
pub use route::{verify_bundle, RunContext};
