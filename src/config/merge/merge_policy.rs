//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources replace scalars and arrays wholesale and merge tables key
/// by key, so a workspace file can override one reserve without restating
/// the others.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("storage.registry_path", ".converge/registry")?
        .set_default("guard.protected_networks", vec!["1", "4", "314159"])?
        .set_default("guard.local_networks", vec!["31337"])?
        .set_default("guard.unblocked", false)?
        .set_default("resolver.on_fingerprint_mismatch", "redeploy")
}
