//! Config loading entry points

use crate::config::merge::merge_policy::builder_with_defaults;
use crate::config::sources::{global_file, workspace_file};
use crate::config::ConvergeConfig;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};

/// Loads `ConvergeConfig` from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace
    ///
    /// Precedence, lowest first: defaults, user file, workspace
    /// `config/config.toml`, workspace `config/{CONVERGE_ENV}.toml`,
    /// `CONVERGE__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<ConvergeConfig, ConfigError> {
        Self::load_with_file(workspace_root, None)
    }

    /// Same as `load`, with an explicit file layered above the workspace files
    pub fn load_with_file(
        workspace_root: &Path,
        extra: Option<&Path>,
    ) -> Result<ConvergeConfig, ConfigError> {
        let mut builder = builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;
        builder = workspace_file::add_to_builder(builder, workspace_root)?;
        if let Some(path) = extra {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(
                Environment::with_prefix("CONVERGE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("guard.protected_networks")
                    .with_list_parse_key("guard.local_networks"),
            )
            .build()?
            .try_deserialize()
    }

    /// Load a single file over the defaults, ignoring every other source
    pub fn load_from_file(path: &Path) -> Result<ConvergeConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    /// Where the user config file is looked up
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Defaults only
    pub fn default() -> ConvergeConfig {
        ConvergeConfig::default()
    }
}
