//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::allowlist::{
    build_allowlist, entries_from_inputs, load_inputs, proof::verify_leaf, Allowlist, ProofBundle,
};
use crate::cli::help::{command_name, is_mutating};
use crate::cli::parse::{
    AllowlistCommands, Commands, ConfigCommands, DeployCommands, ReconcileCommands,
    RegistryCommands,
};
use crate::cli::presentation::{
    format_allowlist_build, format_bundle_verification, format_config, format_fingerprint,
    format_plan, format_record, format_records, format_report, format_sale_deployment, to_json,
    BundleVerification, FingerprintStatus,
};
use crate::config::{ConfigLoader, ConvergeConfig};
use crate::deploy::DeploymentResolver;
use crate::error::{ApiError, StorageError};
use crate::guard::NetworkGuard;
use crate::ledger::GatewayLedgerClient;
use crate::pipeline::{
    bootstrap_reserve, deploy_sale, load_sale_allowlist, reserve_desired_state, sale_artifact,
    sale_request, PipelineContext,
};
use crate::reconcile::{diff, Reconciler};
use crate::store::{require, DeploymentRegistry, SledDeploymentRegistry};
use crate::types::{hash_hex, parse_hash};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, info_span};

/// Runtime context for CLI execution: workspace, loaded config and target network.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ConvergeConfig,
    network: Option<String>,
    unblock: bool,
}

impl RunContext {
    /// Load and validate configuration for a workspace.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        network: Option<String>,
        unblock: bool,
    ) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_with_file(&workspace_root, config_path.as_deref())?;
        Self::from_config(workspace_root, config, network, unblock)
    }

    pub fn from_config(
        workspace_root: PathBuf,
        config: ConvergeConfig,
        network: Option<String>,
        unblock: bool,
    ) -> Result<Self, ApiError> {
        config.ensure_valid()?;
        let network = network.or_else(|| config.default_network.clone());
        let unblock = unblock || config.guard.unblocked;
        Ok(Self {
            workspace_root,
            config,
            network,
            unblock,
        })
    }

    pub fn config(&self) -> &ConvergeConfig {
        &self.config
    }

    fn network(&self) -> Result<&str, ApiError> {
        self.network.as_deref().ok_or_else(|| {
            ApiError::ConfigError("No network selected: pass --network or set default_network".to_string())
        })
    }

    fn guard(&self) -> NetworkGuard {
        let guard = NetworkGuard::new(self.config.guard.clone());
        if self.unblock {
            guard.unblock()
        } else {
            guard
        }
    }

    fn open_registry(&self) -> Result<SledDeploymentRegistry, ApiError> {
        let path = self.workspace_root.join(&self.config.storage.registry_path);
        std::fs::create_dir_all(&path).map_err(StorageError::IoError)?;
        Ok(SledDeploymentRegistry::new(&path)?)
    }

    fn ledger(&self, network: &str) -> Result<GatewayLedgerClient, ApiError> {
        let settings = self.config.network(network)?;
        Ok(GatewayLedgerClient::new(
            &settings.gateway_url,
            network,
            Duration::from_secs(settings.timeout_secs),
        )?)
    }

    fn runtime() -> Result<tokio::runtime::Runtime, ApiError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))
    }

    /// Ask before writing to a protected network, unless `yes` was given
    fn confirm_protected(&self, network: &str, yes: bool) -> Result<(), ApiError> {
        let guard = self.guard();
        if yes || !guard.is_protected(network) || !self.unblock {
            return Ok(());
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Network {} is protected. Continue?", network))
            .default(false)
            .interact()
            .map_err(|e| ApiError::ConfigError(format!("Confirmation failed: {}", e)))?;
        if confirmed {
            Ok(())
        } else {
            Err(ApiError::ProtectedNetwork {
                network: network.to_string(),
                step: "confirmation declined".to_string(),
            })
        }
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let name = command_name(command);
        let span = info_span!("command", name = %name, mutating = is_mutating(command));
        let _enter = span.enter();
        let started = Instant::now();

        let result = match command {
            Commands::Allowlist { command } => self.handle_allowlist_command(command),
            Commands::Fingerprint { format } => self.handle_fingerprint(format),
            Commands::Deploy { command } => self.handle_deploy_command(command),
            Commands::Registry { command } => self.handle_registry_command(command),
            Commands::Reconcile { command } => self.handle_reconcile_command(command),
            Commands::Config {
                command: ConfigCommands::Show { format },
            } => format_config(&self.config, format),
        };

        info!(
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{} finished",
            name
        );
        result
    }

    fn handle_allowlist_command(&self, command: &AllowlistCommands) -> Result<String, ApiError> {
        match command {
            AllowlistCommands::Build {
                input,
                output,
                format,
            } => {
                let allowlist = match input {
                    Some(path) => self.build_allowlist_from(path)?,
                    None => load_sale_allowlist(&self.config, &self.workspace_root, self.network()?)?,
                };
                if let Some(path) = output {
                    let bundle = to_json(&ProofBundle::from_allowlist(&allowlist))?;
                    std::fs::write(path, bundle).map_err(StorageError::IoError)?;
                    info!(path = %path.display(), "Proof bundle written");
                }
                format_allowlist_build(&allowlist, format)
            }
            AllowlistCommands::Verify { bundle, root } => {
                let result = verify_bundle(bundle, root.as_deref())?;
                let text = format_bundle_verification(&result);
                if result.invalid.is_empty() {
                    Ok(text)
                } else {
                    Err(ApiError::ConfigError(text))
                }
            }
        }
    }

    fn build_allowlist_from(&self, path: &Path) -> Result<Allowlist, ApiError> {
        let inputs = load_inputs(&self.workspace_root.join(path))?;
        let default_beneficiary = self.config.accounts.get(&self.config.sale.beneficiary).copied();
        let entries = entries_from_inputs(&inputs, default_beneficiary)?;
        Ok(build_allowlist(&entries)?)
    }

    fn handle_fingerprint(&self, format: &str) -> Result<String, ApiError> {
        let network = self.network()?;
        let registry = self.open_registry()?;
        let ledger = self.ledger(network)?;
        let resolver = DeploymentResolver::new(&ledger, &registry);
        let sale = &self.config.sale;

        let allowlist = load_sale_allowlist(&self.config, &self.workspace_root, network)?;
        let artifact = sale_artifact(&self.config, &self.workspace_root)?;
        let oracle = resolver.dependency_address(network, &sale.price_oracle)?;
        let stable = resolver.dependency_address(network, &sale.stable_asset)?;
        let request = sale_request(&self.config, network, artifact, &allowlist, oracle, stable)?;
        let computed = resolver.fingerprint(&request)?;

        let recorded = registry.get(network, &sale.logical_name)?;
        let status = FingerprintStatus {
            name: sale.logical_name.clone(),
            network: network.to_string(),
            computed: hash_hex(&computed),
            recorded: recorded.as_ref().map(|r| hash_hex(&r.fingerprint)),
            address: recorded.as_ref().map(|r| r.address.to_string()),
        };
        format_fingerprint(&status, format)
    }

    fn handle_deploy_command(&self, command: &DeployCommands) -> Result<String, ApiError> {
        match command {
            DeployCommands::Sale { yes, format } => {
                let network = self.network()?;
                self.guard().check(network, &self.config.sale.logical_name)?;
                self.confirm_protected(network, *yes)?;

                let registry = self.open_registry()?;
                let ledger = self.ledger(network)?;
                let ctx = self.pipeline_context(network, &ledger, &registry);
                let deployment = Self::runtime()?.block_on(deploy_sale(&ctx))?;
                registry.flush()?;
                format_sale_deployment(&self.config.sale.logical_name, &deployment, format)
            }
        }
    }

    fn handle_registry_command(&self, command: &RegistryCommands) -> Result<String, ApiError> {
        let network = self.network()?;
        let registry = self.open_registry()?;
        match command {
            RegistryCommands::List { format } => format_records(&registry.list(network)?, format),
            RegistryCommands::Show { name, format } => {
                format_record(&require(&registry, network, name)?, format)
            }
            RegistryCommands::History { name, format } => {
                format_records(&registry.history(network, name)?, format)
            }
        }
    }

    fn handle_reconcile_command(&self, command: &ReconcileCommands) -> Result<String, ApiError> {
        let network = self.network()?;
        let registry = self.open_registry()?;
        let ledger = self.ledger(network)?;
        match command {
            ReconcileCommands::Plan { format } => {
                let desired = reserve_desired_state(&self.config, network, &registry)?;
                let observed = Self::runtime()?.block_on(Reconciler::new(&ledger).snapshot(&desired));
                format_plan(&diff(&desired, &observed), format)
            }
            ReconcileCommands::Apply { yes, format } => {
                self.guard().check(network, "bootstrap_reserve")?;
                self.confirm_protected(network, *yes)?;
                let ctx = self.pipeline_context(network, &ledger, &registry);
                let report = Self::runtime()?.block_on(bootstrap_reserve(&ctx))?;
                let text = format_report(&report, format)?;
                if report.is_converged() {
                    Ok(text)
                } else {
                    Err(ApiError::Incomplete {
                        status: report.status().to_string(),
                        report: text,
                    })
                }
            }
        }
    }

    fn pipeline_context<'a>(
        &'a self,
        network: &'a str,
        ledger: &'a GatewayLedgerClient,
        registry: &'a SledDeploymentRegistry,
    ) -> PipelineContext<'a> {
        PipelineContext {
            config: &self.config,
            network,
            workspace_root: self.workspace_root.clone(),
            ledger,
            registry,
            guard: self.guard(),
        }
    }
}

/// Check every proof in a bundle file against its root (or `root`)
pub fn verify_bundle(path: &Path, root: Option<&str>) -> Result<BundleVerification, ApiError> {
    let text = std::fs::read_to_string(path).map_err(StorageError::IoError)?;
    let bundle: ProofBundle = serde_json::from_str(&text).map_err(|e| {
        ApiError::ConfigError(format!("Failed to parse bundle {}: {}", path.display(), e))
    })?;
    let root_text = root.unwrap_or(&bundle.root).to_string();
    let root_hash = parse_hash(&root_text)?;

    let mut invalid = Vec::new();
    for item in &bundle.entries {
        let proof = item
            .proof
            .iter()
            .map(|h| parse_hash(h))
            .collect::<Result<Vec<_>, _>>()?;
        let leaf = crate::allowlist::hasher::compute_leaf_hash(&item.entry);
        if !verify_leaf(&root_hash, &leaf, &proof) {
            invalid.push(item.entry.key().to_string());
        }
    }

    Ok(BundleVerification {
        root: root_text,
        total: bundle.entries.len(),
        invalid,
    })
}
