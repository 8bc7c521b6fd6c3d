//! Bootstrap pipelines
//!
//! Two end-to-end steps built on the allowlist builder, the deployment
//! resolver and the reconciler: deploying the land presale contract and
//! bootstrapping the liquidity reserve. Both are safe to rerun.

use crate::allowlist::{build_allowlist, entries_from_inputs, load_inputs, Allowlist};
use crate::config::ConvergeConfig;
use crate::deploy::{ConstructorArg, DeploymentRequest, DeploymentResolver, Resolution};
use crate::error::ApiError;
use crate::guard::NetworkGuard;
use crate::ledger::{Artifact, LedgerClient, SignerSpec};
use crate::reconcile::{Asset, DesiredStateDescriptor, ReconciliationReport, Reconciler, Role};
use crate::store::DeploymentRegistry;
use crate::types::{hash_hex, Address};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Everything a pipeline run works against
pub struct PipelineContext<'a> {
    pub config: &'a ConvergeConfig,
    pub network: &'a str,
    pub workspace_root: PathBuf,
    pub ledger: &'a dyn LedgerClient,
    pub registry: &'a dyn DeploymentRegistry,
    pub guard: NetworkGuard,
}

impl<'a> PipelineContext<'a> {
    fn resolver(&self) -> DeploymentResolver<'a> {
        DeploymentResolver::new(self.ledger, self.registry)
            .with_policy(self.config.resolver.on_fingerprint_mismatch)
    }
}

/// Result of the sale deployment step
#[derive(Debug, Clone)]
pub struct SaleDeployment {
    pub resolution: Resolution,
    pub allowlist: Allowlist,
}

/// Load, validate and build the sale allowlist for a network
///
/// Entries without a beneficiary go to the configured sale beneficiary.
pub fn load_sale_allowlist(
    config: &ConvergeConfig,
    workspace_root: &Path,
    network: &str,
) -> Result<Allowlist, ApiError> {
    let path = workspace_root.join(config.sale.allowlist_for(network));
    let inputs = load_inputs(&path)?;
    let default_beneficiary = config.accounts.get(&config.sale.beneficiary).copied();
    let entries = entries_from_inputs(&inputs, default_beneficiary)?;
    Ok(build_allowlist(&entries)?)
}

/// Artifact for the sale contract, with a code digest when bytecode is configured
pub fn sale_artifact(config: &ConvergeConfig, workspace_root: &Path) -> Result<Artifact, ApiError> {
    match &config.sale.bytecode_path {
        Some(path) => {
            let path = workspace_root.join(path);
            let bytecode = std::fs::read(&path).map_err(|e| {
                ApiError::ConfigError(format!("Failed to read bytecode {}: {}", path.display(), e))
            })?;
            Ok(Artifact::from_bytecode(&config.sale.artifact, &bytecode))
        }
        None => Ok(Artifact::named(&config.sale.artifact)),
    }
}

/// Build the sale deployment request
///
/// The allowlist entries and root are linked data, so any entry change
/// yields a new fingerprint.
pub fn sale_request(
    config: &ConvergeConfig,
    network: &str,
    artifact: Artifact,
    allowlist: &Allowlist,
    price_oracle: Address,
    stable_asset: Address,
) -> Result<DeploymentRequest, ApiError> {
    let sale = &config.sale;
    let deployer = config.account(&sale.deployer)?;
    let beneficiary = config.account(&sale.beneficiary)?;

    let linked_data = serde_json::json!({
        "root": hash_hex(&allowlist.root),
        "entries": allowlist.entries,
    });

    Ok(DeploymentRequest::new(&sale.logical_name, network, artifact)
        .with_signer(SignerSpec::named(&sale.deployer))
        .with_args(vec![
            ConstructorArg::Dependency(sale.land.clone()),
            ConstructorArg::Dependency(sale.sand.clone()),
            ConstructorArg::Dependency(sale.sand.clone()),
            ConstructorArg::Address(deployer),
            ConstructorArg::Address(beneficiary),
            ConstructorArg::Bytes32(allowlist.root),
            ConstructorArg::Uint(u128::from(sale.opening_time)),
            ConstructorArg::Address(price_oracle),
            ConstructorArg::Address(stable_asset),
        ])
        .with_linked_data(linked_data))
}

/// Deploy the land presale contract, or reuse the recorded one
#[instrument(skip(ctx), fields(network = ctx.network))]
pub async fn deploy_sale(ctx: &PipelineContext<'_>) -> Result<SaleDeployment, ApiError> {
    let sale = &ctx.config.sale;
    ctx.guard.check(ctx.network, &sale.logical_name)?;

    let allowlist = load_sale_allowlist(ctx.config, &ctx.workspace_root, ctx.network)?;
    let artifact = sale_artifact(ctx.config, &ctx.workspace_root)?;
    let resolver = ctx.resolver();

    // Required dependencies and accounts first so a gap fails before any fallback deploys
    resolver.dependency_address(ctx.network, &sale.land)?;
    resolver.dependency_address(ctx.network, &sale.sand)?;
    ctx.config.account(&sale.deployer)?;
    ctx.config.account(&sale.beneficiary)?;

    let signer = SignerSpec::named(&sale.deployer);
    let allow_fallback = !ctx.config.is_live(ctx.network);
    let price_oracle = resolver
        .ensure_dependency(
            ctx.network,
            &sale.price_oracle,
            Some(&Artifact::named(&sale.price_oracle_fallback)),
            &signer,
            allow_fallback,
        )
        .await?;
    let stable_asset = resolver
        .ensure_dependency(
            ctx.network,
            &sale.stable_asset,
            Some(&Artifact::named(&sale.stable_asset_fallback)),
            &signer,
            allow_fallback,
        )
        .await?;

    let request = sale_request(
        ctx.config,
        ctx.network,
        artifact,
        &allowlist,
        price_oracle,
        stable_asset,
    )?;
    let resolution = resolver.resolve(&request).await?;

    if resolution.newly_deployed {
        info!(root = %hash_hex(&allowlist.root), entries = allowlist.len(), "{} deployed", sale.logical_name);
    } else {
        info!("reusing {} at {}", sale.logical_name, resolution.address);
    }

    Ok(SaleDeployment {
        resolution,
        allowlist,
    })
}

/// Desired reserve state for a network
///
/// Withdraw approvals first, then operator and alerter per operator, then
/// the admin as alerter, then the admin transfer, then native and token
/// deposits. The token target is the native deposit converted at the
/// configured token price.
pub fn reserve_desired_state(
    config: &ConvergeConfig,
    network: &str,
    registry: &dyn DeploymentRegistry,
) -> Result<DesiredStateDescriptor, ApiError> {
    let settings = config.reserve(network)?;
    let token_target = settings.token_deposit_amount()?;

    let lookup = |name: &str| -> Result<Address, ApiError> {
        registry
            .get(network, name)?
            .map(|record| record.address)
            .ok_or_else(|| ApiError::MissingDependency {
                name: name.to_string(),
                network: network.to_string(),
            })
    };
    let reserve_address = lookup(&settings.reserve)?;
    let token_address = lookup(&settings.token)?;

    let reserve = settings.reserve.as_str();
    let mut desired = DesiredStateDescriptor::new(SignerSpec::named(&settings.authority));

    for whitelisted in &settings.whitelisted_addresses {
        desired.grant(
            reserve,
            Role::WithdrawApproval {
                token: token_address,
            },
            *whitelisted,
        );
    }
    for operator in &settings.reserve_operators {
        desired.grant(reserve, Role::Operator, *operator);
        desired.grant(reserve, Role::Alerter, *operator);
    }
    desired.grant(reserve, Role::Alerter, settings.reserve_admin);
    desired.transfer_admin(reserve, settings.reserve_admin);

    let depositor = SignerSpec {
        from: settings.depositor.clone(),
        skip_unknown_signer: true,
    };
    desired.fund(
        Asset::Native,
        reserve_address,
        settings.wei_deposit_amount,
        depositor.clone(),
    );
    desired.fund(
        Asset::Token {
            contract: settings.token.clone(),
        },
        reserve_address,
        token_target,
        depositor,
    );

    Ok(desired)
}

/// Bring the liquidity reserve to its configured state
///
/// Does nothing on local development networks.
#[instrument(skip(ctx), fields(network = ctx.network))]
pub async fn bootstrap_reserve(ctx: &PipelineContext<'_>) -> Result<ReconciliationReport, ApiError> {
    if ctx.guard.is_local(ctx.network) {
        info!("Skipping reserve bootstrap on local network {}", ctx.network);
        return Ok(ReconciliationReport::new());
    }
    ctx.guard.check(ctx.network, "bootstrap_reserve")?;

    let desired = reserve_desired_state(ctx.config, ctx.network, ctx.registry)?;
    Reconciler::new(ctx.ledger).reconcile(&desired).await
}
