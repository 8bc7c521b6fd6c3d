//! End-to-end pipeline runs: sale deployment and reserve bootstrap

use crate::integration::test_utils::{
    addr, fixture_beneficiary, fixture_inputs, seed_registry, seed_registry_on, FakeLedger, NETWORK,
};
use converge::config::{ConvergeConfig, NetworkConfig, ReserveConfig};
use converge::error::ApiError;
use converge::guard::NetworkGuard;
use converge::pipeline::{bootstrap_reserve, deploy_sale, reserve_desired_state, PipelineContext};
use converge::reconcile::RunStatus;
use converge::store::{DeploymentRegistry, MemoryDeploymentRegistry};
use std::path::Path;
use tempfile::TempDir;

const TOKEN_PRICE: u128 = 5_000_000_000_000_000;

fn reserve_settings() -> ReserveConfig {
    ReserveConfig {
        whitelisted_addresses: vec![addr(0x77)],
        reserve_admin: addr(0xad),
        reserve_operators: vec![addr(0x0b), addr(0x0c)],
        wei_deposit_amount: 1_000_000_000_000_000_000,
        token_price_in_wei: TOKEN_PRICE,
        reserve: "KyberReserve".to_string(),
        token: "Sand".to_string(),
        authority: "deployer".to_string(),
        depositor: "kyber_depositor".to_string(),
    }
}

fn config(live: bool) -> ConvergeConfig {
    let mut config = ConvergeConfig::default();
    config.accounts.insert("deployer".to_string(), addr(0x01));
    config
        .accounts
        .insert("land_sale_beneficiary".to_string(), fixture_beneficiary());
    config.networks.insert(
        NETWORK.to_string(),
        NetworkConfig {
            gateway_url: "http://127.0.0.1:8545".to_string(),
            live,
            timeout_secs: 60,
        },
    );
    config.reserves.insert(NETWORK.to_string(), reserve_settings());
    config
}

fn write_allowlist(workspace: &Path, config: &ConvergeConfig) {
    let path = workspace.join(&config.sale.allowlist_path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, serde_json::to_string_pretty(&fixture_inputs()).unwrap()).unwrap();
}

fn context<'a>(
    config: &'a ConvergeConfig,
    network: &'a str,
    workspace: &Path,
    ledger: &'a FakeLedger,
    registry: &'a MemoryDeploymentRegistry,
) -> PipelineContext<'a> {
    PipelineContext {
        config,
        network,
        workspace_root: workspace.to_path_buf(),
        ledger,
        registry,
        guard: NetworkGuard::new(config.guard.clone()),
    }
}

fn registry_with_core() -> MemoryDeploymentRegistry {
    let registry = MemoryDeploymentRegistry::new();
    seed_registry(&registry, "Land", addr(0x1a));
    seed_registry(&registry, "Sand", addr(0x5a));
    registry
}

#[tokio::test]
async fn test_deploy_sale_on_dev_network_sets_up_fallbacks_once() {
    let dir = TempDir::new().unwrap();
    let config = config(false);
    write_allowlist(dir.path(), &config);
    let ledger = FakeLedger::new();
    let registry = registry_with_core();
    let ctx = context(&config, NETWORK, dir.path(), &ledger, &registry);

    let first = deploy_sale(&ctx).await.unwrap();
    assert!(first.resolution.newly_deployed);
    assert_eq!(first.allowlist.len(), 6);
    assert_eq!(
        ledger.deployed_names(),
        vec!["DAIMedianizer", "DAI", "LandPreSale_2"]
    );

    let second = deploy_sale(&ctx).await.unwrap();
    assert!(!second.resolution.newly_deployed);
    assert_eq!(first.resolution.address, second.resolution.address);
    assert_eq!(first.allowlist.root, second.allowlist.root);
    assert_eq!(ledger.deploy_count(), 3);

    let recorded = registry.get(NETWORK, "LandPreSale_2").unwrap().unwrap();
    assert_eq!(recorded.fingerprint, first.resolution.fingerprint);
    assert_eq!(recorded.artifact, "LandSaleWithETHAndDAI");
}

#[tokio::test]
async fn test_deploy_sale_redeploys_after_allowlist_change() {
    let dir = TempDir::new().unwrap();
    let config = config(false);
    write_allowlist(dir.path(), &config);
    let ledger = FakeLedger::new();
    let registry = registry_with_core();
    let ctx = context(&config, NETWORK, dir.path(), &ledger, &registry);

    let first = deploy_sale(&ctx).await.unwrap();

    let mut inputs = fixture_inputs();
    inputs[3].price = Some("3170".to_string());
    std::fs::write(
        dir.path().join(&config.sale.allowlist_path),
        serde_json::to_string(&inputs).unwrap(),
    )
    .unwrap();

    let second = deploy_sale(&ctx).await.unwrap();
    assert!(second.resolution.newly_deployed);
    assert_ne!(first.allowlist.root, second.allowlist.root);
    assert_eq!(registry.history(NETWORK, "LandPreSale_2").unwrap().len(), 2);
    // Fallback dependencies are not redeployed
    assert_eq!(ledger.deploy_count(), 4);
}

#[tokio::test]
async fn test_deploy_sale_on_live_network_requires_real_oracle() {
    let dir = TempDir::new().unwrap();
    let config = config(true);
    write_allowlist(dir.path(), &config);
    let ledger = FakeLedger::new();
    let registry = registry_with_core();
    let ctx = context(&config, NETWORK, dir.path(), &ledger, &registry);

    let err = deploy_sale(&ctx).await.unwrap_err();
    assert!(matches!(err, ApiError::MissingDependency { ref name, .. } if name == "DAIMedianizer"));
    assert_eq!(ledger.write_count(), 0);
}

#[tokio::test]
async fn test_deploy_sale_without_land_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = config(false);
    write_allowlist(dir.path(), &config);
    let ledger = FakeLedger::new();
    let registry = MemoryDeploymentRegistry::new();
    seed_registry(&registry, "Sand", addr(0x5a));
    let ctx = context(&config, NETWORK, dir.path(), &ledger, &registry);

    let err = deploy_sale(&ctx).await.unwrap_err();
    assert!(matches!(err, ApiError::MissingDependency { ref name, .. } if name == "Land"));
    assert_eq!(ledger.write_count(), 0);
}

#[tokio::test]
async fn test_deploy_sale_refused_on_protected_network() {
    let dir = TempDir::new().unwrap();
    let config = config(false);
    write_allowlist(dir.path(), &config);
    let ledger = FakeLedger::new();
    let registry = registry_with_core();
    let ctx = context(&config, "1", dir.path(), &ledger, &registry);

    let err = deploy_sale(&ctx).await.unwrap_err();
    assert!(matches!(err, ApiError::ProtectedNetwork { ref network, .. } if network == "1"));
    assert_eq!(ledger.write_count(), 0);
}

#[tokio::test]
async fn test_deploy_sale_without_deployer_account_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut config = config(false);
    config.accounts.remove("deployer");
    write_allowlist(dir.path(), &config);
    let ledger = FakeLedger::new();
    let registry = registry_with_core();
    let ctx = context(&config, NETWORK, dir.path(), &ledger, &registry);

    let err = deploy_sale(&ctx).await.unwrap_err();
    assert!(matches!(err, ApiError::ConfigError(ref message) if message.contains("'deployer'")));
    assert_eq!(ledger.write_count(), 0);
    assert!(registry.get(NETWORK, "DAIMedianizer").unwrap().is_none());
}

#[tokio::test]
async fn test_bootstrap_reserve_refused_on_protected_network() {
    let dir = TempDir::new().unwrap();
    let mut config = config(false);
    config.reserves.insert("1".to_string(), reserve_settings());
    let ledger = FakeLedger::new();
    let registry = MemoryDeploymentRegistry::new();
    seed_registry_on(&registry, "1", "KyberReserve", addr(0xee));
    seed_registry_on(&registry, "1", "Sand", addr(0x5a));
    let ctx = context(&config, "1", dir.path(), &ledger, &registry);

    match bootstrap_reserve(&ctx).await.unwrap_err() {
        ApiError::ProtectedNetwork { network, step } => {
            assert_eq!(network, "1");
            assert_eq!(step, "bootstrap_reserve");
        }
        other => panic!("expected ProtectedNetwork, got {:?}", other),
    }
    assert_eq!(ledger.read_count(), 0);
    assert_eq!(ledger.write_count(), 0);
}

#[tokio::test]
async fn test_bootstrap_reserve_runs_on_protected_network_when_unblocked() {
    let dir = TempDir::new().unwrap();
    let mut config = config(false);
    config.reserves.insert("1".to_string(), reserve_settings());
    config.guard.unblocked = true;
    let ledger = FakeLedger::new();
    let registry = MemoryDeploymentRegistry::new();
    seed_registry_on(&registry, "1", "KyberReserve", addr(0xee));
    seed_registry_on(&registry, "1", "Sand", addr(0x5a));
    let ctx = context(&config, "1", dir.path(), &ledger, &registry);

    let report = bootstrap_reserve(&ctx).await.unwrap();
    assert_eq!(report.status(), RunStatus::Converged);
    assert_eq!(ledger.admin("KyberReserve"), Some(addr(0xad)));
    assert!(ledger.read_count() > 0);
}

#[tokio::test]
async fn test_bootstrap_reserve_converges_then_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let config = config(false);
    let ledger = FakeLedger::new();
    let registry = MemoryDeploymentRegistry::new();
    seed_registry(&registry, "KyberReserve", addr(0xee));
    seed_registry(&registry, "Sand", addr(0x5a));
    let ctx = context(&config, NETWORK, dir.path(), &ledger, &registry);

    let first = bootstrap_reserve(&ctx).await.unwrap();
    assert_eq!(first.status(), RunStatus::Converged);
    assert_eq!(ledger.operators("KyberReserve"), vec![addr(0x0b), addr(0x0c)]);
    assert_eq!(
        ledger.alerters("KyberReserve"),
        vec![addr(0x0b), addr(0x0c), addr(0xad)]
    );
    assert_eq!(ledger.admin("KyberReserve"), Some(addr(0xad)));
    assert_eq!(ledger.native_balance_of(addr(0xee)), 1_000_000_000_000_000_000);
    // 1 ether at 0.005 ether per token
    assert_eq!(
        ledger.token_balance_of("Sand", addr(0xee)),
        200_000_000_000_000_000_000
    );

    let writes = ledger.write_count();
    let second = bootstrap_reserve(&ctx).await.unwrap();
    assert_eq!(second.status(), RunStatus::AlreadyConverged);
    assert_eq!(ledger.write_count(), writes);
}

#[tokio::test]
async fn test_bootstrap_reserve_skipped_on_local_network() {
    let dir = TempDir::new().unwrap();
    let config = config(false);
    let ledger = FakeLedger::new();
    let registry = MemoryDeploymentRegistry::new();
    let ctx = context(&config, "31337", dir.path(), &ledger, &registry);

    let report = bootstrap_reserve(&ctx).await.unwrap();
    assert!(report.units.is_empty());
    assert_eq!(report.status(), RunStatus::AlreadyConverged);
    assert_eq!(ledger.write_count(), 0);
}

#[tokio::test]
async fn test_bootstrap_reserve_needs_recorded_reserve() {
    let dir = TempDir::new().unwrap();
    let config = config(false);
    let ledger = FakeLedger::new();
    let registry = MemoryDeploymentRegistry::new();
    seed_registry(&registry, "Sand", addr(0x5a));
    let ctx = context(&config, NETWORK, dir.path(), &ledger, &registry);

    let err = bootstrap_reserve(&ctx).await.unwrap_err();
    assert!(matches!(err, ApiError::MissingDependency { ref name, .. } if name == "KyberReserve"));
    assert_eq!(ledger.write_count(), 0);
}

#[test]
fn test_missing_reserve_settings_is_config_error() {
    let mut config = config(false);
    config.reserves.clear();
    let registry = MemoryDeploymentRegistry::new();

    let err = reserve_desired_state(&config, NETWORK, &registry).unwrap_err();
    assert!(matches!(err, ApiError::ConfigError(_)));
}

#[test]
fn test_reserve_desired_state_ordering() {
    let config = config(false);
    let registry = MemoryDeploymentRegistry::new();
    seed_registry(&registry, "KyberReserve", addr(0xee));
    seed_registry(&registry, "Sand", addr(0x5a));

    let desired = reserve_desired_state(&config, NETWORK, &registry).unwrap();
    let roles: Vec<String> = desired.grants.iter().map(|g| g.role.to_string()).collect();
    assert_eq!(
        roles,
        vec![
            format!("withdraw-approval[{}]", addr(0x5a)),
            "operator".to_string(),
            "alerter".to_string(),
            "operator".to_string(),
            "alerter".to_string(),
            "alerter".to_string(),
        ]
    );
    assert_eq!(desired.admin_transfers.len(), 1);
    assert_eq!(desired.funding.len(), 2);
    assert!(desired.funding.iter().all(|f| f.funder.skip_unknown_signer));
}
