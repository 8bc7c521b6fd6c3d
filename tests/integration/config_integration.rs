//! Integration tests for configuration loading

use crate::integration::test_utils::{addr, with_isolated_env};
use converge::cli::RunContext;
use converge::config::ConfigLoader;
use converge::deploy::MismatchPolicy;
use converge::error::ApiError;
use std::path::Path;
use tempfile::TempDir;

const WORKSPACE_CONFIG: &str = r#"
default_network = "5"

[accounts]
deployer = "0x0000000000000000000000000000000000000001"
land_sale_beneficiary = "0x00000000000000000000000000000000000000BE"

[networks.5]
gateway_url = "http://127.0.0.1:8545"
live = true

[reserves.5]
whitelisted_addresses = ["0x0000000000000000000000000000000000000077"]
reserve_admin = "0x00000000000000000000000000000000000000ad"
reserve_operators = ["0x000000000000000000000000000000000000000b"]
wei_deposit_amount = "1000000000000000000"
token_price_in_wei = "5000000000000000"

[sale.allowlists]
5 = "data/goerli/lands.json"
"#;

fn write_workspace_config(workspace: &Path, name: &str, contents: &str) {
    let dir = workspace.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

fn write_user_config(test_dir: &TempDir, contents: &str) {
    let dir = test_dir.path().join("xdg").join("converge");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

#[test]
fn test_workspace_config_loads_with_defaults() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    write_workspace_config(&workspace, "config.toml", WORKSPACE_CONFIG);

    let config = with_isolated_env(&test_dir, || ConfigLoader::load(&workspace)).unwrap();
    assert!(config.validate().is_ok());

    assert_eq!(config.default_network.as_deref(), Some("5"));
    assert_eq!(config.account("deployer").unwrap(), addr(0x01));
    assert_eq!(config.account("land_sale_beneficiary").unwrap(), addr(0xbe));

    let network = config.network("5").unwrap();
    assert!(network.live);
    assert_eq!(network.timeout_secs, 60);

    let reserve = config.reserve("5").unwrap();
    assert_eq!(reserve.reserve, "KyberReserve");
    assert_eq!(reserve.depositor, "kyber_depositor");
    assert_eq!(reserve.token_deposit_amount().unwrap(), 200_000_000_000_000_000_000);

    assert_eq!(
        config.sale.allowlist_for("5"),
        Path::new("data/goerli/lands.json")
    );
    assert_eq!(
        config.sale.allowlist_for("31337"),
        Path::new("data/land_presale_2/lands.json")
    );
    assert_eq!(config.guard.protected_networks, vec!["1", "4", "314159"]);
    assert_eq!(config.resolver.on_fingerprint_mismatch, MismatchPolicy::Redeploy);
}

#[test]
fn test_workspace_overrides_user_file() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    write_user_config(
        &test_dir,
        r#"
default_network = "4"

[resolver]
on_fingerprint_mismatch = "reject"
"#,
    );
    write_workspace_config(&workspace, "config.toml", WORKSPACE_CONFIG);

    let config = with_isolated_env(&test_dir, || ConfigLoader::load(&workspace)).unwrap();
    assert_eq!(config.default_network.as_deref(), Some("5"));
    // Keys the workspace leaves alone keep the user value
    assert_eq!(config.resolver.on_fingerprint_mismatch, MismatchPolicy::Reject);
}

#[test]
fn test_environment_file_and_variables_layer_on_top() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    write_workspace_config(&workspace, "config.toml", WORKSPACE_CONFIG);
    write_workspace_config(
        &workspace,
        "staging.toml",
        r#"
[networks.5]
gateway_url = "https://gateway.staging.invalid"
live = false
"#,
    );

    let config = with_isolated_env(&test_dir, || {
        std::env::set_var("CONVERGE_ENV", "staging");
        std::env::set_var("CONVERGE__DEFAULT_NETWORK", "31337");
        ConfigLoader::load(&workspace)
    })
    .unwrap();

    assert_eq!(config.default_network.as_deref(), Some("31337"));
    assert!(!config.is_live("5"));
    assert_eq!(config.network("5").unwrap().gateway_url, "https://gateway.staging.invalid");
}

#[test]
fn test_explicit_file_overrides_workspace() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    write_workspace_config(&workspace, "config.toml", WORKSPACE_CONFIG);
    let extra = test_dir.path().join("extra.toml");
    std::fs::write(&extra, "default_network = \"1\"\n").unwrap();

    let config = with_isolated_env(&test_dir, || {
        ConfigLoader::load_with_file(&workspace, Some(&extra))
    })
    .unwrap();
    assert_eq!(config.default_network.as_deref(), Some("1"));
    assert!(config.reserves.contains_key("5"));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    let missing = test_dir.path().join("missing.toml");

    let result = with_isolated_env(&test_dir, || {
        ConfigLoader::load_with_file(&workspace, Some(&missing))
    });
    assert!(result.is_err());
}

#[test]
fn test_load_from_file_ignores_workspace() {
    let test_dir = TempDir::new().unwrap();
    let file = test_dir.path().join("only.toml");
    std::fs::write(
        &file,
        r#"
[networks.80001]
gateway_url = "https://gateway.invalid"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&file).unwrap();
    assert!(config.default_network.is_none());
    assert!(!config.is_live("80001"));
    // Networks without settings count as live
    assert!(config.is_live("137"));
    assert_eq!(config.storage.registry_path, Path::new(".converge/registry"));
}

#[test]
fn test_invalid_config_is_rejected_by_run_context() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    write_workspace_config(
        &workspace,
        "config.toml",
        r#"
[networks.5]
gateway_url = "ftp://nope"
timeout_secs = 0
"#,
    );

    let result = with_isolated_env(&test_dir, || {
        RunContext::new(workspace.clone(), None, None, false)
    });
    match result {
        Err(ApiError::ConfigError(message)) => {
            assert!(message.contains("gateway_url must be an http(s) URL"));
            assert!(message.contains("timeout_secs must be positive"));
        }
        Err(other) => panic!("expected config error, got {:?}", other),
        Ok(_) => panic!("expected invalid configuration to be rejected"),
    }
}

#[test]
fn test_run_context_falls_back_to_default_network() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("workspace");
    write_workspace_config(&workspace, "config.toml", WORKSPACE_CONFIG);

    let context = with_isolated_env(&test_dir, || {
        RunContext::new(workspace.clone(), None, None, false)
    })
    .unwrap();
    assert_eq!(context.config().default_network.as_deref(), Some("5"));
}
