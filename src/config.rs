//! Configuration System
//!
//! Layered configuration: built-in defaults, the user file, workspace files,
//! then `CONVERGE__*` environment variables. Everything a run needs that is
//! not on the ledger lives here: named accounts, network endpoints, the sale
//! parameters and per-network reserve settings.

use crate::deploy::MismatchPolicy;
use crate::error::ApiError;
use crate::guard::GuardConfig;
use crate::logging::LoggingConfig;
use crate::types::{serde_amount, Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergeConfig {
    /// Network used when the CLI gets no `--network`
    #[serde(default)]
    pub default_network: Option<String>,

    /// Named accounts (deployer, beneficiary, depositor, ...)
    #[serde(default)]
    pub accounts: BTreeMap<String, Address>,

    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,

    #[serde(default)]
    pub guard: GuardConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub sale: SaleConfig,

    /// Reserve bootstrap settings keyed by network id
    #[serde(default)]
    pub reserves: BTreeMap<String, ReserveConfig>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How to reach one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Base URL of the ledger gateway
    pub gateway_url: String,

    /// Production network; development fallbacks are never deployed here
    #[serde(default)]
    pub live: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub on_fingerprint_mismatch: MismatchPolicy,
}

/// Land presale deployment parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleConfig {
    pub logical_name: String,
    pub artifact: String,
    /// Creation bytecode; when present its digest is part of the fingerprint
    pub bytecode_path: Option<PathBuf>,
    /// Unix timestamp at which the sale opens
    pub opening_time: u64,
    pub allowlist_path: PathBuf,
    /// Per-network allowlist files, overriding `allowlist_path`
    pub allowlists: BTreeMap<String, PathBuf>,
    /// Account that deploys and administers the sale
    pub deployer: String,
    /// Account receiving sale proceeds and the default entry beneficiary
    pub beneficiary: String,
    pub land: String,
    pub sand: String,
    pub price_oracle: String,
    pub price_oracle_fallback: String,
    pub stable_asset: String,
    pub stable_asset_fallback: String,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            logical_name: "LandPreSale_2".to_string(),
            artifact: "LandSaleWithETHAndDAI".to_string(),
            bytecode_path: None,
            opening_time: 1_582_718_400,
            allowlist_path: PathBuf::from("data/land_presale_2/lands.json"),
            allowlists: BTreeMap::new(),
            deployer: "deployer".to_string(),
            beneficiary: "land_sale_beneficiary".to_string(),
            land: "Land".to_string(),
            sand: "Sand".to_string(),
            price_oracle: "DAIMedianizer".to_string(),
            price_oracle_fallback: "FakeMedianizer".to_string(),
            stable_asset: "DAI".to_string(),
            stable_asset_fallback: "FakeDai".to_string(),
        }
    }
}

impl SaleConfig {
    pub fn allowlist_for(&self, network: &str) -> &PathBuf {
        self.allowlists.get(network).unwrap_or(&self.allowlist_path)
    }
}

fn default_reserve_contract() -> String {
    "KyberReserve".to_string()
}

fn default_reserve_token() -> String {
    "Sand".to_string()
}

fn default_authority() -> String {
    "deployer".to_string()
}

fn default_depositor() -> String {
    "kyber_depositor".to_string()
}

/// Liquidity reserve settings for one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveConfig {
    /// Addresses approved to receive token withdrawals
    #[serde(default)]
    pub whitelisted_addresses: Vec<Address>,
    pub reserve_admin: Address,
    #[serde(default)]
    pub reserve_operators: Vec<Address>,
    /// Desired native balance of the reserve, in wei
    #[serde(with = "serde_amount")]
    pub wei_deposit_amount: Amount,
    /// Token price used to size the token deposit
    #[serde(with = "serde_amount")]
    pub token_price_in_wei: Amount,
    #[serde(default = "default_reserve_contract")]
    pub reserve: String,
    #[serde(default = "default_reserve_token")]
    pub token: String,
    /// Account that holds reserve admin authority during bootstrap
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default = "default_depositor")]
    pub depositor: String,
}

impl ReserveConfig {
    /// Desired token balance: native deposit converted at the token price
    ///
    /// Computed as `wei * 10^18 / price` without forming the full product, so
    /// only a result or token price beyond `u128` is rejected.
    pub fn token_deposit_amount(&self) -> Result<Amount, ApiError> {
        const UNIT: Amount = 1_000_000_000_000_000_000;
        let price = self.token_price_in_wei;
        if price == 0 {
            return Err(ApiError::ConfigError(
                "token_price_in_wei must be positive".to_string(),
            ));
        }
        let whole = (self.wei_deposit_amount / price).checked_mul(UNIT);
        let fraction = (self.wei_deposit_amount % price)
            .checked_mul(UNIT)
            .map(|scaled| scaled / price);
        whole
            .zip(fraction)
            .and_then(|(whole, fraction)| whole.checked_add(fraction))
            .ok_or_else(|| ApiError::ConfigError("token deposit amount overflows".to_string()))
    }
}

/// Storage paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Deployment registry location, relative to the workspace
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from(".converge/registry")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Network(String, String),
    Reserve(String, String),
    Sale(String),
    Storage(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Network(id, msg) => write!(f, "Network '{}': {}", id, msg),
            ValidationError::Reserve(id, msg) => write!(f, "Reserve for network '{}': {}", id, msg),
            ValidationError::Sale(msg) => write!(f, "Sale: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ConvergeConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (id, network) in &self.networks {
            if !(network.gateway_url.starts_with("http://")
                || network.gateway_url.starts_with("https://"))
            {
                errors.push(ValidationError::Network(
                    id.clone(),
                    format!("gateway_url must be an http(s) URL, got '{}'", network.gateway_url),
                ));
            }
            if network.timeout_secs == 0 {
                errors.push(ValidationError::Network(
                    id.clone(),
                    "timeout_secs must be positive".to_string(),
                ));
            }
        }

        for (id, reserve) in &self.reserves {
            if reserve.token_price_in_wei == 0 {
                errors.push(ValidationError::Reserve(
                    id.clone(),
                    "token_price_in_wei must be positive".to_string(),
                ));
            }
            if reserve.reserve_admin.is_zero() {
                errors.push(ValidationError::Reserve(
                    id.clone(),
                    "reserve_admin must not be the zero address".to_string(),
                ));
            }
        }

        if self.sale.logical_name.is_empty() || self.sale.artifact.is_empty() {
            errors.push(ValidationError::Sale(
                "logical_name and artifact must not be empty".to_string(),
            ));
        }

        // An empty accounts table means no writes are configured at all
        if !self.accounts.is_empty() {
            let sale_accounts = [
                ("deployer", &self.sale.deployer),
                ("beneficiary", &self.sale.beneficiary),
            ];
            for (role, name) in sale_accounts {
                if !self.accounts.contains_key(name) {
                    errors.push(ValidationError::Sale(format!(
                        "{} account '{}' is not configured",
                        role, name
                    )));
                }
            }
        }

        if self.storage.registry_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "registry_path cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every error into one `ConfigError`
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })
    }

    /// Address of a named account
    pub fn account(&self, name: &str) -> Result<Address, ApiError> {
        self.accounts
            .get(name)
            .copied()
            .ok_or_else(|| ApiError::ConfigError(format!("Unknown account '{}'", name)))
    }

    pub fn network(&self, id: &str) -> Result<&NetworkConfig, ApiError> {
        self.networks
            .get(id)
            .ok_or_else(|| ApiError::ConfigError(format!("No settings for network '{}'", id)))
    }

    pub fn reserve(&self, network: &str) -> Result<&ReserveConfig, ApiError> {
        self.reserves.get(network).ok_or_else(|| {
            ApiError::ConfigError(format!("No reserve settings for network '{}'", network))
        })
    }

    /// Whether development fallbacks may be deployed on `network`
    ///
    /// Unknown networks count as live.
    pub fn is_live(&self, network: &str) -> bool {
        self.networks.get(network).map(|n| n.live).unwrap_or(true)
    }
}
