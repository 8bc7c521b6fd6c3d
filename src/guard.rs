//! Network gating for steps that must not run on production networks

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use tracing::warn;

fn default_protected() -> Vec<String> {
    vec!["1".to_string(), "4".to_string(), "314159".to_string()]
}

fn default_local() -> Vec<String> {
    vec!["31337".to_string()]
}

/// Guard settings (`[guard]` in config)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Network ids on which guarded steps refuse to run
    #[serde(default = "default_protected")]
    pub protected_networks: Vec<String>,

    /// Local development networks; reserve bootstrap does nothing there
    #[serde(default = "default_local")]
    pub local_networks: Vec<String>,

    /// Override for protected networks
    #[serde(default)]
    pub unblocked: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            protected_networks: default_protected(),
            local_networks: default_local(),
            unblocked: false,
        }
    }
}

/// Decides whether a named step may run on a network
#[derive(Debug, Clone)]
pub struct NetworkGuard {
    config: GuardConfig,
}

impl NetworkGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub fn unblock(mut self) -> Self {
        self.config.unblocked = true;
        self
    }

    pub fn is_protected(&self, network: &str) -> bool {
        self.config.protected_networks.iter().any(|n| n == network)
    }

    pub fn is_local(&self, network: &str) -> bool {
        self.config.local_networks.iter().any(|n| n == network)
    }

    /// Fail with `ProtectedNetwork` unless the step may run
    pub fn check(&self, network: &str, step: &str) -> Result<(), ApiError> {
        if !self.is_protected(network) {
            return Ok(());
        }
        if self.config.unblocked {
            warn!(network, step, "Running {} on protected network {}", step, network);
            return Ok(());
        }
        Err(ApiError::ProtectedNetwork {
            network: network.to_string(),
            step: step.to_string(),
        })
    }
}

impl Default for NetworkGuard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}
