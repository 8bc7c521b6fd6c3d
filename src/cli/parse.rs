//! CLI parse: clap types for converge. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Converge CLI - idempotent ledger bootstrap
#[derive(Parser)]
#[command(name = "converge")]
#[command(about = "Deploy and configure ledger contracts idempotently")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file layered over the workspace configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Network id (defaults to `default_network` from config)
    #[arg(long, global = true)]
    pub network: Option<String>,

    /// Allow guarded steps on protected networks
    #[arg(long, global = true)]
    pub unblock: bool,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and verify sale allowlists
    Allowlist {
        #[command(subcommand)]
        command: AllowlistCommands,
    },
    /// Show the sale fingerprint and whether a deploy would reuse or redeploy
    Fingerprint {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Deploy contracts
    Deploy {
        #[command(subcommand)]
        command: DeployCommands,
    },
    /// Inspect the deployment registry
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },
    /// Converge reserve state
    Reconcile {
        #[command(subcommand)]
        command: ReconcileCommands,
    },
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AllowlistCommands {
    /// Build the allowlist tree and print its root
    Build {
        /// Input JSON (defaults to the configured allowlist for the network)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Write the proof bundle to this file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Verify every proof in a bundle against its root
    Verify {
        /// Proof bundle JSON
        bundle: PathBuf,
        /// Root to verify against instead of the bundle's own
        #[arg(long)]
        root: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeployCommands {
    /// Deploy the land presale, or reuse the recorded instance
    Sale {
        /// Skip the confirmation prompt on protected networks
        #[arg(long)]
        yes: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum RegistryCommands {
    /// Current deployments on the network
    List {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Current record for one logical name
    Show {
        name: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Every record ever written for one logical name
    History {
        name: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReconcileCommands {
    /// Read current state and list the writes a run would issue
    Plan {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Converge the reserve
    Apply {
        /// Skip the confirmation prompt on protected networks
        #[arg(long)]
        yes: bool,
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the merged configuration after every layer is applied
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
}
