//! CLI command-name contract for logging spans.

use crate::cli::parse::{
    AllowlistCommands, Commands, ConfigCommands, DeployCommands, ReconcileCommands,
    RegistryCommands,
};

/// Command name string (e.g. "allowlist.build", "reconcile.apply").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Allowlist { command } => format!("allowlist.{}", allowlist_command_name(command)),
        Commands::Fingerprint { .. } => "fingerprint".to_string(),
        Commands::Deploy { command } => format!("deploy.{}", deploy_command_name(command)),
        Commands::Registry { command } => format!("registry.{}", registry_command_name(command)),
        Commands::Reconcile { command } => {
            format!("reconcile.{}", reconcile_command_name(command))
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show { .. } => "config.show".to_string(),
        },
    }
}

pub fn allowlist_command_name(command: &AllowlistCommands) -> &'static str {
    match command {
        AllowlistCommands::Build { .. } => "build",
        AllowlistCommands::Verify { .. } => "verify",
    }
}

pub fn deploy_command_name(command: &DeployCommands) -> &'static str {
    match command {
        DeployCommands::Sale { .. } => "sale",
    }
}

pub fn registry_command_name(command: &RegistryCommands) -> &'static str {
    match command {
        RegistryCommands::List { .. } => "list",
        RegistryCommands::Show { .. } => "show",
        RegistryCommands::History { .. } => "history",
    }
}

pub fn reconcile_command_name(command: &ReconcileCommands) -> &'static str {
    match command {
        ReconcileCommands::Plan { .. } => "plan",
        ReconcileCommands::Apply { .. } => "apply",
    }
}

/// Whether the command writes to the ledger
pub fn is_mutating(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Deploy { .. }
            | Commands::Reconcile {
                command: ReconcileCommands::Apply { .. }
            }
    )
}
