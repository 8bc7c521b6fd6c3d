//! Live reconciliation against a ledger client
//!
//! Each unit is observed immediately before its decision, so the last
//! observation is never stale by more than one unit. Failures are recorded
//! per unit and the run continues; only an ordering violation aborts it.

use crate::error::{ApiError, LedgerError};
use crate::ledger::{LedgerClient, Receipt, SignerSpec, Value};
use crate::reconcile::diff::{diff_unit, is_blocked, plan, validate_order};
use crate::reconcile::report::{ReconciliationReport, UnitOutcome};
use crate::reconcile::{
    withdraw_approval_key, Asset, DesiredStateDescriptor, Observation, ObservedState, Operation,
    Role, RoleGrant, Unit,
};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

/// Read the remote value a unit's decision depends on
pub async fn observe(ledger: &dyn LedgerClient, unit: &Unit) -> Result<Observation, LedgerError> {
    match unit {
        Unit::Grant(RoleGrant {
            contract,
            role: role @ Role::WithdrawApproval { token },
            principal,
        }) => {
            let function = role.read_function();
            let key = withdraw_approval_key(token, principal);
            let value = ledger.read(contract, function, &[Value::Bytes32(key)]).await?;
            Ok(Observation::Flag(value.as_bool(contract, function)?))
        }
        Unit::Grant(RoleGrant { contract, role, .. }) => {
            let function = role.read_function();
            let value = ledger.read(contract, function, &[]).await?;
            Ok(Observation::Members(value.as_address_list(contract, function)?))
        }
        Unit::TransferAdmin(transfer) => {
            let value = ledger.read(&transfer.contract, "admin", &[]).await?;
            Ok(Observation::Admin(value.as_address(&transfer.contract, "admin")?))
        }
        Unit::Fund(target) => match &target.asset {
            Asset::Native => Ok(Observation::Balance(
                ledger.native_balance(&target.holder).await?,
            )),
            Asset::Token { contract } => {
                let value = ledger
                    .read(contract, "balanceOf", &[Value::Address(target.holder)])
                    .await?;
                Ok(Observation::Balance(value.as_uint(contract, "balanceOf")?))
            }
        },
    }
}

/// Issue the single write for an operation
pub async fn apply(
    ledger: &dyn LedgerClient,
    authority: &SignerSpec,
    operation: &Operation,
) -> Result<Receipt, LedgerError> {
    match operation {
        Operation::GrantRole(grant) => {
            let args = match &grant.role {
                Role::WithdrawApproval { token } => vec![
                    Value::Address(*token),
                    Value::Address(grant.principal),
                    Value::Bool(true),
                ],
                _ => vec![Value::Address(grant.principal)],
            };
            ledger
                .execute(&grant.contract, authority, grant.role.grant_function(), &args)
                .await
        }
        Operation::TransferAdmin(transfer) => {
            ledger
                .execute(
                    &transfer.contract,
                    authority,
                    "transferAdminQuickly",
                    &[Value::Address(transfer.new_admin)],
                )
                .await
        }
        Operation::Fund { target, shortfall } => match &target.asset {
            Asset::Native => {
                ledger
                    .raw_transfer(&target.holder, &target.funder, *shortfall)
                    .await
            }
            Asset::Token { contract } => {
                ledger
                    .execute(
                        contract,
                        &target.funder,
                        "transfer",
                        &[Value::Address(target.holder), Value::Uint(*shortfall)],
                    )
                    .await
            }
        },
    }
}

/// Drives a desired state onto the ledger, one unit at a time
pub struct Reconciler<'a> {
    ledger: &'a dyn LedgerClient,
}

impl<'a> Reconciler<'a> {
    pub fn new(ledger: &'a dyn LedgerClient) -> Self {
        Self { ledger }
    }

    /// Observe every unit without writing anything
    ///
    /// Units whose read fails are left out of the snapshot.
    pub async fn snapshot(&self, desired: &DesiredStateDescriptor) -> ObservedState {
        let mut observed = ObservedState::new();
        for unit in plan(desired) {
            match observe(self.ledger, &unit).await {
                Ok(observation) => observed.insert(&unit, observation),
                Err(e) => warn!(unit = %unit, error = %e, "Observation failed"),
            }
        }
        observed
    }

    /// Run every unit to convergence, recording a per-unit outcome
    ///
    /// A second run over an unchanged ledger issues no writes.
    #[instrument(skip(self, desired), fields(units = tracing::field::Empty))]
    pub async fn reconcile(
        &self,
        desired: &DesiredStateDescriptor,
    ) -> Result<ReconciliationReport, ApiError> {
        let units = plan(desired);
        validate_order(&units)?;
        tracing::Span::current().record("units", units.len());

        let mut report = ReconciliationReport::new();
        let mut failed_contracts: BTreeSet<String> = BTreeSet::new();

        for unit in units {
            if let Unit::TransferAdmin(transfer) = &unit {
                if is_blocked(transfer, &failed_contracts) {
                    warn!(contract = %transfer.contract, "Admin transfer blocked by failed grant");
                    report.record(
                        &unit,
                        UnitOutcome::Blocked {
                            reason: format!("a grant on {} failed", transfer.contract),
                        },
                    );
                    continue;
                }
            }

            let outcome = self.run_unit(&unit, &desired.authority).await;
            if let (Unit::Grant(grant), true) = (&unit, outcome.is_failure()) {
                failed_contracts.insert(grant.contract.clone());
            }
            report.record(&unit, outcome);
        }

        info!(
            applied = report.applied(),
            skipped = report.skipped(),
            failed = report.failed(),
            blocked = report.blocked(),
            "Reconciliation finished: {}",
            report.status()
        );
        Ok(report)
    }

    async fn run_unit(&self, unit: &Unit, authority: &SignerSpec) -> UnitOutcome {
        let observation = match observe(self.ledger, unit).await {
            Ok(observation) => observation,
            Err(e) => {
                warn!(unit = %unit, error = %e, "Read failed");
                return UnitOutcome::failed(&e);
            }
        };

        let operation = match diff_unit(unit, &observation) {
            Some(operation) => operation,
            None => {
                info!("{} already converged, skipping", unit);
                return UnitOutcome::Skipped;
            }
        };

        debug!(unit = %unit, "Applying");
        match apply(self.ledger, authority, &operation).await {
            Ok(receipt) => {
                info!(tx = %receipt.tx_hash, gas_used = receipt.gas_used, "{} applied", unit);
                UnitOutcome::Applied {
                    tx_hash: receipt.tx_hash,
                }
            }
            Err(e) => {
                warn!(unit = %unit, error = %e, "Write failed");
                UnitOutcome::failed(&e)
            }
        }
    }
}
