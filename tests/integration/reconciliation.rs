//! Reconciler runs against the scripted ledger

use crate::integration::test_utils::{addr, FakeLedger};
use converge::error::{ApiError, RemoteFailureKind};
use converge::ledger::SignerSpec;
use converge::reconcile::{
    diff, plan, validate_order, AdminTransfer, Asset, DesiredStateDescriptor, Operation, Reconciler,
    Role, RoleGrant, RunStatus, Unit, UnitOutcome,
};
use converge::types::Address;

const RESERVE: &str = "KyberReserve";
const TOKEN: &str = "Sand";

fn admin() -> Address {
    addr(0xad)
}

fn operator() -> Address {
    addr(0x0b)
}

fn reserve_address() -> Address {
    addr(0xee)
}

fn desired() -> DesiredStateDescriptor {
    let mut desired = DesiredStateDescriptor::new(SignerSpec::named("deployer"));
    desired
        .grant(
            RESERVE,
            Role::WithdrawApproval {
                token: addr(0x5a),
            },
            addr(0x77),
        )
        .grant(RESERVE, Role::Operator, operator())
        .grant(RESERVE, Role::Alerter, operator())
        .grant(RESERVE, Role::Alerter, admin())
        .transfer_admin(RESERVE, admin());
    desired
        .fund(Asset::Native, reserve_address(), 1_000, SignerSpec::named("kyber_depositor"))
        .fund(
            Asset::Token {
                contract: TOKEN.to_string(),
            },
            reserve_address(),
            50_000,
            SignerSpec::named("kyber_depositor"),
        );
    desired
}

#[tokio::test]
async fn test_first_run_converges_and_second_run_writes_nothing() {
    let ledger = FakeLedger::new();
    let reconciler = Reconciler::new(&ledger);

    let first = reconciler.reconcile(&desired()).await.unwrap();
    assert_eq!(first.status(), RunStatus::Converged);
    assert_eq!(first.applied(), 7);
    assert_eq!(ledger.admin(RESERVE), Some(admin()));
    assert_eq!(ledger.native_balance_of(reserve_address()), 1_000);
    assert_eq!(ledger.token_balance_of(TOKEN, reserve_address()), 50_000);

    let writes_after_first = ledger.write_count();
    let second = reconciler.reconcile(&desired()).await.unwrap();
    assert_eq!(second.status(), RunStatus::AlreadyConverged);
    assert_eq!(second.skipped(), 7);
    assert_eq!(ledger.write_count(), writes_after_first);
}

#[tokio::test]
async fn test_writes_follow_grant_transfer_fund_order() {
    let ledger = FakeLedger::new();
    Reconciler::new(&ledger).reconcile(&desired()).await.unwrap();

    let log = ledger.write_log();
    let transfer = log
        .iter()
        .position(|w| w == "KyberReserve.transferAdminQuickly")
        .unwrap();
    let last_grant = log
        .iter()
        .rposition(|w| w.starts_with("KyberReserve.add") || w.starts_with("KyberReserve.approve"))
        .unwrap();
    let first_fund = log
        .iter()
        .position(|w| w.starts_with("native->") || w == "Sand.transfer")
        .unwrap();
    assert!(last_grant < transfer);
    assert!(transfer < first_fund);
}

#[tokio::test]
async fn test_existing_members_match_regardless_of_case() {
    let ledger = FakeLedger::new();
    let mixed: Address = "0x000000000000000000000000000000000000000B".parse().unwrap();
    assert_eq!(mixed, operator());
    ledger.add_operator(RESERVE, mixed);

    let mut only_operator = DesiredStateDescriptor::new(SignerSpec::named("deployer"));
    only_operator.grant(RESERVE, Role::Operator, operator());

    let report = Reconciler::new(&ledger).reconcile(&only_operator).await.unwrap();
    assert_eq!(report.status(), RunStatus::AlreadyConverged);
    assert_eq!(ledger.write_count(), 0);
    assert_eq!(ledger.operators(RESERVE).len(), 1);
}

#[tokio::test]
async fn test_partial_failure_is_recorded_and_later_units_still_run() {
    let ledger = FakeLedger::new();
    ledger.fail_writes_to("addAlerter");

    let report = Reconciler::new(&ledger).reconcile(&desired()).await.unwrap();
    assert_eq!(report.status(), RunStatus::Incomplete);
    assert!(!report.is_converged());
    assert_eq!(report.failed(), 2);

    let alerter_key = format!("grant:{}:alerter:{}", RESERVE, admin().canonical());
    match report.outcome_of(&alerter_key) {
        Some(UnitOutcome::Failed { kind, .. }) => {
            assert_eq!(*kind, RemoteFailureKind::RemoteWriteFailure)
        }
        other => panic!("expected failed alerter grant, got {:?}", other),
    }

    // Funding is independent of the failed grant
    assert_eq!(ledger.native_balance_of(reserve_address()), 1_000);
    assert_eq!(ledger.token_balance_of(TOKEN, reserve_address()), 50_000);
    assert_eq!(ledger.operators(RESERVE), vec![operator()]);
}

#[tokio::test]
async fn test_admin_transfer_blocked_until_grants_succeed() {
    let ledger = FakeLedger::new();
    ledger.set_admin(RESERVE, addr(0x01));
    ledger.fail_writes_to("addOperator");

    let first = Reconciler::new(&ledger).reconcile(&desired()).await.unwrap();
    assert_eq!(first.blocked(), 1);
    assert!(matches!(
        first.outcome_of(&format!("admin:{}", RESERVE)),
        Some(UnitOutcome::Blocked { .. })
    ));
    assert_eq!(ledger.admin(RESERVE), Some(addr(0x01)));

    ledger.clear_failures();
    let second = Reconciler::new(&ledger).reconcile(&desired()).await.unwrap();
    assert_eq!(second.status(), RunStatus::Converged);
    // Only the previously failed grant and the admin transfer remain
    assert_eq!(second.applied(), 2);
    assert_eq!(ledger.admin(RESERVE), Some(admin()));
}

#[tokio::test]
async fn test_funding_tops_up_only_the_shortfall() {
    let ledger = FakeLedger::new();
    ledger.set_native_balance(reserve_address(), 400);
    ledger.set_token_balance(TOKEN, reserve_address(), 60_000);

    let mut funding = DesiredStateDescriptor::new(SignerSpec::named("deployer"));
    funding
        .fund(Asset::Native, reserve_address(), 1_000, SignerSpec::named("kyber_depositor"))
        .fund(
            Asset::Token {
                contract: TOKEN.to_string(),
            },
            reserve_address(),
            50_000,
            SignerSpec::named("kyber_depositor"),
        );

    let report = Reconciler::new(&ledger).reconcile(&funding).await.unwrap();
    assert_eq!(report.applied(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(ledger.native_balance_of(reserve_address()), 1_000);
    // Never withdraws an excess
    assert_eq!(ledger.token_balance_of(TOKEN, reserve_address()), 60_000);
}

#[tokio::test]
async fn test_read_failure_is_reported_as_remote_read_failure() {
    let ledger = FakeLedger::new();
    ledger.fail_reads_of("getOperators");

    let report = Reconciler::new(&ledger).reconcile(&desired()).await.unwrap();
    let key = format!("grant:{}:operator:{}", RESERVE, operator().canonical());
    match report.outcome_of(&key) {
        Some(UnitOutcome::Failed { kind, .. }) => {
            assert_eq!(*kind, RemoteFailureKind::RemoteReadFailure)
        }
        other => panic!("expected read failure, got {:?}", other),
    }
    assert!(ledger.operators(RESERVE).is_empty());
    assert!(matches!(
        report.outcome_of(&format!("admin:{}", RESERVE)),
        Some(UnitOutcome::Blocked { .. })
    ));
}

#[tokio::test]
async fn test_snapshot_and_diff_agree_with_reconcile() {
    let ledger = FakeLedger::new();
    ledger.add_operator(RESERVE, operator());

    let reconciler = Reconciler::new(&ledger);
    let observed = reconciler.snapshot(&desired()).await;
    assert_eq!(observed.len(), 7);

    let pending = diff(&desired(), &observed);
    assert_eq!(pending.len(), 6);
    assert!(validate_order(&pending).is_ok());
    assert!(!pending.iter().any(|op| matches!(
        op,
        Operation::GrantRole(RoleGrant {
            role: Role::Operator,
            ..
        })
    )));
    assert_eq!(ledger.write_count(), 0);
}

#[test]
fn test_grant_after_admin_transfer_is_rejected() {
    let mut units = plan(&desired());
    let transfer = Unit::TransferAdmin(AdminTransfer {
        contract: RESERVE.to_string(),
        new_admin: admin(),
    });
    units.insert(0, transfer);

    let err = validate_order(&units).unwrap_err();
    assert!(matches!(err, ApiError::OrderingViolation(_)));
}

#[tokio::test]
async fn test_existing_withdraw_approval_is_read_by_mapping_key() {
    let ledger = FakeLedger::new();
    ledger.approve_withdrawal(RESERVE, addr(0x5a), addr(0x77));

    let report = Reconciler::new(&ledger).reconcile(&desired()).await.unwrap();
    let approval = &report.units[0];
    assert!(approval.key.starts_with("grant:KyberReserve:withdraw-approval"));
    assert_eq!(approval.outcome, UnitOutcome::Skipped);
    assert!(!ledger
        .write_log()
        .contains(&"KyberReserve.approveWithdrawAddress".to_string()));
}
