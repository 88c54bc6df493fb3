//! Governance acting on the treasury through the `Authority` capability.

mod common;

use common::*;
use ledger_runtime::ledger_types::{Amount, ErrorKind, LedgerEvent, Project, VoteSupport};
use ledger_runtime::Authority;

#[test]
fn executed_proposal_is_carried_out_by_governance_identity() {
    let w = World::new();
    let governance = w.governance.identity().clone();
    assert!(w.governance.is_governance(&governance));

    // governance holds its own funds for grants
    w.token.mint(&usdc(), &governance, Amount::new(20_000)).unwrap();
    w.token.approve(&usdc(), &governance, &addr("vault"), Amount::new(20_000));

    let payload = br#"{"allocate":{"project":"app","amount":20000}}"#;
    let id = w
        .governance
        .create_proposal(&addr("alice"), "Fund app team", "Quarterly grant", Project::App, payload)
        .unwrap();
    w.governance.vote(&addr("bob"), id, VoteSupport::For).unwrap();
    w.governance.vote(&addr("carol"), id, VoteSupport::For).unwrap();
    w.clock.set(START + 9 * DAY + 1);

    let auth = w.governance.execute_proposal(&addr("keeper"), id).unwrap();
    assert_eq!(auth.target_project, Project::App);

    // the app adapter acts on the authorization using the governance identity
    w.treasury
        .allocate_budget(
            &governance,
            auth.target_project,
            &usdc(),
            Amount::new(20_000),
            Amount::new(2_000),
            Amount::new(5_000),
        )
        .unwrap();
    w.treasury
        .add_project_operator(&governance, Project::App, addr("app-lead"))
        .unwrap();
    w.treasury
        .withdraw_funds(
            &addr("app-lead"),
            Project::App,
            &usdc(),
            &addr("designer"),
            Amount::new(2_000),
        )
        .unwrap();

    let details = w.treasury.get_budget_details(Project::App).unwrap();
    assert_eq!(details.allocated_amount, Amount::new(20_000));
    assert_eq!(details.spent_amount, Amount::new(2_000));
    assert_eq!(details.operator_count, 1);

    let allocated = w.journal.events_named("budget_allocated");
    assert!(matches!(
        &allocated[0],
        LedgerEvent::BudgetAllocated { allocated_by, .. } if *allocated_by == governance
    ));
}

#[test]
fn other_callers_are_not_governance() {
    let w = World::new();
    for caller in ["alice", "keeper", "vault"] {
        let err = w
            .treasury
            .add_project_operator(&addr(caller), Project::Dex, addr("op"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }
    // governance may manage operators, but only the owner may use the emergency exit
    w.treasury
        .add_project_operator(&addr("governance"), Project::Dex, addr("op"))
        .unwrap();
    assert_eq!(
        w.treasury
            .emergency_withdraw(&addr("governance"), &usdc(), &addr("x"), Amount::new(1), "no")
            .unwrap_err()
            .kind(),
        ErrorKind::Authorization
    );
}

#[test]
fn governance_and_treasury_pause_independently() {
    let w = World::new();
    w.governance.pause(&addr("owner")).unwrap();
    assert!(w.governance.is_paused().unwrap());
    assert!(!w.treasury.is_paused().unwrap());

    w.treasury
        .allocate_budget(
            &addr("owner"),
            Project::Dex,
            &usdc(),
            Amount::new(1),
            Amount::ZERO,
            Amount::ZERO,
        )
        .unwrap();
}
