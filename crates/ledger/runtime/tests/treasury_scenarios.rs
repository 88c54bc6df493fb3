//! Treasury scenarios: allocation, operator withdrawals, scheduled payments.

mod common;

use common::*;
use ledger_runtime::ledger_types::{
    Amount, ErrorKind, LedgerError, PaymentId, Project, TokenBalance,
};

fn allocate(w: &World, project: Project, amount: u128, withdrawal_limit: u128, daily_limit: u128) {
    w.treasury
        .allocate_budget(
            &addr("owner"),
            project,
            &usdc(),
            Amount::new(amount),
            Amount::new(withdrawal_limit),
            Amount::new(daily_limit),
        )
        .unwrap();
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[test]
fn allocation_round_trip() {
    let w = World::new();
    allocate(&w, Project::Protocol, 50_000, 5_000, 10_000);

    let details = w.treasury.get_budget_details(Project::Protocol).unwrap();
    assert_eq!(details.allocated_amount, Amount::new(50_000));
    assert_eq!(details.remaining_amount, Amount::new(50_000));
    assert!(details.spent_amount.is_zero());
    assert!(details.active);

    assert_eq!(
        w.treasury.get_token_balance(Project::Protocol, &usdc()).unwrap(),
        TokenBalance {
            balance: Amount::new(50_000),
            total_allocated: Amount::new(50_000),
            total_spent: Amount::ZERO,
            supported: true,
        }
    );
    assert_eq!(w.treasury.custody_balance(&usdc()).unwrap(), Amount::new(50_000));
    assert_eq!(w.token.balance(&usdc(), &addr("vault")), Amount::new(50_000));
    assert_eq!(w.token.balance(&usdc(), &addr("owner")), Amount::new(950_000));
}

#[test]
fn untouched_projects_report_empty_budgets() {
    let w = World::new();
    for project in Project::ALL {
        let details = w.treasury.get_budget_details(project).unwrap();
        assert_eq!(details.project, project);
        assert!(!details.active);
        assert!(details.allocated_amount.is_zero());
    }
}

// ---------------------------------------------------------------------------
// Daily window
// ---------------------------------------------------------------------------

#[test]
fn daily_limit_resets_after_window() {
    let w = World::new();
    allocate(&w, Project::Dex, 100_000, 6_000, 10_000);
    w.treasury
        .add_project_operator(&addr("owner"), Project::Dex, addr("op"))
        .unwrap();

    w.treasury
        .withdraw_funds(&addr("op"), Project::Dex, &usdc(), &addr("payee"), Amount::new(6_000))
        .unwrap();

    w.clock.advance(DAY - 1);
    let err = w
        .treasury
        .withdraw_funds(&addr("op"), Project::Dex, &usdc(), &addr("payee"), Amount::new(4_001))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Limit);
    assert!(matches!(
        err,
        LedgerError::DailyLimitExceeded { spent, .. } if spent == Amount::new(6_000)
    ));

    w.clock.advance(1);
    w.treasury
        .withdraw_funds(&addr("op"), Project::Dex, &usdc(), &addr("payee"), Amount::new(6_000))
        .unwrap();
    w.treasury
        .withdraw_funds(&addr("op"), Project::Dex, &usdc(), &addr("payee"), Amount::new(4_000))
        .unwrap();

    let details = w.treasury.get_budget_details(Project::Dex).unwrap();
    assert_eq!(details.daily_spent, Amount::new(10_000));
    assert_eq!(details.last_withdrawal_time, START + DAY);
    assert_eq!(details.spent_amount, Amount::new(16_000));
    assert_eq!(w.token.balance(&usdc(), &addr("payee")), Amount::new(16_000));
}

#[test]
fn removed_operator_loses_withdrawal_rights() {
    let w = World::new();
    allocate(&w, Project::App, 10_000, 1_000, 1_000);
    w.treasury
        .add_project_operator(&addr("owner"), Project::App, addr("op"))
        .unwrap();
    w.treasury
        .remove_project_operator(&addr("owner"), Project::App, addr("op"))
        .unwrap();

    let err = w
        .treasury
        .withdraw_funds(&addr("op"), Project::App, &usdc(), &addr("op"), Amount::new(1))
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::NotProjectOperator {
            caller: addr("op"),
            project: Project::App,
        }
    );
}

// ---------------------------------------------------------------------------
// Scheduled payments
// ---------------------------------------------------------------------------

#[test]
fn scheduled_payment_runs_to_exhaustion() {
    let w = World::new();
    allocate(&w, Project::Protocol, 1_000, 0, 0);

    let id = w
        .treasury
        .create_scheduled_payment(
            &addr("owner"),
            Project::Protocol,
            &addr("contributor"),
            &usdc(),
            Amount::new(100),
            86_400,
            3,
        )
        .unwrap();
    assert_eq!(id, PaymentId(0));
    let created = w.treasury.get_scheduled_payment(id).unwrap();
    assert_eq!(created.next_payment_time, START + 86_400);
    assert_eq!(created.remaining_payments, 3);

    w.clock.advance(86_399);
    let err = w.treasury.execute_scheduled_payment(&addr("anyone"), id).unwrap_err();
    assert!(matches!(err, LedgerError::PaymentNotDue { .. }));
    assert_eq!(err.kind(), ErrorKind::State);

    w.clock.advance(1);
    w.treasury.execute_scheduled_payment(&addr("anyone"), id).unwrap();
    let after_first = w.treasury.get_scheduled_payment(id).unwrap();
    assert_eq!(after_first.remaining_payments, 2);
    assert_eq!(after_first.next_payment_time, created.next_payment_time + 86_400);
    assert!(after_first.active);

    // not due again until the next slot
    assert!(w.treasury.execute_scheduled_payment(&addr("anyone"), id).is_err());

    for _ in 0..2 {
        w.clock.advance(86_400);
        w.treasury.execute_scheduled_payment(&addr("anyone"), id).unwrap();
    }

    let done = w.treasury.get_scheduled_payment(id).unwrap();
    assert_eq!(done.remaining_payments, 0);
    assert!(!done.active);
    assert_eq!(done.payments_made(), 3);

    w.clock.advance(86_400);
    assert_eq!(
        w.treasury.execute_scheduled_payment(&addr("anyone"), id).unwrap_err(),
        LedgerError::PaymentExhausted(id)
    );

    assert_eq!(w.token.balance(&usdc(), &addr("contributor")), Amount::new(300));
    let details = w.treasury.get_budget_details(Project::Protocol).unwrap();
    assert_eq!(details.spent_amount, Amount::new(300));
    assert_eq!(details.remaining_amount, Amount::new(700));
    assert_eq!(w.journal.events_named("scheduled_payment_executed").len(), 3);
}

#[test]
fn scheduled_payment_does_not_require_operator_limits() {
    let w = World::new();
    // no limits set: operators could not withdraw at all
    allocate(&w, Project::Analyst, 500, 0, 0);
    let id = w
        .treasury
        .create_scheduled_payment(
            &addr("owner"),
            Project::Analyst,
            &addr("oracle-team"),
            &usdc(),
            Amount::new(250),
            60,
            2,
        )
        .unwrap();

    w.clock.advance(60);
    w.treasury.execute_scheduled_payment(&addr("cron"), id).unwrap();
    w.clock.advance(60);
    w.treasury.execute_scheduled_payment(&addr("cron"), id).unwrap();

    let balance = w.treasury.get_token_balance(Project::Analyst, &usdc()).unwrap();
    assert!(balance.balance.is_zero());
    assert!(balance.is_consistent());
    assert!(w.treasury.active_payments().unwrap().is_empty());
    assert_eq!(w.treasury.payment_count().unwrap(), 1);
}

#[test]
fn paused_treasury_rejects_payments_but_allows_emergency_exit() {
    let w = World::new();
    allocate(&w, Project::Ferry, 10_000, 0, 0);
    let id = w
        .treasury
        .create_scheduled_payment(
            &addr("owner"),
            Project::Ferry,
            &addr("vendor"),
            &usdc(),
            Amount::new(10),
            60,
            1,
        )
        .unwrap();
    w.clock.advance(60);

    w.treasury.pause(&addr("owner")).unwrap();
    assert_eq!(
        w.treasury.execute_scheduled_payment(&addr("cron"), id).unwrap_err(),
        LedgerError::Paused
    );
    w.treasury
        .emergency_withdraw(
            &addr("owner"),
            &usdc(),
            &addr("cold-wallet"),
            Amount::new(10_000),
            "key compromise",
        )
        .unwrap();
    assert!(w.treasury.custody_balance(&usdc()).unwrap().is_zero());
    assert_eq!(w.token.balance(&usdc(), &addr("cold-wallet")), Amount::new(10_000));
    assert_eq!(w.journal.events_named("emergency_withdrawal").len(), 1);
}
