//! Per-project budgets and per-(project, token) custody balances
//!
//! A project's budget bounds what its operators can withdraw. Budgets are
//! never deleted; deactivation freezes them.

use crate::{Address, Amount, LedgerError, LedgerResult, Project, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Budget of a single project
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Total ever allocated to the project
    pub allocated_amount: Amount,
    /// Total ever spent by the project (withdrawals and scheduled payments)
    pub spent_amount: Amount,
    /// Per-call cap for plain operators
    pub withdrawal_limit: Amount,
    /// Per-window cap for plain operators
    pub daily_limit: Amount,
    /// Operator spend inside the current window
    pub daily_spent: Amount,
    /// Anchor of the current operator window
    pub last_withdrawal_time: Timestamp,
    pub active: bool,
    /// Addresses with project-scoped withdrawal rights
    pub operators: BTreeSet<Address>,
}

impl Budget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocated minus spent.
    pub fn remaining(&self) -> Amount {
        self.allocated_amount.saturating_sub(self.spent_amount)
    }

    pub fn is_operator(&self, who: &Address) -> bool {
        self.operators.contains(who)
    }

    /// Replace the limits, leaving a limit unchanged when its argument is zero.
    pub fn update_limits(&mut self, withdrawal_limit: Amount, daily_limit: Amount) {
        if !withdrawal_limit.is_zero() {
            self.withdrawal_limit = withdrawal_limit;
        }
        if !daily_limit.is_zero() {
            self.daily_limit = daily_limit;
        }
    }

    /// Daily spend as seen by a withdrawal at `now`: zero once the window
    /// anchored at `last_withdrawal_time` has elapsed.
    pub fn effective_daily_spent(&self, now: Timestamp, window: u64) -> Amount {
        if now >= self.last_withdrawal_time.saturating_add(window) {
            Amount::ZERO
        } else {
            self.daily_spent
        }
    }

    /// Check a plain operator's withdrawal against both caps.
    ///
    /// Returns the daily spend the budget would hold after the withdrawal.
    pub fn check_operator_withdrawal(
        &self,
        amount: Amount,
        now: Timestamp,
        window: u64,
    ) -> LedgerResult<Amount> {
        if amount > self.withdrawal_limit {
            return Err(LedgerError::WithdrawalLimitExceeded {
                amount,
                limit: self.withdrawal_limit,
            });
        }

        let spent = self.effective_daily_spent(now, window);
        match spent.checked_add(amount) {
            Some(total) if total <= self.daily_limit => Ok(total),
            _ => Err(LedgerError::DailyLimitExceeded {
                amount,
                spent,
                limit: self.daily_limit,
            }),
        }
    }

    pub fn details(&self, project: Project) -> BudgetDetails {
        BudgetDetails {
            project,
            allocated_amount: self.allocated_amount,
            spent_amount: self.spent_amount,
            remaining_amount: self.remaining(),
            withdrawal_limit: self.withdrawal_limit,
            daily_limit: self.daily_limit,
            daily_spent: self.daily_spent,
            last_withdrawal_time: self.last_withdrawal_time,
            active: self.active,
            operator_count: self.operators.len(),
        }
    }
}

/// Read-only snapshot of a project's budget
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetDetails {
    pub project: Project,
    pub allocated_amount: Amount,
    pub spent_amount: Amount,
    pub remaining_amount: Amount,
    pub withdrawal_limit: Amount,
    pub daily_limit: Amount,
    pub daily_spent: Amount,
    pub last_withdrawal_time: Timestamp,
    pub active: bool,
    pub operator_count: usize,
}

/// Custody balance of one token for one project.
///
/// `balance == total_allocated - total_spent` at all times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub balance: Amount,
    pub total_allocated: Amount,
    pub total_spent: Amount,
    pub supported: bool,
}

impl TokenBalance {
    pub fn new() -> Self {
        Self::default()
    }

    /// The conservation invariant.
    pub fn is_consistent(&self) -> bool {
        self.total_allocated.checked_sub(self.total_spent) == Some(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400;

    fn budget() -> Budget {
        Budget {
            allocated_amount: Amount::new(10_000),
            withdrawal_limit: Amount::new(500),
            daily_limit: Amount::new(800),
            active: true,
            ..Budget::default()
        }
    }

    #[test]
    fn test_remaining() {
        let mut b = budget();
        b.spent_amount = Amount::new(2_500);
        assert_eq!(b.remaining(), Amount::new(7_500));
    }

    #[test]
    fn test_zero_limit_keeps_existing() {
        let mut b = budget();
        b.update_limits(Amount::ZERO, Amount::new(1_000));
        assert_eq!(b.withdrawal_limit, Amount::new(500));
        assert_eq!(b.daily_limit, Amount::new(1_000));
    }

    #[test]
    fn test_per_call_limit() {
        let b = budget();
        let err = b
            .check_operator_withdrawal(Amount::new(501), 0, DAY)
            .unwrap_err();
        assert!(matches!(err, LedgerError::WithdrawalLimitExceeded { .. }));
    }

    #[test]
    fn test_daily_window() {
        let mut b = budget();
        b.daily_spent = Amount::new(500);
        b.last_withdrawal_time = 1_000;

        // Inside the window the spend accumulates
        assert!(b
            .check_operator_withdrawal(Amount::new(400), 1_000 + DAY - 1, DAY)
            .is_err());
        assert_eq!(
            b.check_operator_withdrawal(Amount::new(300), 1_000 + DAY - 1, DAY)
                .unwrap(),
            Amount::new(800)
        );

        // Window elapsed: resets
        assert_eq!(
            b.check_operator_withdrawal(Amount::new(400), 1_000 + DAY, DAY)
                .unwrap(),
            Amount::new(400)
        );
    }

    #[test]
    fn test_token_balance_consistency() {
        let tb = TokenBalance {
            balance: Amount::new(70),
            total_allocated: Amount::new(100),
            total_spent: Amount::new(30),
            supported: true,
        };
        assert!(tb.is_consistent());
        assert!(!TokenBalance {
            balance: Amount::new(71),
            ..tb
        }
        .is_consistent());
    }
}
