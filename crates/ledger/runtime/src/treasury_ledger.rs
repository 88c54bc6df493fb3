//! Treasury Ledger: per-project budgets, custody balances, scheduled payments
//!
//! The ledger holds custody of allocated tokens under its own address and
//! keeps three layers of bookkeeping in step:
//!
//! - `Budget` per project (allocated, spent, operator limits)
//! - `TokenBalance` per (project, token), with `balance == allocated - spent`
//! - a custody total per token, bounding every outflow
//!
//! Value only moves through the injected [`TokenTransfer`]. Outflows update
//! the books first and roll them back if the transfer fails.

use crate::access_control::{AccessControl, AdminAction};
use crate::authority::Authority;
use crate::clock::{Clock, SystemClock};
use crate::events::{publish, EventJournal, EventSink};
use crate::guard::OperationGuard;
use crate::token::TokenTransfer;
use ledger_types::{
    Address, Amount, Budget, BudgetDetails, LedgerError, LedgerEvent, LedgerResult, PaymentId,
    Project, ScheduledPayment, Timestamp, TokenBalance, TokenId, TreasuryConfig,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct TreasuryState {
    access: AccessControl,
    config: TreasuryConfig,
    budgets: BTreeMap<Project, Budget>,
    balances: HashMap<(Project, TokenId), TokenBalance>,
    custody_totals: HashMap<TokenId, Amount>,
    /// Indexed by `PaymentId`
    payments: Vec<ScheduledPayment>,
}

impl TreasuryState {
    fn budget_mut(&mut self, project: Project) -> &mut Budget {
        self.budgets.entry(project).or_default()
    }

    fn token_balance(&self, project: Project, token: &TokenId) -> TokenBalance {
        self.balances
            .get(&(project, token.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn custody(&self, token: &TokenId) -> Amount {
        self.custody_totals.get(token).copied().unwrap_or_default()
    }

    fn payment(&self, id: PaymentId) -> LedgerResult<&ScheduledPayment> {
        usize::try_from(id.0)
            .ok()
            .and_then(|index| self.payments.get(index))
            .ok_or(LedgerError::PaymentNotFound(id))
    }

    fn payment_mut(&mut self, id: PaymentId) -> LedgerResult<&mut ScheduledPayment> {
        usize::try_from(id.0)
            .ok()
            .and_then(|index| self.payments.get_mut(index))
            .ok_or(LedgerError::PaymentNotFound(id))
    }

    /// Owner, or governance as reported by the authority beforehand.
    fn require_privileged(&self, caller: &Address, is_governance: bool) -> LedgerResult<()> {
        if is_governance || self.access.is_owner(caller) {
            Ok(())
        } else {
            warn!(caller = %caller, "Privileged treasury call rejected");
            Err(LedgerError::NotPrivileged {
                caller: caller.clone(),
            })
        }
    }

    /// Check that a project outflow of `amount` is covered by both the
    /// project's token balance and the custody total.
    fn check_outflow(&self, project: Project, token: &TokenId, amount: Amount) -> LedgerResult<()> {
        let balance = self.token_balance(project, token);
        if amount > balance.balance {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: balance.balance,
            });
        }
        let custody = self.custody(token);
        if amount > custody {
            return Err(LedgerError::InsufficientCustody {
                token: token.clone(),
                required: amount,
                available: custody,
            });
        }
        Ok(())
    }

    /// Debit a checked project outflow from every layer of the books.
    fn debit(&mut self, project: Project, token: &TokenId, amount: Amount) -> LedgerResult<()> {
        let mut balance = self.token_balance(project, token);
        balance.balance = balance.balance.try_sub(amount)?;
        balance.total_spent = balance.total_spent.try_add(amount, "token spent")?;

        let budget_spent = self
            .budgets
            .get(&project)
            .map(|b| b.spent_amount)
            .unwrap_or_default()
            .try_add(amount, "budget spent")?;
        let custody = self.custody(token).try_sub(amount)?;

        self.balances.insert((project, token.clone()), balance);
        self.budget_mut(project).spent_amount = budget_spent;
        self.custody_totals.insert(token.clone(), custody);
        Ok(())
    }

    /// Capture the entries an outflow of `token` is about to touch.
    fn undo_record(&self, project: Option<Project>, token: &TokenId) -> OutflowUndo {
        OutflowUndo {
            token: token.clone(),
            custody: self.custody(token),
            project: project.map(|project| {
                let budget = self.budgets.get(&project);
                ProjectUndo {
                    project,
                    balance: self.token_balance(project, token),
                    spent_amount: budget.map(|b| b.spent_amount).unwrap_or_default(),
                    daily_spent: budget.map(|b| b.daily_spent).unwrap_or_default(),
                    last_withdrawal_time: budget
                        .map(|b| b.last_withdrawal_time)
                        .unwrap_or_default(),
                }
            }),
            payment: None,
        }
    }

    fn restore(&mut self, undo: OutflowUndo) {
        if let Some(entry) = undo.project {
            self.balances
                .insert((entry.project, undo.token.clone()), entry.balance);
            let budget = self.budget_mut(entry.project);
            budget.spent_amount = entry.spent_amount;
            budget.daily_spent = entry.daily_spent;
            budget.last_withdrawal_time = entry.last_withdrawal_time;
        }
        if let Some(id) = undo.payment {
            if let Ok(payment) = self.payment_mut(id) {
                payment.rewind();
            }
        }
        self.custody_totals.insert(undo.token, undo.custody);
    }
}

/// Pre-outflow values of every book entry an outflow mutates.
#[derive(Debug)]
struct OutflowUndo {
    token: TokenId,
    custody: Amount,
    /// Absent for emergency withdrawals, which touch custody only
    project: Option<ProjectUndo>,
    /// Scheduled payment advanced by the outflow
    payment: Option<PaymentId>,
}

#[derive(Debug)]
struct ProjectUndo {
    project: Project,
    balance: TokenBalance,
    spent_amount: Amount,
    daily_spent: Amount,
    last_withdrawal_time: Timestamp,
}

/// New totals computed before an allocation's pull, applied after it.
struct AllocationPlan {
    allocated: Amount,
    balance: TokenBalance,
    custody: Amount,
}

/// Caller capacity for a project withdrawal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WithdrawRole {
    Privileged,
    /// Plain project operator, bound by the budget's limits
    Operator,
}

/// Multi-project custody ledger
pub struct TreasuryLedger {
    custody: Address,
    authority: Arc<dyn Authority>,
    transfers: Arc<dyn TokenTransfer>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    guard: OperationGuard,
    state: Mutex<TreasuryState>,
}

impl TreasuryLedger {
    /// Create a ledger holding custody at `custody`, owned by `owner`.
    pub fn new(
        custody: Address,
        owner: Address,
        config: TreasuryConfig,
        authority: Arc<dyn Authority>,
        transfers: Arc<dyn TokenTransfer>,
    ) -> LedgerResult<Self> {
        config.validate()?;
        info!(custody = %custody, owner = %owner, "Treasury ledger created");
        Ok(Self {
            custody,
            authority,
            transfers,
            clock: Arc::new(SystemClock),
            events: Arc::new(EventJournal::new()),
            guard: OperationGuard::new(),
            state: Mutex::new(TreasuryState {
                access: AccessControl::new(owner),
                config,
                budgets: Project::ALL
                    .iter()
                    .map(|project| (*project, Budget::new()))
                    .collect(),
                balances: HashMap::new(),
                custody_totals: HashMap::new(),
                payments: Vec::new(),
            }),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    fn state(&self) -> LedgerResult<MutexGuard<'_, TreasuryState>> {
        self.state.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Send `amount` out of custody, applying `undo` if the transfer fails.
    fn pay_out(
        &self,
        undo: OutflowUndo,
        token: &TokenId,
        recipient: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        if let Err(e) = self
            .transfers
            .transfer(token, &self.custody, recipient, amount)
        {
            warn!(
                token = %token,
                recipient = %recipient,
                amount = amount.0,
                error = %e,
                "Outbound transfer failed, books restored"
            );
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .restore(undo);
            return Err(LedgerError::TransferFailed(e.to_string()));
        }
        Ok(())
    }

    // --- Funding ---

    /// Pull `amount` of `token` from the caller into custody and credit `project`.
    ///
    /// A zero limit leaves the budget's existing limit unchanged.
    pub fn allocate_budget(
        &self,
        caller: &Address,
        project: Project,
        token: &TokenId,
        amount: Amount,
        withdrawal_limit: Amount,
        daily_limit: Amount,
    ) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let is_governance = self.authority.is_governance(caller);
        let now = self.clock.now();

        let plan = {
            let state = self.state()?;
            state.access.require_not_paused()?;
            state.require_privileged(caller, is_governance)?;
            if amount.is_zero() {
                return Err(LedgerError::ZeroValue { field: "amount" });
            }

            let allocated = state
                .budgets
                .get(&project)
                .map(|b| b.allocated_amount)
                .unwrap_or_default()
                .try_add(amount, "budget allocation")?;
            let mut balance = state.token_balance(project, token);
            balance.balance = balance.balance.try_add(amount, "token balance")?;
            balance.total_allocated = balance
                .total_allocated
                .try_add(amount, "token allocation")?;
            balance.supported = true;
            let custody = state.custody(token).try_add(amount, "custody total")?;

            AllocationPlan {
                allocated,
                balance,
                custody,
            }
        };

        self.transfers
            .transfer_from(token, &self.custody, caller, &self.custody, amount)
            .map_err(|e| {
                warn!(
                    project = %project,
                    token = %token,
                    caller = %caller,
                    error = %e,
                    "Allocation pull failed"
                );
                LedgerError::TransferFailed(e.to_string())
            })?;

        let (withdrawal_limit, daily_limit) = {
            let mut state = self.state()?;
            state.balances.insert((project, token.clone()), plan.balance);
            state.custody_totals.insert(token.clone(), plan.custody);
            let budget = state.budget_mut(project);
            budget.allocated_amount = plan.allocated;
            budget.update_limits(withdrawal_limit, daily_limit);
            budget.active = true;
            (budget.withdrawal_limit, budget.daily_limit)
        };

        info!(
            project = %project,
            token = %token,
            amount = amount.0,
            allocated_by = %caller,
            "Budget allocated"
        );

        publish(
            self.events.as_ref(),
            now,
            format!("budget-{project}"),
            caller,
            vec![LedgerEvent::BudgetAllocated {
                project,
                token: token.clone(),
                amount,
                withdrawal_limit,
                daily_limit,
                allocated_by: caller.clone(),
            }],
        );
        Ok(())
    }

    /// Withdraw from a project's balance to `recipient`.
    ///
    /// The owner and governance are bound only by balances; project
    /// operators are also bound by the per-call and daily limits.
    pub fn withdraw_funds(
        &self,
        caller: &Address,
        project: Project,
        token: &TokenId,
        recipient: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let is_governance = self.authority.is_governance(caller);
        let now = self.clock.now();

        let undo = {
            let mut state = self.state()?;
            state.access.require_not_paused()?;

            let budget = state.budgets.get(&project).cloned().unwrap_or_default();
            let role = if is_governance || state.access.is_owner(caller) {
                WithdrawRole::Privileged
            } else if budget.is_operator(caller) {
                WithdrawRole::Operator
            } else {
                warn!(caller = %caller, project = %project, "Withdrawal by non-operator rejected");
                return Err(LedgerError::NotProjectOperator {
                    caller: caller.clone(),
                    project,
                });
            };

            if amount.is_zero() {
                return Err(LedgerError::ZeroValue { field: "amount" });
            }
            if !budget.active {
                return Err(LedgerError::BudgetInactive(project));
            }
            if !state.token_balance(project, token).supported {
                return Err(LedgerError::TokenNotSupported {
                    project,
                    token: token.clone(),
                });
            }
            state.check_outflow(project, token, amount)?;

            let daily_spent = match role {
                WithdrawRole::Operator => {
                    let window = state.config.daily_window;
                    if budget.effective_daily_spent(now, window) != budget.daily_spent {
                        debug!(project = %project, "Daily withdrawal window reset");
                    }
                    let checked = budget.check_operator_withdrawal(amount, now, window);
                    if let Err(e) = &checked {
                        warn!(
                            caller = %caller,
                            project = %project,
                            amount = amount.0,
                            error = %e,
                            "Operator withdrawal over limit"
                        );
                    }
                    Some(checked?)
                }
                WithdrawRole::Privileged => None,
            };

            let undo = state.undo_record(Some(project), token);
            state.debit(project, token, amount)?;
            if let Some(daily_spent) = daily_spent {
                let budget = state.budget_mut(project);
                budget.daily_spent = daily_spent;
                budget.last_withdrawal_time = now;
            }
            undo
        };

        self.pay_out(undo, token, recipient, amount)?;

        info!(
            project = %project,
            token = %token,
            recipient = %recipient,
            amount = amount.0,
            withdrawn_by = %caller,
            "Funds withdrawn"
        );

        publish(
            self.events.as_ref(),
            now,
            format!("budget-{project}"),
            caller,
            vec![LedgerEvent::FundsWithdrawn {
                project,
                token: token.clone(),
                recipient: recipient.clone(),
                amount,
                withdrawn_by: caller.clone(),
            }],
        );
        Ok(())
    }

    /// Owner-only custody withdrawal that bypasses project bookkeeping.
    /// Available while paused.
    pub fn emergency_withdraw(
        &self,
        caller: &Address,
        token: &TokenId,
        recipient: &Address,
        amount: Amount,
        reason: impl Into<String>,
    ) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let now = self.clock.now();
        let reason = reason.into();

        let undo = {
            let mut state = self.state()?;
            state.access.require_owner(caller)?;
            if amount.is_zero() {
                return Err(LedgerError::ZeroValue { field: "amount" });
            }
            let limit = state.config.emergency_withdrawal_limit;
            if amount > limit {
                warn!(amount = amount.0, limit = limit.0, "Emergency withdrawal over limit");
                return Err(LedgerError::EmergencyLimitExceeded { amount, limit });
            }
            let custody = state.custody(token);
            if amount > custody {
                return Err(LedgerError::InsufficientCustody {
                    token: token.clone(),
                    required: amount,
                    available: custody,
                });
            }

            let undo = state.undo_record(None, token);
            state.custody_totals.insert(token.clone(), custody.try_sub(amount)?);
            undo
        };

        self.pay_out(undo, token, recipient, amount)?;

        warn!(
            token = %token,
            recipient = %recipient,
            amount = amount.0,
            reason = %reason,
            "Emergency withdrawal executed"
        );

        publish(
            self.events.as_ref(),
            now,
            format!("custody-{token}"),
            caller,
            vec![LedgerEvent::EmergencyWithdrawal {
                token: token.clone(),
                recipient: recipient.clone(),
                amount,
                reason,
            }],
        );
        Ok(())
    }

    // --- Budget administration ---

    pub fn add_project_operator(
        &self,
        caller: &Address,
        project: Project,
        operator: Address,
    ) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let is_governance = self.authority.is_governance(caller);
        let now = self.clock.now();
        {
            let mut state = self.state()?;
            state.require_privileged(caller, is_governance)?;
            if !state.budget_mut(project).operators.insert(operator.clone()) {
                return Err(LedgerError::OperatorAlreadyRegistered { project, operator });
            }
        }
        info!(project = %project, operator = %operator, "Project operator added");
        publish(
            self.events.as_ref(),
            now,
            format!("budget-{project}"),
            caller,
            vec![LedgerEvent::ProjectOperatorAdded { project, operator }],
        );
        Ok(())
    }

    pub fn remove_project_operator(
        &self,
        caller: &Address,
        project: Project,
        operator: Address,
    ) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let is_governance = self.authority.is_governance(caller);
        let now = self.clock.now();
        {
            let mut state = self.state()?;
            state.require_privileged(caller, is_governance)?;
            if !state.budget_mut(project).operators.remove(&operator) {
                return Err(LedgerError::OperatorNotRegistered { project, operator });
            }
        }
        info!(project = %project, operator = %operator, "Project operator removed");
        publish(
            self.events.as_ref(),
            now,
            format!("budget-{project}"),
            caller,
            vec![LedgerEvent::ProjectOperatorRemoved { project, operator }],
        );
        Ok(())
    }

    /// Replace operator limits; a zero argument keeps the current limit.
    pub fn set_budget_limits(
        &self,
        caller: &Address,
        project: Project,
        withdrawal_limit: Amount,
        daily_limit: Amount,
    ) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let is_governance = self.authority.is_governance(caller);
        let now = self.clock.now();
        let (withdrawal_limit, daily_limit) = {
            let mut state = self.state()?;
            state.require_privileged(caller, is_governance)?;
            let budget = state.budget_mut(project);
            budget.update_limits(withdrawal_limit, daily_limit);
            (budget.withdrawal_limit, budget.daily_limit)
        };
        info!(
            project = %project,
            withdrawal_limit = withdrawal_limit.0,
            daily_limit = daily_limit.0,
            "Budget limits updated"
        );
        publish(
            self.events.as_ref(),
            now,
            format!("budget-{project}"),
            caller,
            vec![LedgerEvent::BudgetLimitsUpdated {
                project,
                withdrawal_limit,
                daily_limit,
            }],
        );
        Ok(())
    }

    /// Freeze or thaw a budget. Budgets are never deleted.
    pub fn set_budget_active(
        &self,
        caller: &Address,
        project: Project,
        active: bool,
    ) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let is_governance = self.authority.is_governance(caller);
        let now = self.clock.now();
        {
            let mut state = self.state()?;
            state.require_privileged(caller, is_governance)?;
            state.budget_mut(project).active = active;
        }
        info!(project = %project, active, "Budget status changed");
        publish(
            self.events.as_ref(),
            now,
            format!("budget-{project}"),
            caller,
            vec![LedgerEvent::BudgetStatusChanged { project, active }],
        );
        Ok(())
    }

    // --- Scheduled payments ---

    /// Schedule `total_payments` payments of `amount`, the first due
    /// `frequency` seconds from now.
    #[allow(clippy::too_many_arguments)]
    pub fn create_scheduled_payment(
        &self,
        caller: &Address,
        project: Project,
        recipient: &Address,
        token: &TokenId,
        amount: Amount,
        frequency: u64,
        total_payments: u32,
    ) -> LedgerResult<PaymentId> {
        let _entered = self.guard.enter()?;
        let is_governance = self.authority.is_governance(caller);
        let now = self.clock.now();

        let id = {
            let mut state = self.state()?;
            state.access.require_not_paused()?;
            state.require_privileged(caller, is_governance)?;
            if amount.is_zero() {
                return Err(LedgerError::ZeroValue { field: "amount" });
            }
            if frequency == 0 {
                return Err(LedgerError::ZeroValue { field: "frequency" });
            }
            if total_payments == 0 {
                return Err(LedgerError::ZeroValue {
                    field: "total_payments",
                });
            }
            if !state.token_balance(project, token).supported {
                return Err(LedgerError::TokenNotSupported {
                    project,
                    token: token.clone(),
                });
            }

            let id = PaymentId(state.payments.len() as u64);
            state.payments.push(ScheduledPayment {
                id,
                project,
                recipient: recipient.clone(),
                token: token.clone(),
                amount,
                frequency,
                next_payment_time: now.saturating_add(frequency),
                total_payments,
                remaining_payments: total_payments,
                creator: caller.clone(),
                active: true,
                created_at: now,
            });
            id
        };

        info!(
            payment = %id,
            project = %project,
            recipient = %recipient,
            amount = amount.0,
            frequency,
            total_payments,
            "Scheduled payment created"
        );

        publish(
            self.events.as_ref(),
            now,
            id.to_string(),
            caller,
            vec![LedgerEvent::ScheduledPaymentCreated {
                payment_id: id,
                project,
                recipient: recipient.clone(),
                token: token.clone(),
                amount,
                frequency,
                total_payments,
            }],
        );
        Ok(id)
    }

    /// Pay out one due occurrence. Anyone may call this.
    pub fn execute_scheduled_payment(
        &self,
        caller: &Address,
        payment_id: PaymentId,
    ) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let now = self.clock.now();

        let (undo, payment) = {
            let mut state = self.state()?;
            state.access.require_not_paused()?;

            let payment = state.payment(payment_id)?.clone();
            if payment.remaining_payments == 0 {
                return Err(LedgerError::PaymentExhausted(payment_id));
            }
            if !payment.active {
                return Err(LedgerError::PaymentInactive(payment_id));
            }
            if now < payment.next_payment_time {
                return Err(LedgerError::PaymentNotDue {
                    payment_id,
                    due_at: payment.next_payment_time,
                    now,
                });
            }
            state.check_outflow(payment.project, &payment.token, payment.amount)?;

            let mut undo = state.undo_record(Some(payment.project), &payment.token);
            state.debit(payment.project, &payment.token, payment.amount)?;
            let entry = state.payment_mut(payment_id)?;
            entry.advance();
            undo.payment = Some(payment_id);
            (undo, entry.clone())
        };

        self.pay_out(undo, &payment.token, &payment.recipient, payment.amount)?;

        info!(
            payment = %payment_id,
            recipient = %payment.recipient,
            amount = payment.amount.0,
            remaining = payment.remaining_payments,
            executed_by = %caller,
            "Scheduled payment executed"
        );

        publish(
            self.events.as_ref(),
            now,
            payment_id.to_string(),
            caller,
            vec![LedgerEvent::ScheduledPaymentExecuted {
                payment_id,
                recipient: payment.recipient,
                amount: payment.amount,
                remaining_payments: payment.remaining_payments,
                executed_by: caller.clone(),
            }],
        );
        Ok(())
    }

    /// Stop an active payment permanently.
    pub fn cancel_scheduled_payment(
        &self,
        caller: &Address,
        payment_id: PaymentId,
    ) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let is_governance = self.authority.is_governance(caller);
        let now = self.clock.now();
        {
            let mut state = self.state()?;
            state.require_privileged(caller, is_governance)?;
            let payment = state.payment_mut(payment_id)?;
            if !payment.active {
                return Err(LedgerError::PaymentInactive(payment_id));
            }
            payment.active = false;
        }
        info!(payment = %payment_id, canceled_by = %caller, "Scheduled payment canceled");
        publish(
            self.events.as_ref(),
            now,
            payment_id.to_string(),
            caller,
            vec![LedgerEvent::ScheduledPaymentCanceled {
                payment_id,
                canceled_by: caller.clone(),
            }],
        );
        Ok(())
    }

    // --- Views ---

    /// Address holding the ledger's custody.
    pub fn custody(&self) -> &Address {
        &self.custody
    }

    pub fn owner(&self) -> LedgerResult<Address> {
        Ok(self.state()?.access.owner().clone())
    }

    pub fn is_paused(&self) -> LedgerResult<bool> {
        Ok(self.state()?.access.is_paused())
    }

    pub fn config(&self) -> LedgerResult<TreasuryConfig> {
        Ok(self.state()?.config.clone())
    }

    pub fn get_budget_details(&self, project: Project) -> LedgerResult<BudgetDetails> {
        let state = self.state()?;
        Ok(state
            .budgets
            .get(&project)
            .map(|b| b.details(project))
            .unwrap_or_else(|| Budget::new().details(project)))
    }

    pub fn get_token_balance(
        &self,
        project: Project,
        token: &TokenId,
    ) -> LedgerResult<TokenBalance> {
        Ok(self.state()?.token_balance(project, token))
    }

    pub fn custody_balance(&self, token: &TokenId) -> LedgerResult<Amount> {
        Ok(self.state()?.custody(token))
    }

    pub fn is_project_operator(&self, project: Project, who: &Address) -> LedgerResult<bool> {
        Ok(self
            .state()?
            .budgets
            .get(&project)
            .is_some_and(|b| b.is_operator(who)))
    }

    pub fn project_operators(&self, project: Project) -> LedgerResult<Vec<Address>> {
        Ok(self
            .state()?
            .budgets
            .get(&project)
            .map(|b| b.operators.iter().cloned().collect())
            .unwrap_or_default())
    }

    pub fn get_scheduled_payment(&self, payment_id: PaymentId) -> LedgerResult<ScheduledPayment> {
        self.state()?.payment(payment_id).cloned()
    }

    pub fn payment_count(&self) -> LedgerResult<u64> {
        Ok(self.state()?.payments.len() as u64)
    }

    pub fn active_payments(&self) -> LedgerResult<Vec<ScheduledPayment>> {
        Ok(self
            .state()?
            .payments
            .iter()
            .filter(|p| p.active)
            .cloned()
            .collect())
    }

    /// Active payments executable at the current time.
    pub fn due_payments(&self) -> LedgerResult<Vec<PaymentId>> {
        let now = self.clock.now();
        Ok(self
            .state()?
            .payments
            .iter()
            .filter(|p| p.is_due(now))
            .map(|p| p.id)
            .collect())
    }

    // --- Administration ---

    pub fn update_config(&self, caller: &Address, config: TreasuryConfig) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let now = self.clock.now();
        {
            let mut state = self.state()?;
            state.access.require_owner(caller)?;
            config.validate()?;
            state.config = config;
        }
        info!(updated_by = %caller, "Treasury config updated");
        publish(
            self.events.as_ref(),
            now,
            self.custody.to_string(),
            caller,
            vec![LedgerEvent::ConfigUpdated {
                updated_by: caller.clone(),
            }],
        );
        Ok(())
    }

    fn admin(&self, caller: &Address, action: AdminAction) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let now = self.clock.now();
        let event = self.state()?.access.apply(caller, action)?;
        info!(caller = %caller, event = event.name(), "Treasury access control changed");
        publish(self.events.as_ref(), now, self.custody.to_string(), caller, vec![event]);
        Ok(())
    }

    /// Owner or authorized operator.
    pub fn pause(&self, caller: &Address) -> LedgerResult<()> {
        self.admin(caller, AdminAction::Pause)
    }

    /// Owner only.
    pub fn unpause(&self, caller: &Address) -> LedgerResult<()> {
        self.admin(caller, AdminAction::Unpause)
    }

    pub fn transfer_ownership(&self, caller: &Address, new_owner: Address) -> LedgerResult<()> {
        self.admin(caller, AdminAction::TransferOwnership(new_owner))
    }

    pub fn add_authorized_operator(&self, caller: &Address, operator: Address) -> LedgerResult<()> {
        self.admin(caller, AdminAction::AddOperator(operator))
    }

    pub fn remove_authorized_operator(
        &self,
        caller: &Address,
        operator: Address,
    ) -> LedgerResult<()> {
        self.admin(caller, AdminAction::RemoveOperator(operator))
    }
}
