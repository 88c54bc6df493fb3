//! Domain events emitted by every state-mutating ledger operation
//!
//! Each mutation emits its domain event followed by a uniform
//! [`LedgerEvent::StateChanged`] for downstream indexing.

use crate::{
    ActionHash, Address, Amount, PaymentId, Project, ProposalId, Timestamp, TokenId, VoteSupport,
};
use serde::{Deserialize, Serialize};

/// A ledger event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: Address,
        title: String,
        target_project: Project,
        action_hash: ActionHash,
        start_time: Timestamp,
        end_time: Timestamp,
    },
    VoteCast {
        proposal_id: ProposalId,
        voter: Address,
        support: VoteSupport,
        weight: Amount,
    },
    /// Informational; execution re-derives quorum against the then-current supply.
    QuorumReached {
        proposal_id: ProposalId,
        total_votes: Amount,
        required: Amount,
    },
    ProposalExecuted {
        proposal_id: ProposalId,
        executor: Address,
    },
    /// The target project may now perform the action hashing to `action_hash`.
    ActionAuthorized {
        proposal_id: ProposalId,
        target_project: Project,
        action_hash: ActionHash,
    },
    ProposalCanceled {
        proposal_id: ProposalId,
        canceled_by: Address,
        reason: String,
    },
    BudgetAllocated {
        project: Project,
        token: TokenId,
        amount: Amount,
        withdrawal_limit: Amount,
        daily_limit: Amount,
        allocated_by: Address,
    },
    BudgetLimitsUpdated {
        project: Project,
        withdrawal_limit: Amount,
        daily_limit: Amount,
    },
    BudgetStatusChanged {
        project: Project,
        active: bool,
    },
    FundsWithdrawn {
        project: Project,
        token: TokenId,
        recipient: Address,
        amount: Amount,
        withdrawn_by: Address,
    },
    EmergencyWithdrawal {
        token: TokenId,
        recipient: Address,
        amount: Amount,
        reason: String,
    },
    ProjectOperatorAdded {
        project: Project,
        operator: Address,
    },
    ProjectOperatorRemoved {
        project: Project,
        operator: Address,
    },
    ScheduledPaymentCreated {
        payment_id: PaymentId,
        project: Project,
        recipient: Address,
        token: TokenId,
        amount: Amount,
        frequency: u64,
        total_payments: u32,
    },
    ScheduledPaymentExecuted {
        payment_id: PaymentId,
        recipient: Address,
        amount: Amount,
        remaining_payments: u32,
        executed_by: Address,
    },
    ScheduledPaymentCanceled {
        payment_id: PaymentId,
        canceled_by: Address,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    PauseChanged {
        paused: bool,
        changed_by: Address,
    },
    AuthorizedOperatorChanged {
        operator: Address,
        authorized: bool,
    },
    ConfigUpdated {
        updated_by: Address,
    },
    /// Uniform indexing record accompanying every domain event.
    StateChanged {
        entity_id: String,
        action_hash: ActionHash,
        action: String,
        operator: Address,
        timestamp: Timestamp,
    },
}

impl LedgerEvent {
    /// Short snake_case name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::ProposalCreated { .. } => "proposal_created",
            LedgerEvent::VoteCast { .. } => "vote_cast",
            LedgerEvent::QuorumReached { .. } => "quorum_reached",
            LedgerEvent::ProposalExecuted { .. } => "proposal_executed",
            LedgerEvent::ActionAuthorized { .. } => "action_authorized",
            LedgerEvent::ProposalCanceled { .. } => "proposal_canceled",
            LedgerEvent::BudgetAllocated { .. } => "budget_allocated",
            LedgerEvent::BudgetLimitsUpdated { .. } => "budget_limits_updated",
            LedgerEvent::BudgetStatusChanged { .. } => "budget_status_changed",
            LedgerEvent::FundsWithdrawn { .. } => "funds_withdrawn",
            LedgerEvent::EmergencyWithdrawal { .. } => "emergency_withdrawal",
            LedgerEvent::ProjectOperatorAdded { .. } => "project_operator_added",
            LedgerEvent::ProjectOperatorRemoved { .. } => "project_operator_removed",
            LedgerEvent::ScheduledPaymentCreated { .. } => "scheduled_payment_created",
            LedgerEvent::ScheduledPaymentExecuted { .. } => "scheduled_payment_executed",
            LedgerEvent::ScheduledPaymentCanceled { .. } => "scheduled_payment_canceled",
            LedgerEvent::OwnershipTransferred { .. } => "ownership_transferred",
            LedgerEvent::PauseChanged { .. } => "pause_changed",
            LedgerEvent::AuthorizedOperatorChanged { .. } => "authorized_operator_changed",
            LedgerEvent::ConfigUpdated { .. } => "config_updated",
            LedgerEvent::StateChanged { .. } => "state_changed",
        }
    }

    /// Build the uniform indexing record for a mutation.
    ///
    /// `action_hash` commits to the entity, the action name and the
    /// JSON encoding of the domain event it accompanies.
    pub fn state_changed(
        entity_id: impl Into<String>,
        domain_event: &LedgerEvent,
        operator: Address,
        timestamp: Timestamp,
    ) -> LedgerEvent {
        let entity_id = entity_id.into();
        let action = domain_event.name();

        let mut hasher = blake3::Hasher::new();
        hasher.update(b"ledger-state-changed-v1:");
        hasher.update(entity_id.as_bytes());
        hasher.update(b":");
        hasher.update(action.as_bytes());
        hasher.update(b":");
        match serde_json::to_vec(domain_event) {
            Ok(encoded) => {
                hasher.update(&encoded);
            }
            Err(e) => {
                tracing::warn!(
                    entity_id = %entity_id,
                    action,
                    error = %e,
                    "Event payload not encodable, hash covers entity and action only"
                );
            }
        }
        hasher.update(&timestamp.to_le_bytes());

        LedgerEvent::StateChanged {
            entity_id,
            action_hash: ActionHash(*hasher.finalize().as_bytes()),
            action: action.to_string(),
            operator,
            timestamp,
        }
    }
}

/// Envelope stored by event sinks
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event identifier
    pub event_id: String,
    /// Position in the emitting sink, starting at 0
    pub sequence: u64,
    pub emitted_at: Timestamp,
    pub event: LedgerEvent,
}

impl EventRecord {
    pub fn new(sequence: u64, emitted_at: Timestamp, event: LedgerEvent) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            emitted_at,
            event,
        }
    }
}
