//! Error types for the governance and treasury ledger

use crate::{Address, Amount, PaymentId, Project, ProposalId, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

/// Coarse classification of a [`LedgerError`].
///
/// Callers branch on the kind (e.g. to map onto transport status codes);
/// the variant carries the detail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input
    Validation,
    /// Caller lacks the required privilege
    Authorization,
    /// Operation invalid for the current lifecycle state
    State,
    /// Amount exceeds a cap or the available balance
    Limit,
    /// Majority or quorum not reached
    Quorum,
    /// A collaborator (token oracle, transfer primitive) failed
    External,
    /// Internal failure (poisoned lock)
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::State => "state",
            ErrorKind::Limit => "limit",
            ErrorKind::Quorum => "quorum",
            ErrorKind::External => "external",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in ledger operations
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    // --- Validation ---
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} too long: {len} bytes exceeds maximum {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid project id: {0}")]
    InvalidProject(u8),

    #[error("unknown project name: {0}")]
    UnknownProjectName(String),

    #[error("invalid vote support value: {0}")]
    InvalidSupport(u8),

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid action hash: {0}")]
    InvalidActionHash(String),

    // --- Authorization ---
    #[error("caller {0} is not the owner")]
    NotOwner(Address),

    #[error("caller {0} is not authorized")]
    NotAuthorized(Address),

    #[error("caller {caller} is neither owner nor governance")]
    NotPrivileged { caller: Address },

    #[error("caller {caller} may not cancel proposal {proposal_id}")]
    NotProposerOrOwner {
        caller: Address,
        proposal_id: ProposalId,
    },

    #[error("caller {caller} is not an operator for {project}")]
    NotProjectOperator { caller: Address, project: Project },

    // --- State ---
    #[error("operations are paused")]
    Paused,

    #[error("operations are not paused")]
    NotPaused,

    #[error("re-entrant call rejected")]
    Reentrant,

    #[error("proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("proposal {0} already executed")]
    ProposalAlreadyExecuted(ProposalId),

    #[error("proposal {0} already canceled")]
    ProposalAlreadyCanceled(ProposalId),

    #[error(
        "voting on proposal {proposal_id} is closed (window {start_time}..={end_time}, now {now})"
    )]
    VotingClosed {
        proposal_id: ProposalId,
        start_time: Timestamp,
        end_time: Timestamp,
        now: Timestamp,
    },

    #[error("{voter} already voted on proposal {proposal_id}")]
    AlreadyVoted {
        proposal_id: ProposalId,
        voter: Address,
    },

    #[error("proposal {proposal_id} not executable before {executable_after} (now {now})")]
    ExecutionDelayNotElapsed {
        proposal_id: ProposalId,
        executable_after: Timestamp,
        now: Timestamp,
    },

    #[error("proposal cooldown active for {proposer} until {available_at}")]
    ProposalCooldown {
        proposer: Address,
        available_at: Timestamp,
    },

    #[error("{proposer} already has {open} open proposals (max {max})")]
    TooManyOpenProposals {
        proposer: Address,
        open: u32,
        max: u32,
    },

    #[error("budget for {0} is not active")]
    BudgetInactive(Project),

    #[error("token {token} not supported for {project}")]
    TokenNotSupported { project: Project, token: TokenId },

    #[error("{operator} is already an operator for {project}")]
    OperatorAlreadyRegistered { project: Project, operator: Address },

    #[error("{operator} is not an operator for {project}")]
    OperatorNotRegistered { project: Project, operator: Address },

    #[error("{0} is already an authorized operator")]
    AuthorizedOperatorExists(Address),

    #[error("{0} is not an authorized operator")]
    AuthorizedOperatorMissing(Address),

    #[error("scheduled payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("scheduled payment {0} is not active")]
    PaymentInactive(PaymentId),

    #[error("scheduled payment {payment_id} not due until {due_at} (now {now})")]
    PaymentNotDue {
        payment_id: PaymentId,
        due_at: Timestamp,
        now: Timestamp,
    },

    #[error("scheduled payment {0} has no remaining payments")]
    PaymentExhausted(PaymentId),

    // --- Limit ---
    #[error("{account} holds {balance}, below proposal threshold {required}")]
    BelowProposalThreshold {
        account: Address,
        balance: Amount,
        required: Amount,
    },

    #[error("{0} has no voting power")]
    NoVotingPower(Address),

    #[error("amount {amount} exceeds per-withdrawal limit {limit}")]
    WithdrawalLimitExceeded { amount: Amount, limit: Amount },

    #[error("amount {amount} exceeds daily limit: {spent} of {limit} already spent")]
    DailyLimitExceeded {
        amount: Amount,
        spent: Amount,
        limit: Amount,
    },

    #[error("amount {amount} exceeds emergency withdrawal limit {limit}")]
    EmergencyLimitExceeded { amount: Amount, limit: Amount },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("insufficient custody of {token}: required {required}, held {available}")]
    InsufficientCustody {
        token: TokenId,
        required: Amount,
        available: Amount,
    },

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    // --- Quorum ---
    #[error("proposal {proposal_id} lacks majority: {for_votes} for, {against_votes} against")]
    MajorityNotReached {
        proposal_id: ProposalId,
        for_votes: Amount,
        against_votes: Amount,
    },

    #[error("proposal {proposal_id} lacks quorum: {total_votes} votes, {required} required")]
    QuorumNotReached {
        proposal_id: ProposalId,
        total_votes: Amount,
        required: Amount,
    },

    // --- External ---
    #[error("token oracle failed: {0}")]
    OracleFailed(String),

    #[error("token transfer failed: {0}")]
    TransferFailed(String),

    // --- Internal ---
    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;
        match self {
            EmptyField { .. }
            | FieldTooLong { .. }
            | InvalidProject(_)
            | UnknownProjectName(_)
            | InvalidSupport(_)
            | ZeroValue { .. }
            | InvalidConfig(_)
            | InvalidActionHash(_) => ErrorKind::Validation,

            NotOwner(_)
            | NotAuthorized(_)
            | NotPrivileged { .. }
            | NotProposerOrOwner { .. }
            | NotProjectOperator { .. } => ErrorKind::Authorization,

            Paused
            | NotPaused
            | Reentrant
            | ProposalNotFound(_)
            | ProposalAlreadyExecuted(_)
            | ProposalAlreadyCanceled(_)
            | VotingClosed { .. }
            | AlreadyVoted { .. }
            | ExecutionDelayNotElapsed { .. }
            | ProposalCooldown { .. }
            | TooManyOpenProposals { .. }
            | BudgetInactive(_)
            | TokenNotSupported { .. }
            | OperatorAlreadyRegistered { .. }
            | OperatorNotRegistered { .. }
            | AuthorizedOperatorExists(_)
            | AuthorizedOperatorMissing(_)
            | PaymentNotFound(_)
            | PaymentInactive(_)
            | PaymentNotDue { .. }
            | PaymentExhausted(_) => ErrorKind::State,

            BelowProposalThreshold { .. }
            | NoVotingPower(_)
            | WithdrawalLimitExceeded { .. }
            | DailyLimitExceeded { .. }
            | EmergencyLimitExceeded { .. }
            | InsufficientBalance { .. }
            | InsufficientCustody { .. }
            | Overflow(_) => ErrorKind::Limit,

            MajorityNotReached { .. } | QuorumNotReached { .. } => ErrorKind::Quorum,

            OracleFailed(_) | TransferFailed(_) => ErrorKind::External,

            LockPoisoned => ErrorKind::Internal,
        }
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
