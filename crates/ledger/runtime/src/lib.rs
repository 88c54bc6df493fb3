//! Governance & Treasury Ledger Runtime
//!
//! Runtime components for the governance-and-treasury ledger:
//!
//! - **GovernanceEngine**: proposal lifecycle, weighted voting,
//!   quorum/majority evaluation and execution authorization
//! - **TreasuryLedger**: per-project budgets, operator withdrawals with
//!   per-call and daily caps, emergency withdrawals, scheduled payments
//! - **AccessControl**: owner, pause flag and authorized operators
//!
//! Both components take `&self`, are `Send + Sync` and can be shared via
//! `Arc`. Mutations are serialized per component; a collaborator calling
//! back into a mutating operation is rejected as re-entrant.
//!
//! Collaborators are injected: [`TokenOracle`] and [`TokenTransfer`] for
//! value, [`Authority`] for the governance capability, [`Clock`] for time
//! and [`EventSink`] for events.

#![deny(unsafe_code)]

pub mod access_control;
pub mod authority;
pub mod clock;
pub mod events;
pub mod governance_engine;
pub mod guard;
pub mod token;
pub mod treasury_ledger;

pub use access_control::AccessControl;
pub use authority::{Authority, StaticAuthority};
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{EventJournal, EventSink};
pub use governance_engine::GovernanceEngine;
pub use guard::OperationGuard;
pub use token::{InMemoryToken, TokenError, TokenOracle, TokenTransfer};
pub use treasury_ledger::TreasuryLedger;

pub use ledger_types;
