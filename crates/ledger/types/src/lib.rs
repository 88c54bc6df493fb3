//! Governance & Treasury Ledger Domain Types
//!
//! This crate defines the domain types for the governance-and-treasury
//! ledger that coordinates proposals, weighted voting and multi-project
//! fund custody across five fixed projects.
//!
//! # Key Concepts
//!
//! - **Proposal**: a titled, time-boxed decision targeting one project.
//!   It carries only the BLAKE3 hash of its action payload.
//! - **Vote**: one per (proposal, voter), weighted by the voter's live
//!   token balance.
//! - **Budget**: per-project allocation with operator spend caps
//!   (per call and per rolling day).
//! - **TokenBalance**: per-(project, token) custody bookkeeping that
//!   conserves value: `balance == total_allocated - total_spent`.
//! - **ScheduledPayment**: a recurring obligation anyone may execute
//!   once it is due.
//! - **LedgerEvent**: the domain event stream, plus a uniform
//!   `StateChanged` record per mutation.
//!
//! # Architecture
//!
//! This is a pure types crate. The runtime behavior lives in
//! `ledger-runtime`. All records implement `Clone`, `Debug`, `Serialize`,
//! `Deserialize`.

#![deny(unsafe_code)]

mod amount;
mod budget;
mod config;
mod errors;
mod event;
mod ids;
mod payment;
mod project;
mod proposal;

pub use amount::*;
pub use budget::*;
pub use config::*;
pub use errors::*;
pub use event::*;
pub use ids::*;
pub use payment::*;
pub use project::*;
pub use proposal::*;
