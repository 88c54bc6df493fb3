//! Shared fixtures for the runtime integration tests.

#![allow(dead_code)]

use ledger_runtime::ledger_types::{
    Address, Amount, GovernanceConfig, Timestamp, TokenId, TreasuryConfig,
};
use ledger_runtime::{EventJournal, GovernanceEngine, InMemoryToken, ManualClock, TreasuryLedger};
use std::sync::Arc;

pub const START: Timestamp = 1_700_000_000;
pub const DAY: u64 = 86_400;

pub fn addr(s: &str) -> Address {
    Address::new(s)
}

pub fn gov_token() -> TokenId {
    TokenId::new("GOV")
}

pub fn usdc() -> TokenId {
    TokenId::new("USDC")
}

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A governance engine and a treasury ledger wired to each other
pub struct World {
    pub token: Arc<InMemoryToken>,
    pub clock: Arc<ManualClock>,
    pub journal: Arc<EventJournal>,
    pub governance: Arc<GovernanceEngine>,
    pub treasury: TreasuryLedger,
}

impl World {
    /// GOV holdings: alice 10_000, bob 5_000, carol 2_000, dave 83_000
    /// (supply 100_000). The owner holds 1_000_000 USDC approved to the vault.
    pub fn new() -> Self {
        init_tracing();

        let token = Arc::new(InMemoryToken::new(gov_token()));
        for (who, amount) in [
            ("alice", 10_000),
            ("bob", 5_000),
            ("carol", 2_000),
            ("dave", 83_000),
        ] {
            token.mint(&gov_token(), &addr(who), Amount::new(amount)).unwrap();
        }
        token.mint(&usdc(), &addr("owner"), Amount::new(1_000_000)).unwrap();
        token.approve(&usdc(), &addr("owner"), &addr("vault"), Amount::new(1_000_000));

        let clock = Arc::new(ManualClock::new(START));
        let journal = Arc::new(EventJournal::new());

        let governance = Arc::new(
            GovernanceEngine::new(
                addr("governance"),
                addr("owner"),
                GovernanceConfig::default(),
                token.clone(),
            )
            .unwrap()
            .with_clock(clock.clone())
            .with_event_sink(journal.clone()),
        );

        let treasury = TreasuryLedger::new(
            addr("vault"),
            addr("owner"),
            TreasuryConfig::default(),
            governance.clone(),
            token.clone(),
        )
        .unwrap()
        .with_clock(clock.clone())
        .with_event_sink(journal.clone());

        Self {
            token,
            clock,
            journal,
            governance,
            treasury,
        }
    }
}
