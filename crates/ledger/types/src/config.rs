//! Governance and treasury parameters
//!
//! All fields default when absent from serialized input, so a partial
//! JSON document only overrides what it names.

use crate::{Amount, LedgerError, LedgerResult, SECONDS_PER_DAY};
use serde::{Deserialize, Serialize};

/// Governance parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Seconds from creation until voting closes
    pub voting_period: u64,
    /// Seconds after voting closes before a passed proposal may execute
    pub execution_delay: u64,
    /// Percentage of total supply that must participate (1..=100)
    pub quorum_percentage: u8,
    /// Live balance a proposer must hold
    pub min_proposal_threshold: Amount,
    /// Open proposals allowed per proposer
    pub max_proposals_per_account: u32,
    /// Seconds a proposer must wait between proposals
    pub proposal_cooldown: u64,
    pub max_title_length: usize,
    pub max_description_length: usize,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            voting_period: 7 * SECONDS_PER_DAY,
            execution_delay: 2 * SECONDS_PER_DAY,
            quorum_percentage: 4,
            min_proposal_threshold: Amount::new(1_000),
            max_proposals_per_account: 3,
            proposal_cooldown: SECONDS_PER_DAY,
            max_title_length: 256,
            max_description_length: 10_000,
        }
    }
}

impl GovernanceConfig {
    pub fn validate(&self) -> LedgerResult<()> {
        if self.voting_period == 0 {
            return Err(LedgerError::InvalidConfig(
                "voting_period must be greater than zero".into(),
            ));
        }
        if self.quorum_percentage == 0 || self.quorum_percentage > 100 {
            return Err(LedgerError::InvalidConfig(format!(
                "quorum_percentage must be within 1..=100, got {}",
                self.quorum_percentage
            )));
        }
        if self.max_proposals_per_account == 0 {
            return Err(LedgerError::InvalidConfig(
                "max_proposals_per_account must be greater than zero".into(),
            ));
        }
        if self.max_title_length == 0 || self.max_description_length == 0 {
            return Err(LedgerError::InvalidConfig(
                "title and description length limits must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Treasury parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasuryConfig {
    /// Per-call cap on owner emergency withdrawals
    pub emergency_withdrawal_limit: Amount,
    /// Length of the operator daily-limit window in seconds
    pub daily_window: u64,
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            emergency_withdrawal_limit: Amount::new(100_000),
            daily_window: SECONDS_PER_DAY,
        }
    }
}

impl TreasuryConfig {
    pub fn validate(&self) -> LedgerResult<()> {
        if self.emergency_withdrawal_limit.is_zero() {
            return Err(LedgerError::InvalidConfig(
                "emergency_withdrawal_limit must be greater than zero".into(),
            ));
        }
        if self.daily_window == 0 {
            return Err(LedgerError::InvalidConfig(
                "daily_window must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Combined configuration for a ledger deployment
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub governance: GovernanceConfig,
    pub treasury: TreasuryConfig,
}

impl LedgerConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> LedgerResult<Self> {
        let config: LedgerConfig = serde_json::from_str(json)
            .map_err(|e| LedgerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        self.governance.validate()?;
        self.treasury.validate()
    }
}
