//! Proposals and votes: the governance state machine's records
//!
//! A proposal carries only a hash of its action payload. The engine
//! authorizes that hash; the target project's adapter interprets it.

use crate::{Address, Amount, LedgerError, Project, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content hash of an opaque action payload (BLAKE3, 32 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionHash(pub [u8; 32]);

impl ActionHash {
    /// Compute the BLAKE3 hash of arbitrary data.
    pub fn of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn from_hex(hex: &str) -> Result<Self, LedgerError> {
        if hex.len() != 64 || !hex.is_ascii() {
            return Err(LedgerError::InvalidActionHash(format!(
                "expected 64 hex characters, got {}",
                hex.len()
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| {
                LedgerError::InvalidActionHash("non-hex characters".into())
            })?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Debug for ActionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionHash({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for ActionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ActionHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ActionHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ActionHash::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Direction of a vote. Wire values: against = 0, for = 1, abstain = 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteSupport {
    Against = 0,
    For = 1,
    Abstain = 2,
}

impl TryFrom<u8> for VoteSupport {
    type Error = LedgerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VoteSupport::Against),
            1 => Ok(VoteSupport::For),
            2 => Ok(VoteSupport::Abstain),
            other => Err(LedgerError::InvalidSupport(other)),
        }
    }
}

impl fmt::Display for VoteSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoteSupport::Against => "against",
            VoteSupport::For => "for",
            VoteSupport::Abstain => "abstain",
        };
        f.write_str(s)
    }
}

/// A single cast vote. Append-only, one per (proposal, voter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: Address,
    pub support: VoteSupport,
    /// Voter's live token balance at the moment the vote was cast
    pub weight: Amount,
    pub timestamp: Timestamp,
}

/// Derived lifecycle position of a proposal at a given instant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    /// Voting window open
    Active,
    /// Voting closed without majority or quorum
    Defeated,
    /// Passed, waiting out the execution delay
    Queued,
    /// Passed and executable now
    Executable,
    Executed,
    Canceled,
}

impl ProposalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Executed | ProposalState::Canceled)
    }
}

/// A governance proposal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub for_votes: Amount,
    pub against_votes: Amount,
    pub abstain_votes: Amount,
    pub executed: bool,
    pub canceled: bool,
    pub target_project: Project,
    pub action_hash: ActionHash,
    /// Voters in the order their votes were cast
    pub voters: Vec<Address>,
}

impl Proposal {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ProposalId,
        proposer: Address,
        title: impl Into<String>,
        description: impl Into<String>,
        target_project: Project,
        action_hash: ActionHash,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            proposer,
            start_time,
            end_time,
            for_votes: Amount::ZERO,
            against_votes: Amount::ZERO,
            abstain_votes: Amount::ZERO,
            executed: false,
            canceled: false,
            target_project,
            action_hash,
            voters: Vec::new(),
        }
    }

    /// Executed or canceled; no further mutation is permitted.
    pub fn is_terminal(&self) -> bool {
        self.executed || self.canceled
    }

    pub fn is_voting_open(&self, now: Timestamp) -> bool {
        !self.is_terminal() && now >= self.start_time && now <= self.end_time
    }

    /// Aggregate participation (for + against + abstain), saturating.
    pub fn total_votes(&self) -> Amount {
        self.for_votes
            .saturating_add(self.against_votes)
            .saturating_add(self.abstain_votes)
    }

    pub fn has_majority(&self) -> bool {
        self.for_votes > self.against_votes
    }

    /// Smallest participation satisfying `votes * 100 >= pct * supply`.
    pub fn quorum_required(total_supply: Amount, quorum_percentage: u8) -> Amount {
        let pct = quorum_percentage as u128;
        let floor = total_supply.mul_div(pct, 100);
        if (total_supply.0 % 100).saturating_mul(pct) % 100 == 0 {
            floor
        } else {
            floor.saturating_add(Amount::new(1))
        }
    }

    pub fn meets_quorum(&self, total_supply: Amount, quorum_percentage: u8) -> bool {
        self.total_votes() >= Self::quorum_required(total_supply, quorum_percentage)
    }

    /// Tally for the given direction.
    pub fn tally(&self, support: VoteSupport) -> Amount {
        match support {
            VoteSupport::Against => self.against_votes,
            VoteSupport::For => self.for_votes,
            VoteSupport::Abstain => self.abstain_votes,
        }
    }

    pub(crate) fn tally_mut(&mut self, support: VoteSupport) -> &mut Amount {
        match support {
            VoteSupport::Against => &mut self.against_votes,
            VoteSupport::For => &mut self.for_votes,
            VoteSupport::Abstain => &mut self.abstain_votes,
        }
    }

    /// Record a vote's weight in the tally and the voter list.
    ///
    /// Callers must have checked the voting window and double-vote rules;
    /// this only guards the arithmetic, leaving the proposal untouched on error.
    pub fn apply_vote(&mut self, vote: &Vote) -> Result<(), LedgerError> {
        let updated = self.tally(vote.support).try_add(vote.weight, "vote tally")?;
        *self.tally_mut(vote.support) = updated;
        self.voters.push(vote.voter.clone());
        Ok(())
    }

    /// State at `now`, given the execution delay, supply and quorum.
    pub fn state_at(
        &self,
        now: Timestamp,
        execution_delay: u64,
        total_supply: Amount,
        quorum_percentage: u8,
    ) -> ProposalState {
        if self.canceled {
            return ProposalState::Canceled;
        }
        if self.executed {
            return ProposalState::Executed;
        }
        if now <= self.end_time {
            return ProposalState::Active;
        }
        if !self.has_majority() || !self.meets_quorum(total_supply, quorum_percentage) {
            return ProposalState::Defeated;
        }
        if now > self.end_time.saturating_add(execution_delay) {
            ProposalState::Executable
        } else {
            ProposalState::Queued
        }
    }
}

/// What a successful execution authorizes: the target project's adapter
/// performs the action whose payload hashes to `action_hash`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionAuthorization {
    pub proposal_id: ProposalId,
    pub target_project: Project,
    pub action_hash: ActionHash,
    pub executed_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal() -> Proposal {
        Proposal::new(
            ProposalId(0),
            Address::new("alice"),
            "Upgrade Router",
            "Swap router to v2",
            Project::Dex,
            ActionHash::of(b"upgrade"),
            1_000,
            2_000,
        )
    }

    fn vote(voter: &str, support: VoteSupport, weight: u128) -> Vote {
        Vote {
            voter: Address::new(voter),
            support,
            weight: Amount::new(weight),
            timestamp: 1_500,
        }
    }

    #[test]
    fn test_action_hash_hex() {
        let h = ActionHash::of(b"payload");
        assert_eq!(h.to_hex().len(), 64);
        assert_eq!(ActionHash::from_hex(&h.to_hex()).unwrap(), h);
        assert!(ActionHash::from_hex("abc").is_err());
        assert_ne!(h, ActionHash::of(b"other"));
    }

    #[test]
    fn test_support_from_u8() {
        assert_eq!(VoteSupport::try_from(1).unwrap(), VoteSupport::For);
        assert_eq!(
            VoteSupport::try_from(3).unwrap_err(),
            LedgerError::InvalidSupport(3)
        );
    }

    #[test]
    fn test_voting_window_inclusive() {
        let p = proposal();
        assert!(!p.is_voting_open(999));
        assert!(p.is_voting_open(1_000));
        assert!(p.is_voting_open(2_000));
        assert!(!p.is_voting_open(2_001));
    }

    #[test]
    fn test_apply_vote_and_tallies() {
        let mut p = proposal();
        p.apply_vote(&vote("bob", VoteSupport::For, 5_000)).unwrap();
        p.apply_vote(&vote("carol", VoteSupport::Against, 2_000)).unwrap();
        p.apply_vote(&vote("dave", VoteSupport::Abstain, 1_000)).unwrap();

        assert_eq!(p.for_votes, Amount::new(5_000));
        assert_eq!(p.total_votes(), Amount::new(8_000));
        assert!(p.has_majority());
        assert_eq!(p.voters.len(), 3);
    }

    #[test]
    fn test_apply_vote_overflow_leaves_proposal_untouched() {
        let mut p = proposal();
        p.apply_vote(&vote("bob", VoteSupport::For, u128::MAX)).unwrap();
        let before = p.clone();
        assert!(p.apply_vote(&vote("carol", VoteSupport::For, 1)).is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn test_quorum() {
        let mut p = proposal();
        p.apply_vote(&vote("bob", VoteSupport::Abstain, 40)).unwrap();
        assert!(p.meets_quorum(Amount::new(1_000), 4));
        assert!(!p.meets_quorum(Amount::new(1_001_000), 4));
        // 4% of 1_010 is 40.4, so 40 is short
        assert!(!p.meets_quorum(Amount::new(1_010), 4));
        assert_eq!(Proposal::quorum_required(Amount::new(1_010), 4), Amount::new(41));
    }

    #[test]
    fn test_state_progression() {
        let mut p = proposal();
        let supply = Amount::new(10_000);
        assert_eq!(p.state_at(1_500, 100, supply, 4), ProposalState::Active);
        assert_eq!(p.state_at(2_050, 100, supply, 4), ProposalState::Defeated);

        p.apply_vote(&vote("bob", VoteSupport::For, 1_000)).unwrap();
        assert_eq!(p.state_at(2_050, 100, supply, 4), ProposalState::Queued);
        assert_eq!(p.state_at(2_100, 100, supply, 4), ProposalState::Queued);
        assert_eq!(p.state_at(2_101, 100, supply, 4), ProposalState::Executable);

        p.executed = true;
        assert_eq!(p.state_at(2_101, 100, supply, 4), ProposalState::Executed);
        assert!(ProposalState::Executed.is_terminal());
    }
}
