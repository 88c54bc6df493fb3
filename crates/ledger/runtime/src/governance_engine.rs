//! Governance Engine: proposal lifecycle, weighted voting, execution authorization
//!
//! Token holders above the proposal threshold open time-boxed proposals
//! against one of the five projects. Votes are weighted by the voter's live
//! token balance. After voting closes and the execution delay elapses,
//! anyone may execute a proposal that has majority and quorum; execution
//! only authorizes the target project to act on the proposal's action hash.

use crate::access_control::{AccessControl, AdminAction};
use crate::authority::Authority;
use crate::clock::{Clock, SystemClock};
use crate::events::{publish, EventJournal, EventSink};
use crate::guard::OperationGuard;
use crate::token::TokenOracle;
use ledger_types::{
    ActionHash, Address, Amount, ExecutionAuthorization, GovernanceConfig, LedgerError,
    LedgerEvent, LedgerResult, Project, Proposal, ProposalId, ProposalState, Timestamp, Vote,
    VoteSupport,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct GovernanceState {
    access: AccessControl,
    config: GovernanceConfig,
    /// Indexed by `ProposalId`
    proposals: Vec<Proposal>,
    votes: HashMap<ProposalId, HashMap<Address, Vote>>,
    proposals_by_account: HashMap<Address, Vec<ProposalId>>,
    last_proposal_time: HashMap<Address, Timestamp>,
    /// Proposals whose `QuorumReached` has been announced
    quorum_announced: HashSet<ProposalId>,
}

impl GovernanceState {
    fn proposal(&self, id: ProposalId) -> LedgerResult<&Proposal> {
        usize::try_from(id.0)
            .ok()
            .and_then(|index| self.proposals.get(index))
            .ok_or(LedgerError::ProposalNotFound(id))
    }

    fn proposal_mut(&mut self, id: ProposalId) -> LedgerResult<&mut Proposal> {
        usize::try_from(id.0)
            .ok()
            .and_then(|index| self.proposals.get_mut(index))
            .ok_or(LedgerError::ProposalNotFound(id))
    }

    fn has_voted(&self, id: ProposalId, voter: &Address) -> bool {
        self.votes
            .get(&id)
            .is_some_and(|votes| votes.contains_key(voter))
    }

    /// Proposals by `account` that are neither terminal nor past voting.
    fn open_proposal_count(&self, account: &Address, now: Timestamp) -> u32 {
        let count = self
            .proposals_by_account
            .get(account)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.proposal(*id).ok())
                    .filter(|p| !p.is_terminal() && now <= p.end_time)
                    .count()
            })
            .unwrap_or(0);
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Reject a terminal proposal with the matching error.
fn ensure_not_terminal(proposal: &Proposal) -> LedgerResult<()> {
    if proposal.executed {
        return Err(LedgerError::ProposalAlreadyExecuted(proposal.id));
    }
    if proposal.canceled {
        return Err(LedgerError::ProposalAlreadyCanceled(proposal.id));
    }
    Ok(())
}

fn validate_text(field: &'static str, value: &str, max: usize) -> LedgerResult<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::EmptyField { field });
    }
    if value.len() > max {
        return Err(LedgerError::FieldTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

/// Proposal and voting state machine
pub struct GovernanceEngine {
    identity: Address,
    oracle: Arc<dyn TokenOracle>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    guard: OperationGuard,
    state: Mutex<GovernanceState>,
}

impl GovernanceEngine {
    /// Create an engine acting as `identity`, owned by `owner`.
    ///
    /// Uses the system clock and a fresh [`EventJournal`] until replaced
    /// with [`with_clock`](Self::with_clock) / [`with_event_sink`](Self::with_event_sink).
    pub fn new(
        identity: Address,
        owner: Address,
        config: GovernanceConfig,
        oracle: Arc<dyn TokenOracle>,
    ) -> LedgerResult<Self> {
        config.validate()?;
        info!(identity = %identity, owner = %owner, "Governance engine created");
        Ok(Self {
            identity,
            oracle,
            clock: Arc::new(SystemClock),
            events: Arc::new(EventJournal::new()),
            guard: OperationGuard::new(),
            state: Mutex::new(GovernanceState {
                access: AccessControl::new(owner),
                config,
                proposals: Vec::new(),
                votes: HashMap::new(),
                proposals_by_account: HashMap::new(),
                last_proposal_time: HashMap::new(),
                quorum_announced: HashSet::new(),
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

    fn state(&self) -> LedgerResult<MutexGuard<'_, GovernanceState>> {
        self.state.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    fn balance_of(&self, account: &Address) -> LedgerResult<Amount> {
        self.oracle
            .balance_of(account)
            .map_err(|e| LedgerError::OracleFailed(e.to_string()))
    }

    fn total_supply(&self) -> LedgerResult<Amount> {
        self.oracle
            .total_supply()
            .map_err(|e| LedgerError::OracleFailed(e.to_string()))
    }

    // --- Proposal lifecycle ---

    /// Open a proposal. `action_data` is opaque; only its BLAKE3 hash is kept.
    pub fn create_proposal(
        &self,
        caller: &Address,
        title: &str,
        description: &str,
        target_project: Project,
        action_data: &[u8],
    ) -> LedgerResult<ProposalId> {
        let _entered = self.guard.enter()?;
        let now = self.clock.now();

        let config = {
            let state = self.state()?;
            state.access.require_not_paused()?;
            validate_text("title", title, state.config.max_title_length)?;
            validate_text(
                "description",
                description,
                state.config.max_description_length,
            )?;
            state.config.clone()
        };

        let balance = self.balance_of(caller)?;
        if balance < config.min_proposal_threshold {
            warn!(
                proposer = %caller,
                balance = balance.0,
                required = config.min_proposal_threshold.0,
                "Proposal below threshold"
            );
            return Err(LedgerError::BelowProposalThreshold {
                account: caller.clone(),
                balance,
                required: config.min_proposal_threshold,
            });
        }

        let (id, proposal) = {
            let mut state = self.state()?;

            let open = state.open_proposal_count(caller, now);
            if open >= config.max_proposals_per_account {
                return Err(LedgerError::TooManyOpenProposals {
                    proposer: caller.clone(),
                    open,
                    max: config.max_proposals_per_account,
                });
            }
            if let Some(last) = state.last_proposal_time.get(caller) {
                let available_at = last.saturating_add(config.proposal_cooldown);
                if now < available_at {
                    return Err(LedgerError::ProposalCooldown {
                        proposer: caller.clone(),
                        available_at,
                    });
                }
            }

            let id = ProposalId(state.proposals.len() as u64);
            let proposal = Proposal::new(
                id,
                caller.clone(),
                title,
                description,
                target_project,
                ActionHash::of(action_data),
                now,
                now.saturating_add(config.voting_period),
            );
            state.proposals.push(proposal.clone());
            state
                .proposals_by_account
                .entry(caller.clone())
                .or_default()
                .push(id);
            state.last_proposal_time.insert(caller.clone(), now);
            (id, proposal)
        };

        info!(
            proposal = %id,
            proposer = %caller,
            project = %target_project,
            end_time = proposal.end_time,
            "Proposal created"
        );

        publish(
            self.events.as_ref(),
            now,
            id.to_string(),
            caller,
            vec![LedgerEvent::ProposalCreated {
                proposal_id: id,
                proposer: caller.clone(),
                title: proposal.title,
                target_project,
                action_hash: proposal.action_hash,
                start_time: proposal.start_time,
                end_time: proposal.end_time,
            }],
        );

        Ok(id)
    }

    /// Cast the caller's vote, weighted by their live balance.
    pub fn vote(
        &self,
        caller: &Address,
        proposal_id: ProposalId,
        support: VoteSupport,
    ) -> LedgerResult<Vote> {
        let _entered = self.guard.enter()?;
        let now = self.clock.now();

        {
            let state = self.state()?;
            state.access.require_not_paused()?;
            let proposal = state.proposal(proposal_id)?;
            ensure_not_terminal(proposal)?;
            if !proposal.is_voting_open(now) {
                return Err(LedgerError::VotingClosed {
                    proposal_id,
                    start_time: proposal.start_time,
                    end_time: proposal.end_time,
                    now,
                });
            }
            if state.has_voted(proposal_id, caller) {
                return Err(LedgerError::AlreadyVoted {
                    proposal_id,
                    voter: caller.clone(),
                });
            }
        }

        let weight = self.balance_of(caller)?;
        if weight.is_zero() {
            return Err(LedgerError::NoVotingPower(caller.clone()));
        }
        let supply = self.total_supply()?;

        let vote = Vote {
            voter: caller.clone(),
            support,
            weight,
            timestamp: now,
        };

        let quorum_reached = {
            let mut state = self.state()?;
            let quorum_percentage = state.config.quorum_percentage;
            let required = Proposal::quorum_required(supply, quorum_percentage);

            let proposal = state.proposal_mut(proposal_id)?;
            proposal.apply_vote(&vote)?;
            let total_votes = proposal.total_votes();

            state
                .votes
                .entry(proposal_id)
                .or_default()
                .insert(caller.clone(), vote.clone());

            if total_votes >= required && state.quorum_announced.insert(proposal_id) {
                Some(LedgerEvent::QuorumReached {
                    proposal_id,
                    total_votes,
                    required,
                })
            } else {
                None
            }
        };

        info!(
            proposal = %proposal_id,
            voter = %caller,
            support = %support,
            weight = weight.0,
            "Vote cast"
        );

        let mut events = vec![LedgerEvent::VoteCast {
            proposal_id,
            voter: caller.clone(),
            support,
            weight,
        }];
        if let Some(event) = quorum_reached {
            info!(proposal = %proposal_id, "Quorum reached");
            events.push(event);
        }
        publish(self.events.as_ref(), now, proposal_id.to_string(), caller, events);

        Ok(vote)
    }

    /// [`vote`](Self::vote) with a raw support code (0 against, 1 for, 2 abstain).
    pub fn vote_with_code(
        &self,
        caller: &Address,
        proposal_id: ProposalId,
        support: u8,
    ) -> LedgerResult<Vote> {
        let support = VoteSupport::try_from(support)?;
        self.vote(caller, proposal_id, support)
    }

    /// Execute a passed proposal. Anyone may call this.
    pub fn execute_proposal(
        &self,
        caller: &Address,
        proposal_id: ProposalId,
    ) -> LedgerResult<ExecutionAuthorization> {
        let _entered = self.guard.enter()?;
        let now = self.clock.now();

        let quorum_percentage = {
            let state = self.state()?;
            state.access.require_not_paused()?;
            let proposal = state.proposal(proposal_id)?;
            ensure_not_terminal(proposal)?;

            let executable_after = proposal
                .end_time
                .saturating_add(state.config.execution_delay);
            if now <= executable_after {
                return Err(LedgerError::ExecutionDelayNotElapsed {
                    proposal_id,
                    executable_after,
                    now,
                });
            }
            if !proposal.has_majority() {
                return Err(LedgerError::MajorityNotReached {
                    proposal_id,
                    for_votes: proposal.for_votes,
                    against_votes: proposal.against_votes,
                });
            }
            state.config.quorum_percentage
        };

        let supply = self.total_supply()?;

        let authorization = {
            let mut state = self.state()?;
            let proposal = state.proposal_mut(proposal_id)?;
            if !proposal.meets_quorum(supply, quorum_percentage) {
                return Err(LedgerError::QuorumNotReached {
                    proposal_id,
                    total_votes: proposal.total_votes(),
                    required: Proposal::quorum_required(supply, quorum_percentage),
                });
            }
            proposal.executed = true;
            ExecutionAuthorization {
                proposal_id,
                target_project: proposal.target_project,
                action_hash: proposal.action_hash,
                executed_at: now,
            }
        };

        info!(
            proposal = %proposal_id,
            executor = %caller,
            project = %authorization.target_project,
            action_hash = %authorization.action_hash,
            "Proposal executed"
        );

        publish(
            self.events.as_ref(),
            now,
            proposal_id.to_string(),
            caller,
            vec![
                LedgerEvent::ProposalExecuted {
                    proposal_id,
                    executor: caller.clone(),
                },
                LedgerEvent::ActionAuthorized {
                    proposal_id,
                    target_project: authorization.target_project,
                    action_hash: authorization.action_hash,
                },
            ],
        );

        Ok(authorization)
    }

    /// Cancel a live proposal. Only its proposer or the owner may do so.
    pub fn cancel_proposal(
        &self,
        caller: &Address,
        proposal_id: ProposalId,
        reason: impl Into<String>,
    ) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let now = self.clock.now();
        let reason = reason.into();

        {
            let mut state = self.state()?;
            state.access.require_not_paused()?;
            let is_owner = state.access.is_owner(caller);
            let proposal = state.proposal_mut(proposal_id)?;
            if proposal.proposer != *caller && !is_owner {
                warn!(proposal = %proposal_id, caller = %caller, "Cancel rejected");
                return Err(LedgerError::NotProposerOrOwner {
                    caller: caller.clone(),
                    proposal_id,
                });
            }
            ensure_not_terminal(proposal)?;
            proposal.canceled = true;
        }

        info!(
            proposal = %proposal_id,
            canceled_by = %caller,
            reason = %reason,
            "Proposal canceled"
        );

        publish(
            self.events.as_ref(),
            now,
            proposal_id.to_string(),
            caller,
            vec![LedgerEvent::ProposalCanceled {
                proposal_id,
                canceled_by: caller.clone(),
                reason,
            }],
        );
        Ok(())
    }

    // --- Views ---

    pub fn identity(&self) -> &Address {
        &self.identity
    }

    pub fn owner(&self) -> LedgerResult<Address> {
        Ok(self.state()?.access.owner().clone())
    }

    pub fn is_paused(&self) -> LedgerResult<bool> {
        Ok(self.state()?.access.is_paused())
    }

    pub fn config(&self) -> LedgerResult<GovernanceConfig> {
        Ok(self.state()?.config.clone())
    }

    pub fn get_proposal(&self, proposal_id: ProposalId) -> LedgerResult<Proposal> {
        self.state()?.proposal(proposal_id).cloned()
    }

    pub fn proposal_count(&self) -> LedgerResult<u64> {
        Ok(self.state()?.proposals.len() as u64)
    }

    /// Majority and quorum against the current supply, recomputed without mutation.
    pub fn has_proposal_passed(&self, proposal_id: ProposalId) -> LedgerResult<bool> {
        let (proposal, quorum_percentage) = {
            let state = self.state()?;
            (state.proposal(proposal_id)?.clone(), state.config.quorum_percentage)
        };
        let supply = self.total_supply()?;
        let passed = proposal.has_majority() && proposal.meets_quorum(supply, quorum_percentage);
        debug!(proposal = %proposal_id, passed, "Pass status recomputed");
        Ok(passed)
    }

    pub fn proposal_state(&self, proposal_id: ProposalId) -> LedgerResult<ProposalState> {
        let now = self.clock.now();
        let (proposal, config) = {
            let state = self.state()?;
            (state.proposal(proposal_id)?.clone(), state.config.clone())
        };
        let supply = self.total_supply()?;
        Ok(proposal.state_at(
            now,
            config.execution_delay,
            supply,
            config.quorum_percentage,
        ))
    }

    /// Whether `account` could vote on the proposal right now.
    pub fn can_vote(&self, proposal_id: ProposalId, account: &Address) -> LedgerResult<bool> {
        let now = self.clock.now();
        {
            let state = self.state()?;
            if state.access.is_paused() {
                return Ok(false);
            }
            let proposal = state.proposal(proposal_id)?;
            if !proposal.is_voting_open(now) || state.has_voted(proposal_id, account) {
                return Ok(false);
            }
        }
        Ok(!self.balance_of(account)?.is_zero())
    }

    /// The weight a vote by `account` would carry now.
    pub fn get_voting_power(&self, account: &Address) -> LedgerResult<Amount> {
        self.balance_of(account)
    }

    pub fn get_vote(&self, proposal_id: ProposalId, voter: &Address) -> LedgerResult<Option<Vote>> {
        let state = self.state()?;
        state.proposal(proposal_id)?;
        Ok(state
            .votes
            .get(&proposal_id)
            .and_then(|votes| votes.get(voter))
            .cloned())
    }

    pub fn has_voted(&self, proposal_id: ProposalId, voter: &Address) -> LedgerResult<bool> {
        let state = self.state()?;
        state.proposal(proposal_id)?;
        Ok(state.has_voted(proposal_id, voter))
    }

    pub fn proposals_by(&self, account: &Address) -> LedgerResult<Vec<ProposalId>> {
        Ok(self
            .state()?
            .proposals_by_account
            .get(account)
            .cloned()
            .unwrap_or_default())
    }

    pub fn open_proposal_count(&self, account: &Address) -> LedgerResult<u32> {
        let now = self.clock.now();
        Ok(self.state()?.open_proposal_count(account, now))
    }

    // --- Administration ---

    pub fn update_config(&self, caller: &Address, config: GovernanceConfig) -> LedgerResult<()> {
        let _entered = self.guard.enter()?;
        let now = self.clock.now();
        {
            let mut state = self.state()?;
            state.access.require_owner(caller)?;
            config.validate()?;
            state.config = config;
        }
        info!(updated_by = %caller, "Governance config updated");
        publish(
            self.events.as_ref(),
            now,
            self.identity.to_string(),
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
        info!(caller = %caller, event = event.name(), "Governance access control changed");
        publish(self.events.as_ref(), now, self.identity.to_string(), caller, vec![event]);
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

impl Authority for GovernanceEngine {
    fn is_governance(&self, caller: &Address) -> bool {
        *caller == self.identity
    }
}
