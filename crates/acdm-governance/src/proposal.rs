//! Proposal lifecycle: creation by the chair, weighted voting during the
//! debating period, and quorum-gated finish.
//!
//! The engine never performs the recipient call itself when driven through
//! [`ProposalEngine::prepare_finish`]; the caller executes the returned
//! [`PendingExecution`] and then marks the proposal finished. This lets the
//! owning contract dispatch calls addressed to itself.

use std::collections::HashMap;

use acdm_core::{AccessControl, Role};
use acdm_types::{Address, Amount, Hash, Timestamp};
use serde::{Deserialize, Serialize};

use crate::call::CallExecutor;
use crate::error::GovernanceError;
use crate::voting::VotingPower;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaoParams {
    /// Minimum combined vote weight to finish a proposal
    pub minimum_quorum: u64,
    pub debating_period_ms: u64,
    /// Block `unstake` while a voted proposal is still open
    pub enforce_voter_lock: bool,
}

impl Default for DaoParams {
    fn default() -> Self {
        Self {
            minimum_quorum: 1,
            debating_period_ms: 10_000,
            enforce_voter_lock: false,
        }
    }
}

impl DaoParams {
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.minimum_quorum == 0 {
            return Err(GovernanceError::QuorumZero);
        }
        if self.debating_period_ms == 0 {
            return Err(GovernanceError::DurationZero);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub weight: Amount,
    pub support: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Hash,
    pub recipient: Address,
    pub description: String,
    pub call_data: Vec<u8>,
    pub created_at: Timestamp,
    pub end_time: Timestamp,
    pub votes_for: Amount,
    pub votes_against: Amount,
    pub finished: bool,
    votes: HashMap<Address, Vote>,
}

impl Proposal {
    pub fn vote_of(&self, account: &Address) -> Option<&Vote> {
        self.votes.get(account)
    }

    pub fn voter_count(&self) -> usize {
        self.votes.len()
    }

    pub fn total_votes(&self) -> Result<Amount, GovernanceError> {
        self.votes_for
            .checked_add(self.votes_against)
            .ok_or_else(GovernanceError::overflow)
    }

    pub fn passes(&self) -> bool {
        self.votes_for > self.votes_against
    }
}

/// Deterministic id of a proposal created at `now`.
pub fn proposal_id(recipient: &Address, description: &str, call_data: &[u8], now: Timestamp) -> Hash {
    Hash::compute_fields(&[
        recipient.as_ref(),
        description.as_bytes(),
        call_data,
        &now.to_le_bytes(),
    ])
}

/// A proposal that met quorum and may now be finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExecution {
    pub id: Hash,
    pub recipient: Address,
    pub call_data: Vec<u8>,
    /// Only passing proposals perform their call
    pub execute: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishOutcome {
    Executed,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct ProposalEngine {
    params: DaoParams,
    proposals: HashMap<Hash, Proposal>,
    voter_locks: HashMap<Address, Timestamp>,
    access: AccessControl,
}

impl ProposalEngine {
    pub fn new(admin: Address, params: DaoParams) -> Result<Self, GovernanceError> {
        params.validate()?;
        Ok(Self {
            params,
            proposals: HashMap::new(),
            voter_locks: HashMap::new(),
            access: AccessControl::with_admin(admin),
        })
    }

    pub fn params(&self) -> &DaoParams {
        &self.params
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }

    pub fn proposal(&self, id: &Hash) -> Option<&Proposal> {
        self.proposals.get(id)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn vote_of(&self, id: &Hash, account: &Address) -> Option<&Vote> {
        self.proposal(id).and_then(|p| p.vote_of(account))
    }

    /// Latest end time over every proposal `account` voted on.
    pub fn locked_until(&self, account: &Address) -> Timestamp {
        self.voter_locks.get(account).copied().unwrap_or(0)
    }

    pub fn minimum_quorum(&self) -> u64 {
        self.params.minimum_quorum
    }

    pub fn debating_period_duration(&self) -> u64 {
        self.params.debating_period_ms
    }

    pub fn add_proposal(
        &mut self,
        caller: &Address,
        recipient: Address,
        description: String,
        call_data: Vec<u8>,
        now: Timestamp,
    ) -> Result<Hash, GovernanceError> {
        self.access.ensure_role(Role::Chair, caller)?;
        let id = proposal_id(&recipient, &description, &call_data, now);
        if self.proposals.contains_key(&id) {
            return Err(GovernanceError::DuplicateProposal(id));
        }

        let end_time = now.saturating_add(self.params.debating_period_ms);
        tracing::info!(%id, %recipient, %description, end_time, "proposal added");
        self.proposals.insert(
            id,
            Proposal {
                id,
                recipient,
                description,
                call_data,
                created_at: now,
                end_time,
                votes_for: 0,
                votes_against: 0,
                finished: false,
                votes: HashMap::new(),
            },
        );
        Ok(id)
    }

    /// Cast `voter`'s current weight for or against `id`. Returns the weight.
    pub fn vote(
        &mut self,
        id: &Hash,
        voter: &Address,
        support: bool,
        now: Timestamp,
        power: &impl VotingPower,
    ) -> Result<Amount, GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(id)
            .ok_or(GovernanceError::NoSuchProposal(*id))?;
        if now >= proposal.end_time {
            return Err(GovernanceError::VotingClosed(*id));
        }
        let weight = power.voting_power(voter);
        if weight == 0 {
            return Err(GovernanceError::ZeroWeight(*voter));
        }
        if proposal.votes.contains_key(voter) {
            return Err(GovernanceError::AlreadyVoted {
                proposal: *id,
                voter: *voter,
            });
        }

        let tally = if support {
            &mut proposal.votes_for
        } else {
            &mut proposal.votes_against
        };
        *tally = tally.checked_add(weight).ok_or_else(GovernanceError::overflow)?;
        proposal.votes.insert(*voter, Vote { weight, support });

        let lock = self.voter_locks.entry(*voter).or_default();
        *lock = (*lock).max(proposal.end_time);

        tracing::info!(%id, %voter, support, weight, "vote cast");
        Ok(weight)
    }

    /// Check that `id` can be finished at `now` without changing anything.
    pub fn prepare_finish(&self, id: &Hash, now: Timestamp) -> Result<PendingExecution, GovernanceError> {
        let proposal = self
            .proposals
            .get(id)
            .ok_or(GovernanceError::NoSuchProposal(*id))?;
        if proposal.finished {
            return Err(GovernanceError::AlreadyFinished(*id));
        }
        if now < proposal.end_time {
            return Err(GovernanceError::VotingStillOpen(*id));
        }
        let actual = proposal.total_votes()?;
        let required = Amount::from(self.params.minimum_quorum);
        if actual < required {
            return Err(GovernanceError::QuorumNotMet { actual, required });
        }

        Ok(PendingExecution {
            id: *id,
            recipient: proposal.recipient,
            call_data: proposal.call_data.clone(),
            execute: proposal.passes(),
        })
    }

    pub fn mark_finished(&mut self, id: &Hash) -> Result<(), GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(id)
            .ok_or(GovernanceError::NoSuchProposal(*id))?;
        if proposal.finished {
            return Err(GovernanceError::AlreadyFinished(*id));
        }
        proposal.finished = true;
        Ok(())
    }

    /// Finish `id`, delivering its call through `executor` with `sender`
    /// as the calling identity. A failed call leaves the proposal open.
    pub fn finish_proposal(
        &mut self,
        id: &Hash,
        now: Timestamp,
        sender: Address,
        executor: &mut impl CallExecutor,
    ) -> Result<FinishOutcome, GovernanceError> {
        let pending = self.prepare_finish(id, now)?;
        let outcome = if pending.execute {
            executor
                .execute(sender, pending.recipient, &pending.call_data)
                .map_err(GovernanceError::RecipientCallFailed)?;
            FinishOutcome::Executed
        } else {
            FinishOutcome::Rejected
        };
        self.mark_finished(id)?;
        tracing::info!(%id, ?outcome, "proposal finished");
        Ok(outcome)
    }

    pub fn set_minimum_quorum(&mut self, caller: &Address, value: u64) -> Result<(), GovernanceError> {
        self.access.ensure_role(Role::DaoSettings, caller)?;
        if value == 0 {
            return Err(GovernanceError::QuorumZero);
        }
        self.params.minimum_quorum = value;
        tracing::info!(value, "minimum quorum updated");
        Ok(())
    }

    pub fn set_debating_period_duration(&mut self, caller: &Address, value: u64) -> Result<(), GovernanceError> {
        self.access.ensure_role(Role::DaoSettings, caller)?;
        if value == 0 {
            return Err(GovernanceError::DurationZero);
        }
        self.params.debating_period_ms = value;
        tracing::info!(value, "debating period updated");
        Ok(())
    }
}
