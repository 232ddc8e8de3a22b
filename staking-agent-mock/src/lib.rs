//! In-memory stand-in for a round based delegation staking system (parachain staking style).
//!
//! Delegators are identified by a numeric ID and delegate to candidate accounts. Bond-less and
//! revoke requests become executable [StakingAgentMock::delay_rounds] rounds after they were
//! scheduled. Rewards compound straight into the delegation amount.

use near_sdk::borsh::{BorshDeserialize, BorshSerialize};
use near_sdk::AccountId;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

pub type DelegatorId = u64;

type DelegationKey = (DelegatorId, AccountId);

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(crate = "near_sdk::borsh")]
pub enum RequestKind {
    BondLess(u128),
    Revoke,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct ScheduledRequest {
    pub kind: RequestKind,
    pub when_executable: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    DelegationAlreadyExists,
    DelegationDoesNotExist,
    PendingRequestAlreadyExists,
    PendingRequestDoesNotExist,
    InsufficientDelegation { delegated: u128, requested: u128 },
    NotYetExecutable { round: u64, when_executable: u64 },
    InjectedFailure,
}

impl Display for MockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MockError::DelegationAlreadyExists => write!(f, "delegation already exists"),
            MockError::DelegationDoesNotExist => write!(f, "delegation does not exist"),
            MockError::PendingRequestAlreadyExists => write!(f, "pending request already exists"),
            MockError::PendingRequestDoesNotExist => write!(f, "pending request does not exist"),
            MockError::InsufficientDelegation {
                delegated,
                requested,
            } => write!(
                f,
                "delegation is too low: delegated={} requested={}",
                delegated, requested
            ),
            MockError::NotYetExecutable {
                round,
                when_executable,
            } => write!(
                f,
                "request is not executable until round {} (current round {})",
                when_executable, round
            ),
            MockError::InjectedFailure => write!(f, "injected failure"),
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default)]
#[borsh(crate = "near_sdk::borsh")]
pub struct StakingAgentMock {
    round: u64,
    delay_rounds: u64,
    delegations: BTreeMap<DelegationKey, u128>,
    requests: BTreeMap<DelegationKey, ScheduledRequest>,
    auto_compound: BTreeMap<DelegationKey, u8>,
    /// number of mutating calls that succeeded
    call_count: u64,
    /// number of mutating calls, including the ones that failed
    attempt_count: u64,
    /// number of bond-less / revoke requests that were scheduled
    scheduling_call_count: u64,
    /// the next N mutating calls fail
    failures_to_inject: u32,
}

impl StakingAgentMock {
    pub fn new(delay_rounds: u64) -> Self {
        Self {
            delay_rounds,
            ..Self::default()
        }
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn delay_rounds(&self) -> u64 {
        self.delay_rounds
    }

    pub fn advance_rounds(&mut self, rounds: u64) {
        self.round += rounds;
    }

    /// makes all scheduled requests executable
    pub fn advance_past_delay(&mut self) {
        self.advance_rounds(self.delay_rounds);
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    pub fn attempt_count(&self) -> u64 {
        self.attempt_count
    }

    pub fn scheduling_call_count(&self) -> u64 {
        self.scheduling_call_count
    }

    pub fn fail_next_calls(&mut self, count: u32) {
        self.failures_to_inject = count;
    }

    pub fn delegate(
        &mut self,
        delegator: DelegatorId,
        candidate: &AccountId,
        amount: u128,
        auto_compound: u8,
    ) -> Result<(), MockError> {
        self.check_injected_failure()?;
        let key = (delegator, candidate.clone());
        if self.delegations.contains_key(&key) {
            return Err(MockError::DelegationAlreadyExists);
        }
        self.delegations.insert(key.clone(), amount);
        if auto_compound > 0 {
            self.auto_compound.insert(key, auto_compound);
        }
        self.call_count += 1;
        Ok(())
    }

    pub fn delegator_bond_more(
        &mut self,
        delegator: DelegatorId,
        candidate: &AccountId,
        amount: u128,
    ) -> Result<(), MockError> {
        self.check_injected_failure()?;
        let key = (delegator, candidate.clone());
        if self.requests.contains_key(&key) {
            return Err(MockError::PendingRequestAlreadyExists);
        }
        let delegation = self
            .delegations
            .get_mut(&key)
            .ok_or(MockError::DelegationDoesNotExist)?;
        *delegation += amount;
        self.call_count += 1;
        Ok(())
    }

    pub fn schedule_delegator_bond_less(
        &mut self,
        delegator: DelegatorId,
        candidate: &AccountId,
        amount: u128,
    ) -> Result<(), MockError> {
        self.check_injected_failure()?;
        let key = (delegator, candidate.clone());
        let delegated = self.check_can_schedule(&key)?;
        if amount > delegated {
            return Err(MockError::InsufficientDelegation {
                delegated,
                requested: amount,
            });
        }
        self.schedule(key, RequestKind::BondLess(amount));
        Ok(())
    }

    pub fn schedule_revoke_delegation(
        &mut self,
        delegator: DelegatorId,
        candidate: &AccountId,
    ) -> Result<(), MockError> {
        self.check_injected_failure()?;
        let key = (delegator, candidate.clone());
        self.check_can_schedule(&key)?;
        self.schedule(key, RequestKind::Revoke);
        Ok(())
    }

    pub fn cancel_delegation_request(
        &mut self,
        delegator: DelegatorId,
        candidate: &AccountId,
    ) -> Result<(), MockError> {
        self.check_injected_failure()?;
        let key = (delegator, candidate.clone());
        self.requests
            .remove(&key)
            .ok_or(MockError::PendingRequestDoesNotExist)?;
        self.call_count += 1;
        Ok(())
    }

    /// returns the amount released back to the delegator
    pub fn execute_delegation_request(
        &mut self,
        delegator: DelegatorId,
        candidate: &AccountId,
    ) -> Result<u128, MockError> {
        self.check_injected_failure()?;
        let key = (delegator, candidate.clone());
        let request = *self
            .requests
            .get(&key)
            .ok_or(MockError::PendingRequestDoesNotExist)?;
        if self.round < request.when_executable {
            return Err(MockError::NotYetExecutable {
                round: self.round,
                when_executable: request.when_executable,
            });
        }
        self.requests.remove(&key);
        let delegated = self.delegations.get(&key).copied().unwrap_or(0);
        let released = match request.kind {
            RequestKind::Revoke => delegated,
            RequestKind::BondLess(amount) => amount.min(delegated),
        };
        let remaining = delegated - released;
        if remaining == 0 {
            self.delegations.remove(&key);
            self.auto_compound.remove(&key);
        } else {
            self.delegations.insert(key, remaining);
        }
        self.call_count += 1;
        Ok(released)
    }

    pub fn delegation_amount(&self, delegator: DelegatorId, candidate: &AccountId) -> u128 {
        self.delegations
            .get(&(delegator, candidate.clone()))
            .copied()
            .unwrap_or(0)
    }

    pub fn delegation_request_is_pending(
        &self,
        delegator: DelegatorId,
        candidate: &AccountId,
    ) -> bool {
        self.requests.contains_key(&(delegator, candidate.clone()))
    }

    pub fn delegation_request(
        &self,
        delegator: DelegatorId,
        candidate: &AccountId,
    ) -> Option<ScheduledRequest> {
        self.requests.get(&(delegator, candidate.clone())).copied()
    }

    pub fn auto_compound(&self, delegator: DelegatorId, candidate: &AccountId) -> u8 {
        self.auto_compound
            .get(&(delegator, candidate.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// compounds rewards into an existing delegation
    ///
    /// ## Panics
    /// if the delegation does not exist
    pub fn reward(&mut self, delegator: DelegatorId, candidate: &AccountId, amount: u128) {
        let delegation = self
            .delegations
            .get_mut(&(delegator, candidate.clone()))
            .expect("delegation does not exist");
        *delegation += amount;
    }

    /// ## Panics
    /// if the delegation does not exist
    pub fn slash(&mut self, delegator: DelegatorId, candidate: &AccountId, amount: u128) {
        let delegation = self
            .delegations
            .get_mut(&(delegator, candidate.clone()))
            .expect("delegation does not exist");
        *delegation = delegation.saturating_sub(amount);
    }

    fn check_can_schedule(&self, key: &DelegationKey) -> Result<u128, MockError> {
        let delegated = *self
            .delegations
            .get(key)
            .ok_or(MockError::DelegationDoesNotExist)?;
        if self.requests.contains_key(key) {
            return Err(MockError::PendingRequestAlreadyExists);
        }
        Ok(delegated)
    }

    fn schedule(&mut self, key: DelegationKey, kind: RequestKind) {
        self.requests.insert(
            key,
            ScheduledRequest {
                kind,
                when_executable: self.round + self.delay_rounds,
            },
        );
        self.call_count += 1;
        self.scheduling_call_count += 1;
    }

    fn check_injected_failure(&mut self) -> Result<(), MockError> {
        self.attempt_count += 1;
        if self.failures_to_inject > 0 {
            self.failures_to_inject -= 1;
            return Err(MockError::InjectedFailure);
        }
        Ok(())
    }
}
