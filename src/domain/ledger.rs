//! A ledger is a sub-account through which the pool delegates to external staking agents.
//!
//! Each (ledger, agent) pair runs through the delegation state machine:
//!
//! `None -> Delegated -> {BondLessPending, RevokePending} -> None | Delegated(reduced)`
//!
//! At most one request may be pending per pair. A second request can only be scheduled once the
//! pending one has been cancelled or executed.

use crate::domain::{BatchId, UnderlyingAmount};
use crate::errors::{illegal_state::*, StakingPoolError};
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};
use near_sdk::AccountId;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// stable ledger identifier used towards the staking agent
#[derive(
    BorshSerialize, BorshDeserialize, Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Default,
)]
#[borsh(crate = "near_sdk::borsh")]
pub struct LedgerId(pub u64);

impl LedgerId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Display for LedgerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(crate = "near_sdk::borsh")]
pub enum RequestKind {
    BondLess(UnderlyingAmount),
    Revoke,
}

/// who issued the pending request
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(crate = "near_sdk::borsh")]
pub enum RequestOrigin {
    Operator,
    /// issued while processing the undelegation queue on behalf of a withdrawal batch
    Withdrawal(BatchId),
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct PendingRequest {
    pub kind: RequestKind,
    pub origin: RequestOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationState {
    None,
    Delegated(UnderlyingAmount),
    BondLessPending {
        delegated: UnderlyingAmount,
        amount: UnderlyingAmount,
    },
    RevokePending {
        delegated: UnderlyingAmount,
    },
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct Ledger {
    id: LedgerId,
    balance: UnderlyingAmount,
    delegations: BTreeMap<AccountId, UnderlyingAmount>,
    pending_requests: BTreeMap<AccountId, PendingRequest>,
}

impl Ledger {
    pub fn new(id: LedgerId) -> Self {
        Self {
            id,
            balance: UnderlyingAmount::ZERO,
            delegations: BTreeMap::new(),
            pending_requests: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> LedgerId {
        self.id
    }

    pub fn balance(&self) -> UnderlyingAmount {
        self.balance
    }

    pub fn delegations(&self) -> &BTreeMap<AccountId, UnderlyingAmount> {
        &self.delegations
    }

    pub fn delegation(&self, agent: &AccountId) -> UnderlyingAmount {
        self.delegations
            .get(agent)
            .copied()
            .unwrap_or(UnderlyingAmount::ZERO)
    }

    pub fn total_delegated(&self) -> UnderlyingAmount {
        self.delegations.values().copied().sum()
    }

    pub fn pending_request(&self, agent: &AccountId) -> Option<PendingRequest> {
        self.pending_requests.get(agent).copied()
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.pending_requests.is_empty()
    }

    pub fn pending_requests(&self) -> &BTreeMap<AccountId, PendingRequest> {
        &self.pending_requests
    }

    /// a ledger can only be removed when it holds no funds and has no delegations
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero()
            && self.delegations.values().all(UnderlyingAmount::is_zero)
            && self.pending_requests.is_empty()
    }

    pub fn state(&self, agent: &AccountId) -> DelegationState {
        let delegated = match self.delegations.get(agent) {
            Some(delegated) => *delegated,
            None => return DelegationState::None,
        };
        match self.pending_requests.get(agent).map(|request| request.kind) {
            None => DelegationState::Delegated(delegated),
            Some(RequestKind::BondLess(amount)) => DelegationState::BondLessPending { delegated, amount },
            Some(RequestKind::Revoke) => DelegationState::RevokePending { delegated },
        }
    }

    pub fn credit(&mut self, amount: UnderlyingAmount) -> Result<(), StakingPoolError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(StakingPoolError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn debit(&mut self, amount: UnderlyingAmount) -> Result<(), StakingPoolError> {
        self.balance = self.balance.checked_sub(amount).ok_or(
            StakingPoolError::InsufficientLedgerBalance {
                balance: self.balance.value(),
                requested: amount.value(),
            },
        )?;
        Ok(())
    }

    /// starts a new delegation relationship funded from the ledger balance
    pub fn delegate(
        &mut self,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError> {
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        if self.delegations.contains_key(agent) {
            return Err(StakingPoolError::InvalidState(DELEGATION_EXISTS));
        }
        self.debit(amount)?;
        self.delegations.insert(agent.clone(), amount);
        Ok(())
    }

    pub fn bond_more(
        &mut self,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError> {
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        let delegated = self.check_no_pending_request(agent)?;
        self.debit(amount)?;
        self.delegations.insert(
            agent.clone(),
            delegated
                .checked_add(amount)
                .ok_or(StakingPoolError::ArithmeticOverflow)?,
        );
        Ok(())
    }

    pub fn schedule_bond_less(
        &mut self,
        agent: &AccountId,
        amount: UnderlyingAmount,
        origin: RequestOrigin,
    ) -> Result<(), StakingPoolError> {
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        let delegated = self.check_no_pending_request(agent)?;
        if amount > delegated {
            return Err(StakingPoolError::InsufficientLedgerBalance {
                balance: delegated.value(),
                requested: amount.value(),
            });
        }
        self.pending_requests.insert(
            agent.clone(),
            PendingRequest {
                kind: RequestKind::BondLess(amount),
                origin,
            },
        );
        Ok(())
    }

    /// equivalent to bond-less of the full delegated amount
    pub fn schedule_revoke(
        &mut self,
        agent: &AccountId,
        origin: RequestOrigin,
    ) -> Result<(), StakingPoolError> {
        self.check_no_pending_request(agent)?;
        self.pending_requests.insert(
            agent.clone(),
            PendingRequest {
                kind: RequestKind::Revoke,
                origin,
            },
        );
        Ok(())
    }

    /// clears the pending request - the delegated amount is unchanged
    pub fn cancel_request(&mut self, agent: &AccountId) -> Result<PendingRequest, StakingPoolError> {
        self.pending_requests
            .remove(agent)
            .ok_or(StakingPoolError::NoPendingRequest)
    }

    /// Clears the pending request after the agent executed it.
    ///
    /// `remaining` is the delegation amount reported by the agent after execution. A zero amount
    /// ends the relationship.
    pub fn execute_request(
        &mut self,
        agent: &AccountId,
        remaining: UnderlyingAmount,
    ) -> Result<PendingRequest, StakingPoolError> {
        let request = self
            .pending_requests
            .remove(agent)
            .ok_or(StakingPoolError::NoPendingRequest)?;
        self.sync_delegation(agent, remaining);
        Ok(request)
    }

    /// records the delegation amount reported by the agent, e.g., after rewards were compounded
    pub fn sync_delegation(&mut self, agent: &AccountId, amount: UnderlyingAmount) {
        if amount.is_zero() {
            self.delegations.remove(agent);
        } else {
            self.delegations.insert(agent.clone(), amount);
        }
    }

    fn check_no_pending_request(
        &self,
        agent: &AccountId,
    ) -> Result<UnderlyingAmount, StakingPoolError> {
        let delegated = *self
            .delegations
            .get(agent)
            .ok_or(StakingPoolError::InvalidState(DELEGATION_DOES_NOT_EXIST))?;
        if self.pending_requests.contains_key(agent) {
            return Err(StakingPoolError::InvalidState(PENDING_REQUEST_EXISTS));
        }
        Ok(delegated)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn collator() -> AccountId {
        "collator.near".parse().unwrap()
    }

    fn funded_ledger(balance: u128) -> Ledger {
        let mut ledger = Ledger::new(LedgerId(1));
        ledger.credit(balance.into()).unwrap();
        ledger
    }

    #[test]
    fn delegate_moves_funds_from_balance() {
        let mut ledger = funded_ledger(100);
        assert_eq!(ledger.state(&collator()), DelegationState::None);

        ledger.delegate(&collator(), 60.into()).unwrap();
        assert_eq!(ledger.balance(), UnderlyingAmount(40));
        assert_eq!(
            ledger.state(&collator()),
            DelegationState::Delegated(60.into())
        );

        match ledger.delegate(&collator(), 10.into()) {
            Err(StakingPoolError::InvalidState(_)) => (),
            other => panic!("expected InvalidState, but got {:?}", other),
        }

        let err = ledger.bond_more(&collator(), 50.into()).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_LEDGER_BALANCE");
        ledger.bond_more(&collator(), 40.into()).unwrap();
        assert_eq!(ledger.delegation(&collator()), UnderlyingAmount(100));
        assert!(ledger.balance().is_zero());
    }

    /// Given a delegation with a pending bond-less request
    /// When another request is scheduled for the same agent
    /// Then it fails with INVALID_STATE
    #[test]
    fn only_one_pending_request_per_agent() {
        let mut ledger = funded_ledger(100);
        ledger.delegate(&collator(), 100.into()).unwrap();
        ledger
            .schedule_bond_less(&collator(), 30.into(), RequestOrigin::Operator)
            .unwrap();
        assert_eq!(
            ledger.state(&collator()),
            DelegationState::BondLessPending {
                delegated: 100.into(),
                amount: 30.into()
            }
        );

        let err = ledger
            .schedule_revoke(&collator(), RequestOrigin::Operator)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        let err = ledger.bond_more(&collator(), 1.into()).unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        ledger.cancel_request(&collator()).unwrap();
        assert_eq!(
            ledger.state(&collator()),
            DelegationState::Delegated(100.into())
        );
        ledger
            .schedule_revoke(&collator(), RequestOrigin::Operator)
            .unwrap();
        assert_eq!(
            ledger.state(&collator()),
            DelegationState::RevokePending {
                delegated: 100.into()
            }
        );
    }

    #[test]
    fn bond_less_is_capped_at_delegation() {
        let mut ledger = funded_ledger(100);
        ledger.delegate(&collator(), 100.into()).unwrap();
        let err = ledger
            .schedule_bond_less(&collator(), 101.into(), RequestOrigin::Operator)
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_LEDGER_BALANCE");
    }

    #[test]
    fn execute_and_cancel_require_pending_request() {
        let mut ledger = funded_ledger(100);
        ledger.delegate(&collator(), 100.into()).unwrap();
        assert_eq!(
            ledger.cancel_request(&collator()),
            Err(StakingPoolError::NoPendingRequest)
        );
        assert_eq!(
            ledger.execute_request(&collator(), 0.into()),
            Err(StakingPoolError::NoPendingRequest)
        );

        ledger
            .schedule_revoke(&collator(), RequestOrigin::Withdrawal(BatchId(1)))
            .unwrap();
        let request = ledger.execute_request(&collator(), 0.into()).unwrap();
        assert_eq!(request.origin, RequestOrigin::Withdrawal(BatchId(1)));
        assert_eq!(ledger.state(&collator()), DelegationState::None);
        assert!(ledger.is_empty());
    }
}
