use crate::domain::{Ledger, LedgerId, Percent, RequestOrigin, UnderlyingAmount};
use crate::errors::{illegal_state, StakingPoolError};
use crate::events::Event;
use crate::interface::{Authorizer, LedgerManagement, LedgerView, Operation, StakingAgent};
use crate::near::log;
use crate::StakingPool;
use near_sdk::AccountId;

impl<A: StakingAgent, T, Z: Authorizer> LedgerManagement for StakingPool<A, T, Z> {
    fn ledgers(&self) -> Vec<LedgerView> {
        self.ledgers
            .iter()
            .enumerate()
            .map(|(index, ledger)| LedgerView::new(index, ledger))
            .collect()
    }

    fn ledger(&self, index: usize) -> Option<LedgerView> {
        self.ledgers
            .get(index)
            .map(|ledger| LedgerView::new(index, ledger))
    }

    fn add_ledger(&mut self, caller: &AccountId) -> Result<usize, StakingPoolError> {
        self.authorize(Operation::ManageLedgers, caller)?;
        let ledger_id = LedgerId(self.ledger_id_sequence.value() + 1);
        self.ledger_id_sequence = ledger_id;
        self.ledgers.push(Ledger::new(ledger_id));
        let index = self.ledgers.len() - 1;
        log(Event::LedgerAdded { index, ledger_id });
        Ok(index)
    }

    fn remove_ledger(&mut self, caller: &AccountId, index: usize) -> Result<(), StakingPoolError> {
        self.authorize(Operation::ManageLedgers, caller)?;
        let ledger = self.ledger_at(index)?;
        let ledger_id = ledger.id();
        if !ledger.is_empty() || self.is_ledger_queued(ledger_id) {
            return Err(StakingPoolError::LedgerNotEmpty);
        }
        self.ledgers.swap_remove(index);
        let moved = self.ledgers.get(index).map(Ledger::id);
        log(Event::LedgerRemoved {
            index,
            ledger_id,
            moved,
        });
        Ok(())
    }

    fn deposit_to_ledger(
        &mut self,
        caller: &AccountId,
        index: usize,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError> {
        self.authorize(Operation::MoveLedgerFunds, caller)?;
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        let mut ledger = self.ledger_at(index)?.clone();
        if amount > self.pending_delegation {
            return Err(StakingPoolError::InsufficientPendingDelegation {
                available: self.pending_delegation.value(),
                requested: amount.value(),
            });
        }
        ledger.credit(amount)?;

        self.ledgers[index] = ledger;
        self.pending_delegation -= amount;
        self.underlying_balance -= amount;
        log(Event::LedgerDeposit {
            ledger_id: self.ledgers[index].id(),
            amount,
        });
        Ok(())
    }

    fn withdraw_from_ledger(
        &mut self,
        caller: &AccountId,
        index: usize,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError> {
        self.authorize(Operation::MoveLedgerFunds, caller)?;
        if self.ledger_at(index)?.has_pending_requests() {
            return Err(StakingPoolError::InvalidState(
                illegal_state::LEDGER_HAS_PENDING_REQUESTS,
            ));
        }
        self.withdraw_ledger_funds(index, amount, false)
    }

    fn withdraw_from_ledger_in_liquidation(
        &mut self,
        caller: &AccountId,
        index: usize,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError> {
        self.authorize(Operation::MoveLedgerFunds, caller)?;
        if !self.in_liquidation {
            return Err(StakingPoolError::NotInLiquidation);
        }
        self.withdraw_ledger_funds(index, amount, true)
    }

    fn delegate(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
        auto_compound: Option<Percent>,
    ) -> Result<(), StakingPoolError> {
        self.authorize(Operation::ManageDelegations, caller)?;
        let mut ledger = self.ledger_at(index)?.clone();
        ledger.delegate(agent, amount)?;
        self.check_max_delegation(agent, amount)?;
        self.agent
            .delegate(ledger.id(), agent, amount, auto_compound)?;

        let ledger_id = ledger.id();
        self.ledgers[index] = ledger;
        log(Event::Delegated {
            ledger_id,
            agent: agent.clone(),
            amount,
            auto_compound: auto_compound.map(|percent| percent.value()),
        });
        Ok(())
    }

    fn bond_more(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError> {
        self.authorize(Operation::ManageDelegations, caller)?;
        let mut ledger = self.ledger_at(index)?.clone();
        ledger.bond_more(agent, amount)?;
        self.check_max_delegation(agent, amount)?;
        self.agent.bond_more(ledger.id(), agent, amount)?;

        let ledger_id = ledger.id();
        self.ledgers[index] = ledger;
        log(Event::BondedMore {
            ledger_id,
            agent: agent.clone(),
            amount,
        });
        Ok(())
    }

    fn schedule_bond_less(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError> {
        self.authorize(Operation::ManageDelegations, caller)?;
        let mut ledger = self.ledger_at(index)?.clone();
        ledger.schedule_bond_less(agent, amount, RequestOrigin::Operator)?;
        self.agent
            .schedule_bond_less(ledger.id(), agent, amount)?;

        let ledger_id = ledger.id();
        self.ledgers[index] = ledger;
        log(Event::BondLessScheduled {
            ledger_id,
            agent: agent.clone(),
            amount,
        });
        Ok(())
    }

    fn schedule_revoke(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
    ) -> Result<(), StakingPoolError> {
        self.authorize(Operation::ManageDelegations, caller)?;
        let mut ledger = self.ledger_at(index)?.clone();
        ledger.schedule_revoke(agent, RequestOrigin::Operator)?;
        self.agent.schedule_revoke(ledger.id(), agent)?;

        let ledger_id = ledger.id();
        self.ledgers[index] = ledger;
        log(Event::RevokeScheduled {
            ledger_id,
            agent: agent.clone(),
        });
        Ok(())
    }

    fn cancel_request(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
    ) -> Result<(), StakingPoolError> {
        self.authorize(Operation::ManageDelegations, caller)?;
        let mut ledger = self.operator_request_ledger(index, agent)?;
        ledger.cancel_request(agent)?;
        self.agent.cancel_request(ledger.id(), agent)?;

        let ledger_id = ledger.id();
        self.ledgers[index] = ledger;
        log(Event::RequestCancelled {
            ledger_id,
            agent: agent.clone(),
        });
        Ok(())
    }

    fn execute_request(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
    ) -> Result<UnderlyingAmount, StakingPoolError> {
        self.authorize(Operation::ManageDelegations, caller)?;
        let mut ledger = self.operator_request_ledger(index, agent)?;
        let ledger_id = ledger.id();
        let released = self.agent.execute_request(ledger_id, agent)?;
        let remaining = self.agent.delegation_amount(ledger_id, agent);
        ledger.execute_request(agent, remaining)?;
        ledger.credit(released)?;

        self.ledgers[index] = ledger;
        log(Event::RequestExecuted {
            ledger_id,
            agent: agent.clone(),
            released,
        });
        Ok(released)
    }
}

impl<A, T, Z> StakingPool<A, T, Z> {
    /// returns a copy of the ledger to stage the change on
    ///
    /// ## Errors
    /// - NO_PENDING_REQUEST if the ledger has no pending request for the agent
    /// - INVALID_STATE if the pending request was issued on behalf of a withdrawal batch
    fn operator_request_ledger(
        &self,
        index: usize,
        agent: &AccountId,
    ) -> Result<Ledger, StakingPoolError> {
        let ledger = self.ledger_at(index)?;
        match ledger.pending_request(agent) {
            None => Err(StakingPoolError::NoPendingRequest),
            Some(request) if request.origin != RequestOrigin::Operator => Err(
                StakingPoolError::InvalidState(illegal_state::REQUEST_OWNED_BY_WITHDRAWAL),
            ),
            Some(_) => Ok(ledger.clone()),
        }
    }

    fn withdraw_ledger_funds(
        &mut self,
        index: usize,
        amount: UnderlyingAmount,
        in_liquidation: bool,
    ) -> Result<(), StakingPoolError> {
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        let mut ledger = self.ledger_at(index)?.clone();
        ledger.debit(amount)?;
        let overflow = || StakingPoolError::ArithmeticOverflow;
        let underlying_balance = self.underlying_balance.checked_add(amount).ok_or_else(overflow)?;
        let pending_delegation = self.pending_delegation.checked_add(amount).ok_or_else(overflow)?;

        let ledger_id = ledger.id();
        self.ledgers[index] = ledger;
        self.underlying_balance = underlying_balance;
        self.pending_delegation = pending_delegation;
        log(Event::LedgerWithdrawal {
            ledger_id,
            amount,
            in_liquidation,
        });
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interface::{ConfigUpdate, Operator, PendingRequest, StakingService};
    use crate::test_utils::*;
    use near_sdk::json_types::{U128, U64};

    /// alice deposits `deposit` and the operator moves `funded` into a new ledger
    fn pool_with_ledger(deposit: u128, funded: u128) -> (TestPool, usize) {
        let mut pool = new_pool();
        pool.deposit(&alice(), deposit.into()).unwrap();
        let index = pool.add_ledger(&operator()).unwrap();
        pool.deposit_to_ledger(&operator(), index, funded.into())
            .unwrap();
        (pool, index)
    }

    #[test]
    fn ledger_funds() {
        let (mut pool, index) = pool_with_ledger(100, 60);
        assert_eq!(pool.pending_delegation(), U128(40));
        assert_eq!(pool.ledger(index).unwrap().balance, U128(60));
        assert_eq!(pool.underlying_balance(), UnderlyingAmount(40));
        pool.audit().unwrap();

        let err = pool
            .deposit_to_ledger(&operator(), index, 41.into())
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_PENDING_DELEGATION");
        let err = pool
            .withdraw_from_ledger(&operator(), index, 61.into())
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_LEDGER_BALANCE");

        pool.withdraw_from_ledger(&operator(), index, 20.into())
            .unwrap();
        assert_eq!(pool.pending_delegation(), U128(60));
        assert_eq!(pool.ledger(index).unwrap().balance, U128(40));
        assert_eq!(pool.balances().ledger_balances, U128(40));
        pool.audit().unwrap();
    }

    /// Given 3 ledgers
    /// When the ledger at index 1 is removed
    /// Then the last ledger moves into index 1
    #[test]
    fn remove_ledger_moves_last_ledger() {
        let mut pool = new_pool();
        pool.deposit(&alice(), 100.into()).unwrap();
        for _ in 0..3 {
            pool.add_ledger(&operator()).unwrap();
        }
        pool.deposit_to_ledger(&operator(), 0, 10.into()).unwrap();

        assert_eq!(
            pool.remove_ledger(&operator(), 0).unwrap_err(),
            StakingPoolError::LedgerNotEmpty
        );
        assert_eq!(
            pool.remove_ledger(&operator(), 3).unwrap_err(),
            StakingPoolError::InvalidLedger(3)
        );

        pool.remove_ledger(&operator(), 1).unwrap();
        let ids: Vec<U64> = pool.ledgers().into_iter().map(|ledger| ledger.id).collect();
        assert_eq!(ids, vec![U64(1), U64(3)]);
        assert_eq!(pool.ledger(1).unwrap().index, 1);

        // ledger IDs are never reused
        assert_eq!(pool.add_ledger(&operator()).unwrap(), 2);
        assert_eq!(pool.ledger(2).unwrap().id, U64(4));
    }

    /// Given a ledger whose whole balance is delegated
    /// When the ledger is removed
    /// Then it is rejected although the ledger balance is zero
    /// And the ledger can be removed once the delegation is revoked and its funds withdrawn
    #[test]
    fn delegating_ledger_cannot_be_removed() {
        let (mut pool, index) = pool_with_ledger(100, 60);
        pool.delegate(&operator(), index, &collator(), 60.into(), None)
            .unwrap();
        assert_eq!(pool.ledger(index).unwrap().balance, U128(0));

        assert_eq!(
            pool.remove_ledger(&operator(), index).unwrap_err(),
            StakingPoolError::LedgerNotEmpty
        );
        assert_eq!(pool.ledgers().len(), 1);

        pool.schedule_revoke(&operator(), index, &collator()).unwrap();
        // the pending request keeps the ledger in place
        assert_eq!(
            pool.remove_ledger(&operator(), index).unwrap_err(),
            StakingPoolError::LedgerNotEmpty
        );
        pool.agent_mut().advance_past_delay();
        pool.execute_request(&operator(), index, &collator())
            .unwrap();
        pool.withdraw_from_ledger(&operator(), index, 60.into())
            .unwrap();
        pool.remove_ledger(&operator(), index).unwrap();
        assert!(pool.ledgers().is_empty());
        pool.audit().unwrap();
    }

    #[test]
    fn queued_ledger_cannot_be_removed() {
        let mut pool = new_pool();
        pool.deposit(&alice(), 100.into()).unwrap();
        let index = pool.add_ledger(&operator()).unwrap();
        pool.enqueue_delegation(&operator(), index, &collator(), 10.into())
            .unwrap();
        assert_eq!(
            pool.remove_ledger(&operator(), index).unwrap_err(),
            StakingPoolError::LedgerNotEmpty
        );
    }

    #[test]
    fn delegate() {
        let (mut pool, index) = pool_with_ledger(100, 60);
        let err = pool
            .delegate(&operator(), index, &collator(), 61.into(), None)
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_LEDGER_BALANCE");

        let auto_compound = Percent::try_from(50u8).unwrap();
        pool.delegate(&operator(), index, &collator(), 40.into(), Some(auto_compound))
            .unwrap();
        assert_eq!(pool.agent().delegation_amount(1, &collator()), 40);
        assert_eq!(pool.agent().auto_compound(1, &collator()), 50);
        let ledger = pool.ledger(index).unwrap();
        assert_eq!(ledger.balance, U128(20));
        assert_eq!(ledger.delegations[0].amount, U128(40));

        let err = pool
            .delegate(&operator(), index, &collator(), 10.into(), None)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        pool.bond_more(&operator(), index, &collator(), 20.into())
            .unwrap();
        assert_eq!(pool.agent().delegation_amount(1, &collator()), 60);
        assert_eq!(pool.ledger(index).unwrap().balance, U128(0));
        assert_eq!(pool.balances().ledger_delegations, U128(60));
        pool.audit().unwrap();
    }

    /// Given an agent that already holds delegations from another ledger
    /// When a delegation would push the agent over the max delegation per agent
    /// Then it fails with MAX_DELEGATION_EXCEEDED and no agent call is made
    #[test]
    fn delegation_per_agent_is_capped_across_ledgers() {
        let mut pool = new_pool();
        pool.update_config(
            &operator(),
            ConfigUpdate {
                max_delegation_per_agent: Some(U128(50)),
                ..ConfigUpdate::default()
            },
        )
        .unwrap();
        pool.deposit(&alice(), 100.into()).unwrap();
        for _ in 0..2 {
            let index = pool.add_ledger(&operator()).unwrap();
            pool.deposit_to_ledger(&operator(), index, 30.into())
                .unwrap();
        }
        pool.delegate(&operator(), 0, &collator(), 30.into(), None)
            .unwrap();
        let call_count = pool.agent().call_count();

        let err = pool
            .delegate(&operator(), 1, &collator(), 30.into(), None)
            .unwrap_err();
        assert_eq!(
            err,
            StakingPoolError::MaxDelegationExceeded {
                agent: collator(),
                delegated: 60,
                max: 50
            }
        );
        assert_eq!(pool.agent().call_count(), call_count);
        assert_eq!(pool.ledger(1).unwrap().balance, U128(30));
        pool.delegate(&operator(), 1, &collator(), 20.into(), None)
            .unwrap();
    }

    #[test]
    fn agent_failure_leaves_ledger_unchanged() {
        let (mut pool, index) = pool_with_ledger(100, 60);
        pool.agent_mut().fail_next_calls(1);
        let err = pool
            .delegate(&operator(), index, &collator(), 40.into(), None)
            .unwrap_err();
        assert_eq!(err.code(), "STAKING_AGENT_FAILURE");
        let ledger = pool.ledger(index).unwrap();
        assert_eq!(ledger.balance, U128(60));
        assert!(ledger.delegations.is_empty());
    }

    #[test]
    fn operator_bond_less() {
        let (mut pool, index) = pool_with_ledger(100, 60);
        pool.delegate(&operator(), index, &collator(), 60.into(), None)
            .unwrap();
        assert_eq!(
            pool.cancel_request(&operator(), index, &collator())
                .unwrap_err(),
            StakingPoolError::NoPendingRequest
        );

        pool.schedule_bond_less(&operator(), index, &collator(), 10.into())
            .unwrap();
        assert_eq!(
            pool.ledger(index).unwrap().delegations[0].pending_request,
            Some(PendingRequest::BondLess {
                amount: U128(10),
                batch_id: None
            })
        );
        let err = pool
            .schedule_revoke(&operator(), index, &collator())
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        let err = pool
            .withdraw_from_ledger(&operator(), index, 1.into())
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        // the agent's delay has not yet elapsed
        let err = pool
            .execute_request(&operator(), index, &collator())
            .unwrap_err();
        assert_eq!(err.code(), "STAKING_AGENT_FAILURE");

        pool.cancel_request(&operator(), index, &collator()).unwrap();
        assert!(pool.ledger(index).unwrap().delegations[0]
            .pending_request
            .is_none());

        pool.schedule_bond_less(&operator(), index, &collator(), 10.into())
            .unwrap();
        pool.agent_mut().advance_past_delay();
        assert_eq!(
            pool.execute_request(&operator(), index, &collator())
                .unwrap(),
            UnderlyingAmount(10)
        );
        let ledger = pool.ledger(index).unwrap();
        assert_eq!(ledger.balance, U128(10));
        assert_eq!(ledger.delegations[0].amount, U128(50));
        pool.audit().unwrap();
    }

    #[test]
    fn operator_revoke() {
        let (mut pool, index) = pool_with_ledger(100, 60);
        pool.delegate(&operator(), index, &collator(), 60.into(), None)
            .unwrap();
        pool.agent_mut().reward(1, &collator(), 5);
        pool.schedule_revoke(&operator(), index, &collator()).unwrap();
        pool.agent_mut().advance_past_delay();

        assert_eq!(
            pool.execute_request(&operator(), index, &collator())
                .unwrap(),
            UnderlyingAmount(65)
        );
        let ledger = pool.ledger(index).unwrap();
        assert_eq!(ledger.balance, U128(65));
        assert!(ledger.delegations.is_empty());
    }

    /// Given a ledger with a pending request
    /// When the pool is in liquidation
    /// Then the ledger balance can be withdrawn regardless of the pending request
    #[test]
    fn withdraw_in_liquidation() {
        let (mut pool, index) = pool_with_ledger(100, 60);
        pool.delegate(&operator(), index, &collator(), 30.into(), None)
            .unwrap();
        pool.schedule_bond_less(&operator(), index, &collator(), 10.into())
            .unwrap();

        assert_eq!(
            pool.withdraw_from_ledger_in_liquidation(&operator(), index, 30.into())
                .unwrap_err(),
            StakingPoolError::NotInLiquidation
        );

        pool.activate_in_liquidation(&operator()).unwrap();
        pool.withdraw_from_ledger_in_liquidation(&operator(), index, 30.into())
            .unwrap();
        assert_eq!(pool.ledger(index).unwrap().balance, U128(0));
        assert_eq!(pool.pending_delegation(), U128(70));
        pool.audit().unwrap();
    }
}
