//! implements the interfaces on [StakingPool]

mod delegation;
mod ledger_management;
mod operator;
mod settlement;
mod staking_service;
mod undelegation;

use crate::domain::{Ledger, LedgerId, UnderlyingAmount};
use crate::errors::StakingPoolError;
use crate::interface::{Authorizer, Operation, StakingAgent};
use crate::StakingPool;
use near_sdk::AccountId;

impl<A, T, Z: Authorizer> StakingPool<A, T, Z> {
    /// ## Errors
    /// - NOT_AUTHORIZED if the authorizer denies the caller
    fn authorize(&self, operation: Operation, caller: &AccountId) -> Result<(), StakingPoolError> {
        if self.authorizer.authorize(operation, caller) {
            Ok(())
        } else {
            Err(StakingPoolError::NotAuthorized {
                caller: caller.clone(),
            })
        }
    }
}

impl<A, T, Z> StakingPool<A, T, Z> {
    fn ledger_at(&self, index: usize) -> Result<&Ledger, StakingPoolError> {
        self.ledgers
            .get(index)
            .ok_or(StakingPoolError::InvalidLedger(index))
    }

    fn ledger_position(&self, ledger_id: LedgerId) -> Option<usize> {
        self.ledgers
            .iter()
            .position(|ledger| ledger.id() == ledger_id)
    }

    /// recorded delegations to the agent summed over all ledgers
    fn agent_delegated_total(&self, agent: &AccountId) -> UnderlyingAmount {
        self.ledgers
            .iter()
            .map(|ledger| ledger.delegation(agent))
            .sum()
    }

    /// ## Errors
    /// - MAX_DELEGATION_EXCEEDED if delegating the amount would exceed the max delegation per agent
    fn check_max_delegation(
        &self,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError> {
        let max = self.config.max_delegation_per_agent();
        let delegated = self
            .agent_delegated_total(agent)
            .checked_add(amount)
            .ok_or(StakingPoolError::ArithmeticOverflow)?;
        if delegated > max {
            return Err(StakingPoolError::MaxDelegationExceeded {
                agent: agent.clone(),
                delegated: delegated.value(),
                max: max.value(),
            });
        }
        Ok(())
    }

    /// true if any queue entry refers to the ledger
    fn is_ledger_queued(&self, ledger_id: LedgerId) -> bool {
        self.undelegation_queue
            .items()
            .any(|request| request.ledger_id == ledger_id)
            || self
                .execution_queue
                .items()
                .any(|issued| issued.ledger_id == ledger_id)
            || self
                .delegation_queue
                .items()
                .any(|request| request.ledger_id == ledger_id)
    }
}

impl<A: StakingAgent, T, Z> StakingPool<A, T, Z> {
    /// Pool assets valued with the agent reported delegation amounts, minus the liabilities towards
    /// delegators that have already redeemed their LST.
    ///
    /// `total_backing = underlying_balance + ledger balances + delegations - to_claim - in_undelegation`
    pub(crate) fn total_backing(&self) -> Result<UnderlyingAmount, StakingPoolError> {
        let mut assets = self.underlying_balance;
        for ledger in &self.ledgers {
            assets = assets
                .checked_add(ledger.balance())
                .ok_or(StakingPoolError::ArithmeticOverflow)?;
            for agent in ledger.delegations().keys() {
                assets = assets
                    .checked_add(self.agent.delegation_amount(ledger.id(), agent))
                    .ok_or(StakingPoolError::ArithmeticOverflow)?;
            }
        }
        Ok(assets.saturating_sub(self.to_claim + self.in_undelegation))
    }
}

#[cfg(test)]
mod test {
    use crate::interface::{LedgerManagement, Operator, StakingService};
    use crate::near::UNIT;
    use crate::test_utils::*;
    use near_sdk::json_types::U128;
    use quickcheck_macros::quickcheck;

    fn withdraw(pool: &mut TestPool, account: &near_sdk::AccountId, amount: u128) {
        let balance = pool.lst_balance(account).0;
        if balance > 0 {
            let _ = pool.schedule_withdraw(account, (amount % balance + 1).into());
        }
    }

    /// Applies a pseudo random workflow step to the pool as its own transaction. Rejected steps are
    /// expected to leave the pool unchanged, which the invariants checked by the callers verify.
    fn apply(pool: &mut TestPool, op: u8, amount: u8) {
        new_transaction();
        let amount = u128::from(amount) + 1;
        match op % 16 {
            0 => {
                let _ = pool.deposit(&alice(), amount.into());
            }
            1 => {
                let _ = pool.deposit(&bob(), amount.into());
            }
            2 => withdraw(pool, &alice(), amount),
            3 => withdraw(pool, &bob(), amount),
            4 => {
                let _ = pool.net_out_pending(&operator());
            }
            5 => {
                let _ = pool.make_claimable(&operator(), amount.into());
            }
            6 => {
                let _ = pool.execute_undelegations(&operator(), 10);
            }
            7 => {
                let _ = pool.claim(&alice());
            }
            8 => {
                let _ = pool.claim(&bob());
            }
            9 => {
                let _ = pool.deposit_to_ledger(&operator(), 0, amount.into());
            }
            10 => {
                if let Some(ledger) = pool.ledger(0) {
                    let amount = amount.min(ledger.balance.0);
                    if amount > 0 {
                        let _ = if ledger.delegations.is_empty() {
                            pool.delegate(&operator(), 0, &collator(), amount.into(), None)
                        } else {
                            pool.bond_more(&operator(), 0, &collator(), amount.into())
                        };
                    }
                }
            }
            11 => {
                let pending = pool.pending_undelegation().value();
                if pending > 0 {
                    let _ = pool.schedule_undelegation(
                        &operator(),
                        0,
                        &collator(),
                        amount.min(pending).into(),
                    );
                }
            }
            12 => {
                let _ = pool.process_undelegation_queue(&operator());
            }
            13 => pool.agent_mut().advance_past_delay(),
            14 => {
                let _ = pool.enqueue_delegation(&operator(), 0, &collator(), amount.into());
            }
            _ => {
                let _ = pool.process_delegation_queue(&operator());
            }
        }
    }

    fn new_pool_with_ledger() -> TestPool {
        let mut pool = new_pool();
        pool.add_ledger(&operator()).unwrap();
        pool
    }

    /// Without rewards or slashing, no sequence of deposits, withdrawals, delegation, undelegation,
    /// netting and claims moves the exchange rate away from the base rate in either direction.
    #[quickcheck]
    fn rate_is_neutral_without_rewards(ops: Vec<(u8, u8)>) -> bool {
        let mut pool = new_pool_with_ledger();
        ops.into_iter().all(|(op, amount)| {
            apply(&mut pool, op, amount);
            new_transaction();
            let rate = pool.rebase(&bob()).unwrap();
            pool.audit().is_ok()
                && (rate.lst_supply == U128(0)
                    || (rate.underlying_per_lst == U128(UNIT)
                        && rate.lst_per_underlying == U128(UNIT)))
        })
    }

    /// Funds are only moved around: deposits minus claims are held by the pool or its ledgers.
    #[quickcheck]
    fn funds_are_conserved(ops: Vec<(u8, u8)>) -> bool {
        let mut pool = new_pool_with_ledger();
        ops.into_iter().all(|(op, amount)| {
            apply(&mut pool, op, amount);
            let balances = pool.balances();
            balances.underlying_balance.0
                + balances.ledger_balances.0
                + balances.ledger_delegations.0
                == balances.total_deposited.0 - balances.total_claimed.0
        })
    }

    /// Executing undelegations never calls the staking agent more often than the requested
    /// iterations, whether the calls succeed, are rejected, or are not yet executable.
    #[quickcheck]
    fn undelegation_execution_is_bounded(
        requests: u8,
        max_iterations: u8,
        failures: u8,
        past_delay: bool,
    ) -> bool {
        let requests = u32::from(requests % 8) + 1;
        let max_iterations = u32::from(max_iterations % 8) + 1;
        let failures = u32::from(failures % 4);
        let mut pool = new_pool();
        pool.deposit(&alice(), (1000 * u128::from(requests)).into())
            .unwrap();
        for index in 0..requests as usize {
            new_transaction();
            pool.add_ledger(&operator()).unwrap();
            pool.deposit_to_ledger(&operator(), index, 100.into())
                .unwrap();
            pool.delegate(&operator(), index, &collator(), 100.into(), None)
                .unwrap();
        }
        new_transaction();
        pool.schedule_withdraw(&alice(), (10 * u128::from(requests)).into())
            .unwrap();
        for index in 0..requests as usize {
            new_transaction();
            pool.schedule_undelegation(&operator(), index, &collator(), 10.into())
                .unwrap();
        }
        new_transaction();
        pool.process_undelegation_queue(&operator()).unwrap();
        if past_delay {
            pool.agent_mut().advance_past_delay();
        }
        pool.agent_mut().fail_next_calls(failures);

        new_transaction();
        let attempts = pool.agent().attempt_count();
        let run = pool
            .execute_undelegations(&operator(), max_iterations)
            .unwrap();
        let attempts = pool.agent().attempt_count() - attempts;

        let iterations = requests.min(max_iterations);
        let executed = if past_delay {
            iterations - failures.min(iterations)
        } else {
            0
        };
        attempts <= u64::from(max_iterations) && run.executed == executed
    }
}
