//! Netting and settlement of withdrawal batches, and distribution of settled withdrawal claims.

use crate::domain::{BatchId, BlockTimeHeight, Disposition, UnderlyingAmount};
use crate::errors::{illegal_state, invariants, StakingPoolError};
use crate::events::Event;
use crate::near::log;
use crate::StakingPool;
use near_sdk::AccountId;
use std::collections::BTreeMap;

impl<A, T, Z> StakingPool<A, T, Z> {
    /// Plans how to draw the amount from the unassigned remainder of the oldest withdrawal batches.
    ///
    /// At most `round_unscheduled_undelegations_max_iter` batches are visited. The planned draws may
    /// sum to less than the requested amount.
    pub(crate) fn plan_batch_draws(
        &self,
        amount: UnderlyingAmount,
    ) -> Vec<(BatchId, UnderlyingAmount)> {
        let mut remaining = amount;
        let mut draws = vec![];
        for batch in self
            .batches
            .values()
            .filter(|batch| !batch.unassigned().is_zero())
            .take(self.config.round_unscheduled_undelegations_max_iter() as usize)
        {
            if remaining.is_zero() {
                break;
            }
            let draw = remaining.min(batch.unassigned());
            draws.push((batch.id(), draw));
            remaining -= draw;
        }
        draws
    }

    /// amount the withdrawal batches within the iteration limit can absorb
    pub(crate) fn absorbable_undelegation(&self) -> UnderlyingAmount {
        self.batches
            .values()
            .filter(|batch| !batch.unassigned().is_zero())
            .take(self.config.round_unscheduled_undelegations_max_iter() as usize)
            .map(|batch| batch.unassigned())
            .sum()
    }

    /// ## Errors
    /// - INVALID_STATE if the batches within the iteration limit cannot absorb the amount
    pub(crate) fn plan_full_batch_draws(
        &self,
        amount: UnderlyingAmount,
    ) -> Result<Vec<(BatchId, UnderlyingAmount)>, StakingPoolError> {
        let draws = self.plan_batch_draws(amount);
        let planned: UnderlyingAmount = draws.iter().map(|(_, draw)| *draw).sum();
        if planned < amount {
            return Err(StakingPoolError::InvalidState(
                illegal_state::WITHDRAWAL_WINDOW_EXCEEDED,
            ));
        }
        Ok(draws)
    }

    /// Moves the amount from the pending delegation into the withdrawal reserve, covering the oldest
    /// withdrawal batches. Batches that become complete are settled.
    ///
    /// The caller is responsible to check that the amount does not exceed either pending side.
    pub(crate) fn net_out(&mut self, amount: UnderlyingAmount) -> Result<(), StakingPoolError> {
        let draws = self.plan_full_batch_draws(amount)?;
        let now = BlockTimeHeight::from_env();
        for (batch_id, draw) in draws {
            let batch = self
                .batches
                .get_mut(&batch_id)
                .ok_or(StakingPoolError::InvariantViolated(
                    illegal_state::BATCH_SHOULD_EXIST,
                ))?;
            batch.net(draw);
            if batch.settle(now) {
                log_batch_settled(batch_id, batch.settlement().map(|s| s.payout()));
            }
        }
        self.pending_delegation -= amount;
        self.pending_undelegation -= amount;
        self.withdrawal_reserve += amount;
        Ok(())
    }

    /// Moves the amount from the pending delegation straight into `to_claim`, crediting the oldest
    /// withdrawal claims of the oldest batches in FIFO order. A claim that is only partly covered
    /// keeps its remainder in the queue.
    ///
    /// All changes are staged and only committed once every draw has been matched with claims.
    /// The caller is responsible to check that the amount does not exceed either pending side.
    ///
    /// Returns the number of claims that were fully credited.
    pub(crate) fn credit_claims(&mut self, amount: UnderlyingAmount) -> Result<u32, StakingPoolError> {
        let draws = self.plan_full_batch_draws(amount)?;
        let now = BlockTimeHeight::from_env();

        let mut batches = Vec::with_capacity(draws.len());
        let mut uncredited: BTreeMap<BatchId, UnderlyingAmount> = BTreeMap::new();
        for (batch_id, draw) in draws {
            let mut batch = self
                .batches
                .get(&batch_id)
                .cloned()
                .ok_or(StakingPoolError::InvariantViolated(
                    illegal_state::BATCH_SHOULD_EXIST,
                ))?;
            batch.credit(draw)?;
            batches.push(batch);
            uncredited.insert(batch_id, draw);
        }

        let mut claims = self.withdrawal_claims.clone();
        let mut credits: BTreeMap<AccountId, UnderlyingAmount> = BTreeMap::new();
        let mut fully_credited = 0;
        claims.retain_mut(|claim| {
            let remaining = match uncredited.get_mut(&claim.batch_id) {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => return true,
            };
            let credit = claim.amount.min(*remaining);
            *remaining -= credit;
            claim.amount -= credit;
            *credits.entry(claim.delegator.clone()).or_default() += credit;
            if claim.amount.is_zero() {
                fully_credited += 1;
                false
            } else {
                true
            }
        });
        if uncredited.values().any(|remaining| !remaining.is_zero()) {
            return Err(StakingPoolError::InvariantViolated(
                invariants::IN_UNDELEGATION,
            ));
        }
        let in_undelegation = self
            .in_undelegation
            .checked_sub(amount)
            .ok_or(StakingPoolError::InvariantViolated(
                invariants::IN_UNDELEGATION,
            ))?;

        for mut batch in batches {
            let batch_id = batch.id();
            if batch.is_empty() {
                self.batches.remove(&batch_id);
                continue;
            }
            if batch.settle(now) {
                log_batch_settled(batch_id, batch.settlement().map(|s| s.payout()));
            }
            self.batches.insert(batch_id, batch);
        }
        self.withdrawal_claims = claims;
        for (delegator, credit) in credits {
            *self.delegator_to_claim.entry(delegator).or_default() += credit;
        }
        self.pending_delegation -= amount;
        self.pending_undelegation -= amount;
        self.to_claim += amount;
        self.in_undelegation = in_undelegation;
        Ok(fully_credited)
    }

    /// Credits up to `max_claims` withdrawal claims in FIFO order, stopping at the first claim whose
    /// batch has not yet been settled.
    ///
    /// Each claim is applied to a staged copy of its batch, which is only committed once the share is
    /// covered by the withdrawal reserve.
    ///
    /// Returns the number of credited claims and the total amount credited.
    pub(crate) fn distribute_claims(
        &mut self,
        max_claims: u32,
    ) -> Result<(u32, UnderlyingAmount), StakingPoolError> {
        let mut claims = std::mem::take(&mut self.withdrawal_claims);
        let mut credited = UnderlyingAmount::ZERO;
        let mut error = None;
        let run = claims.process_up_to(max_claims, u32::MAX, |claim| {
            let mut batch = match self.batches.get(&claim.batch_id) {
                Some(batch) => batch.clone(),
                None => {
                    error = Some(StakingPoolError::InvariantViolated(
                        illegal_state::BATCH_SHOULD_EXIST,
                    ));
                    return Disposition::Halt;
                }
            };
            if !batch.is_settled() {
                return Disposition::Halt;
            }
            let share = match batch.distribute(claim.amount) {
                Ok(share) => share,
                Err(err) => {
                    error = Some(err);
                    return Disposition::Halt;
                }
            };
            if share > self.withdrawal_reserve {
                error = Some(StakingPoolError::InvariantViolated(
                    invariants::UNDERLYING_BALANCE,
                ));
                return Disposition::Halt;
            }
            if batch.is_fully_distributed() {
                self.batches.remove(&claim.batch_id);
            } else {
                self.batches.insert(claim.batch_id, batch);
            }
            self.withdrawal_reserve -= share;
            self.to_claim += share;
            self.in_undelegation = self.in_undelegation.saturating_sub(claim.amount);
            *self
                .delegator_to_claim
                .entry(claim.delegator.clone())
                .or_default() += share;
            credited += share;
            Disposition::Consumed
        });
        self.withdrawal_claims = claims;
        let run = run?;
        match error {
            Some(error) => Err(error),
            None => Ok((run.consumed, credited)),
        }
    }
}

pub(crate) fn log_batch_settled(batch_id: BatchId, payout: Option<UnderlyingAmount>) {
    if let Some(payout) = payout {
        log(Event::BatchSettled { batch_id, payout });
    }
}

#[cfg(test)]
mod test {
    use crate::domain::UnderlyingAmount;
    use crate::interface::{Operator, StakingService};
    use crate::test_utils::*;
    use near_sdk::json_types::U128;

    /// Given a settled batch whose payout is no longer covered by the withdrawal reserve
    /// When its claims are distributed
    /// Then the distribution fails and neither the batch nor the claim is changed
    #[test]
    fn distribution_is_not_applied_when_reserve_is_short() {
        let mut pool = new_pool();
        pool.deposit(&alice(), 100.into()).unwrap();
        pool.schedule_withdraw(&alice(), 30.into()).unwrap();
        pool.net_out_pending(&operator()).unwrap();
        let settlement = pool.batch(1.into()).unwrap().settlement().unwrap();
        assert_eq!(settlement.payout(), UnderlyingAmount(30));

        pool.withdrawal_reserve = UnderlyingAmount(10);
        let err = pool.execute_undelegations(&operator(), 10).unwrap_err();
        assert_eq!(err.code(), "INVARIANT_VIOLATED");
        let batch = pool.batch(1.into()).unwrap();
        assert_eq!(batch.settlement().unwrap(), settlement);
        assert_eq!(
            batch.settlement().unwrap().undistributed_payout(),
            UnderlyingAmount(30)
        );
        assert_eq!(pool.queue_lengths().withdrawal_claims, 1);
        assert_eq!(pool.claimable(&alice()), U128(0));

        // once the reserve is restored the same claim is paid in full
        pool.withdrawal_reserve = UnderlyingAmount(30);
        pool.execute_undelegations(&operator(), 10).unwrap();
        assert_eq!(pool.claimable(&alice()), U128(30));
        pool.audit().unwrap();
    }

    /// Given a batch covered by netting
    /// When part of a later batch is credited directly
    /// Then the claims of both batches are credited in FIFO order
    #[test]
    fn credited_and_settled_claims_share_the_queue() {
        let mut pool = new_pool();
        pool.deposit(&alice(), 100.into()).unwrap();
        pool.deposit(&bob(), 100.into()).unwrap();
        pool.schedule_withdraw(&alice(), 20.into()).unwrap();
        pool.net_out_pending(&operator()).unwrap();
        pool.schedule_withdraw(&bob(), 20.into()).unwrap();

        pool.make_claimable(&operator(), 5.into()).unwrap();
        assert_eq!(pool.claimable(&bob()), U128(5));
        // alice's claim still waits for distribution
        assert_eq!(pool.claimable(&alice()), U128(0));
        pool.audit().unwrap();

        pool.execute_undelegations(&operator(), 10).unwrap();
        assert_eq!(pool.claimable(&alice()), U128(20));
        assert_eq!(pool.claimable(&bob()), U128(5));
        assert_eq!(pool.pending_undelegation(), UnderlyingAmount(15));
        pool.audit().unwrap();
    }
}
