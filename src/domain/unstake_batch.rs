//! Withdrawal requests are grouped into batches.
//!
//! ## Withdrawal workflow
//! 1. `schedule_withdraw` burns LST and adds the underlying value to the open [UnstakeBatch]
//! 2. netting and undelegation scheduling draw on the oldest batches first. The first draw on a
//!    batch seals it, and later requests open the next batch.
//! 3. the batch is complete once its requested amount is fully covered by netted funds and scheduled
//!    undelegations, and every scheduled undelegation was executed by the staking agent
//! 4. the complete batch is settled: `payout = netted + returned`
//! 5. the payout is distributed pro-rata over the batch's withdrawal claims
//!
//! Rewards or slashing that hit the undelegated funds between request and settlement are shared by
//! all claims in the batch.

use crate::domain::{BatchId, BlockTimeHeight, UnderlyingAmount};
use crate::errors::StakingPoolError;
use crate::math::mul_div_floor;
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct Settlement {
    payout: UnderlyingAmount,
    undistributed_payout: UnderlyingAmount,
    undistributed_requested: UnderlyingAmount,
    settled_at: BlockTimeHeight,
}

impl Settlement {
    pub fn payout(&self) -> UnderlyingAmount {
        self.payout
    }

    pub fn undistributed_payout(&self) -> UnderlyingAmount {
        self.undistributed_payout
    }

    pub fn settled_at(&self) -> BlockTimeHeight {
        self.settled_at
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct UnstakeBatch {
    id: BatchId,
    requested: UnderlyingAmount,
    /// covered by idle funds
    netted: UnderlyingAmount,
    /// covered by undelegation requests
    scheduled: UnderlyingAmount,
    /// released by the staking agent for executed undelegation requests
    returned: UnderlyingAmount,
    /// undelegation requests that have not yet been executed
    unresolved_entries: u32,
    sealed: bool,
    opened_at: BlockTimeHeight,
    settlement: Option<Settlement>,
}

impl UnstakeBatch {
    pub fn new(id: BatchId, opened_at: BlockTimeHeight) -> Self {
        Self {
            id,
            requested: UnderlyingAmount::ZERO,
            netted: UnderlyingAmount::ZERO,
            scheduled: UnderlyingAmount::ZERO,
            returned: UnderlyingAmount::ZERO,
            unresolved_entries: 0,
            sealed: false,
            opened_at,
            settlement: None,
        }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn requested(&self) -> UnderlyingAmount {
        self.requested
    }

    pub fn netted(&self) -> UnderlyingAmount {
        self.netted
    }

    pub fn scheduled(&self) -> UnderlyingAmount {
        self.scheduled
    }

    pub fn returned(&self) -> UnderlyingAmount {
        self.returned
    }

    pub fn unresolved_entries(&self) -> u32 {
        self.unresolved_entries
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn opened_at(&self) -> BlockTimeHeight {
        self.opened_at
    }

    pub fn settlement(&self) -> Option<Settlement> {
        self.settlement
    }

    /// requested amount that is neither netted nor scheduled for undelegation
    pub fn unassigned(&self) -> UnderlyingAmount {
        self.requested.saturating_sub(self.netted + self.scheduled)
    }

    pub fn add_request(&mut self, amount: UnderlyingAmount) -> Result<(), StakingPoolError> {
        if self.sealed {
            return Err(StakingPoolError::InvalidState("withdrawal batch is sealed"));
        }
        self.requested = self
            .requested
            .checked_add(amount)
            .ok_or(StakingPoolError::ArithmeticOverflow)?;
        Ok(())
    }

    /// covers part of the batch with idle funds
    ///
    /// ## Panics
    /// if the amount exceeds the unassigned amount
    pub fn net(&mut self, amount: UnderlyingAmount) {
        assert!(amount <= self.unassigned(), "netted amount exceeds unassigned amount");
        self.sealed = true;
        self.netted += amount;
    }

    /// Covers part of the batch with idle funds that are credited to the batch's claims right away.
    ///
    /// The credited amount leaves the batch, so it takes no part in the settlement payout.
    pub fn credit(&mut self, amount: UnderlyingAmount) -> Result<(), StakingPoolError> {
        if amount > self.unassigned() {
            return Err(StakingPoolError::InvariantViolated(
                "credited amount exceeds unassigned amount",
            ));
        }
        self.sealed = true;
        self.requested -= amount;
        Ok(())
    }

    /// true if every request of the batch was credited directly
    pub fn is_empty(&self) -> bool {
        self.sealed && self.requested.is_zero()
    }

    /// covers part of the batch with an undelegation request
    ///
    /// ## Panics
    /// if the amount exceeds the unassigned amount
    pub fn schedule(&mut self, amount: UnderlyingAmount) {
        assert!(amount <= self.unassigned(), "scheduled amount exceeds unassigned amount");
        self.sealed = true;
        self.scheduled += amount;
        self.unresolved_entries += 1;
    }

    /// records the amount the staking agent released for one of the batch's undelegation requests
    pub fn resolve(&mut self, returned: UnderlyingAmount) {
        self.unresolved_entries = self.unresolved_entries.saturating_sub(1);
        self.returned += returned;
    }

    pub fn is_complete(&self) -> bool {
        self.sealed && self.unassigned().is_zero() && self.unresolved_entries == 0
    }

    /// returns true if the batch was settled by this call
    pub fn settle(&mut self, settled_at: BlockTimeHeight) -> bool {
        if self.settlement.is_some() || !self.is_complete() {
            return false;
        }
        let payout = self.netted + self.returned;
        self.settlement = Some(Settlement {
            payout,
            undistributed_payout: payout,
            undistributed_requested: self.requested,
            settled_at,
        });
        true
    }

    pub fn is_settled(&self) -> bool {
        self.settlement.is_some()
    }

    /// Computes the payout share for a withdrawal claim of `amount` and removes it from the
    /// undistributed payout.
    ///
    /// Shares are computed over what has not yet been distributed, so the last claim of the batch
    /// receives the remainder and per-batch sums are exact.
    pub fn distribute(&mut self, amount: UnderlyingAmount) -> Result<UnderlyingAmount, StakingPoolError> {
        let settlement = self
            .settlement
            .as_mut()
            .ok_or(StakingPoolError::InvalidState("withdrawal batch is not settled"))?;
        if amount > settlement.undistributed_requested {
            return Err(StakingPoolError::InvariantViolated(
                "withdrawal claim exceeds undistributed batch amount",
            ));
        }
        let share = mul_div_floor(
            settlement.undistributed_payout.value(),
            amount.value(),
            settlement.undistributed_requested.value(),
        )
        .map(UnderlyingAmount)
        .ok_or(StakingPoolError::ArithmeticOverflow)?;
        settlement.undistributed_payout -= share;
        settlement.undistributed_requested -= amount;
        Ok(share)
    }

    pub fn is_fully_distributed(&self) -> bool {
        self.settlement
            .map(|settlement| settlement.undistributed_requested.is_zero())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn batch() -> UnstakeBatch {
        UnstakeBatch::new(BatchId(1), BlockTimeHeight::default())
    }

    #[test]
    fn netting_seals_batch() {
        let mut batch = batch();
        batch.add_request(10.into()).unwrap();
        batch.net(4.into());
        assert!(batch.is_sealed());
        assert_eq!(batch.unassigned(), UnderlyingAmount(6));
        assert_eq!(
            batch.add_request(1.into()).unwrap_err().code(),
            "INVALID_STATE"
        );
    }

    /// Given a batch that is partially netted and partially scheduled for undelegation
    /// When the undelegation has not been executed
    /// Then the batch is not settled
    /// When the undelegation is executed with rewards
    /// Then the batch settles with the rewards included in the payout
    #[test]
    fn settles_once_all_entries_are_resolved() {
        let mut batch = batch();
        batch.add_request(10.into()).unwrap();
        batch.net(4.into());
        batch.schedule(6.into());
        assert!(!batch.settle(BlockTimeHeight::default()));

        batch.resolve(8.into());
        assert!(batch.settle(BlockTimeHeight::default()));
        assert_eq!(batch.settlement().unwrap().payout(), UnderlyingAmount(12));
        // settling twice is a no-op
        assert!(!batch.settle(BlockTimeHeight::default()));
    }

    #[test]
    fn distribution_is_pro_rata_and_exact() {
        let mut batch = batch();
        for amount in [1u128, 1, 1] {
            batch.add_request(amount.into()).unwrap();
        }
        batch.schedule(3.into());
        batch.resolve(4.into());
        assert!(batch.settle(BlockTimeHeight::default()));

        // 4 * 1 / 3 = 1, 3 * 1 / 2 = 1, the last claim gets the remainder
        let shares: Vec<u128> = (0..3)
            .map(|_| batch.distribute(1.into()).unwrap().value())
            .collect();
        assert_eq!(shares, vec![1, 1, 2]);
        assert!(batch.is_fully_distributed());
    }

    /// Given a batch of 10 that is partially credited
    /// When the rest is netted
    /// Then the settlement only covers the netted part
    #[test]
    fn credited_amount_leaves_the_batch() {
        let mut batch = batch();
        batch.add_request(10.into()).unwrap();
        batch.credit(4.into()).unwrap();
        assert!(batch.is_sealed());
        assert_eq!(batch.requested(), UnderlyingAmount(6));
        assert_eq!(
            batch.credit(7.into()).unwrap_err().code(),
            "INVARIANT_VIOLATED"
        );

        batch.net(6.into());
        assert!(batch.settle(BlockTimeHeight::default()));
        assert_eq!(batch.distribute(6.into()).unwrap(), UnderlyingAmount(6));
        assert!(batch.is_fully_distributed());

        let mut credited = UnstakeBatch::new(BatchId(2), BlockTimeHeight::default());
        credited.add_request(3.into()).unwrap();
        assert!(!credited.is_empty());
        credited.credit(3.into()).unwrap();
        assert!(credited.is_empty());
    }

    #[test]
    fn distribute_requires_settlement() {
        let mut batch = batch();
        batch.add_request(1.into()).unwrap();
        assert_eq!(
            batch.distribute(1.into()).unwrap_err().code(),
            "INVALID_STATE"
        );
    }
}
