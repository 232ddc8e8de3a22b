use crate::domain::UnderlyingAmount;
use crate::errors::StakingPoolError;
use crate::interface::{ConfigUpdate, ConfigView, QueueLengths, QueueRunSummary, UndelegationRun};
use near_sdk::AccountId;

/// Operator workflows that move funds between the pool, its ledgers and the withdrawal batches.
///
/// Every change method is permission checked through the pool's authorizer.
pub trait Operator {
    ////////////////////////////
    //     VIEW METHODS    ///
    // //////////////////////

    fn config(&self) -> ConfigView;

    fn queue_lengths(&self) -> QueueLengths;

    fn in_liquidation(&self) -> bool;

    /// checks the pool accounting invariants
    ///
    /// ## Errors
    /// - INVARIANT_VIOLATED naming the broken invariant
    fn audit(&self) -> Result<(), StakingPoolError>;

    //////////////////////////////
    //     CHANGE METHODS    ///
    // ////////////////////////

    /// Nets as much pending delegation against pending undelegation as the withdrawal batches
    /// within the iteration limit can absorb. No staking agent call is made.
    ///
    /// ## Errors
    /// - NOTHING_TO_NET if either side is exhausted
    fn net_out_pending(&mut self, caller: &AccountId) -> Result<UnderlyingAmount, StakingPoolError>;

    /// Nets the specified amount of pending delegation against pending undelegation.
    ///
    /// ## Errors
    /// - ZERO_AMOUNT if the amount is zero
    /// - NOTHING_TO_NET if the amount exceeds either side
    /// - INVALID_STATE if the withdrawal batches within the iteration limit cannot absorb the amount
    fn net_out_pending_amount(
        &mut self,
        caller: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<UnderlyingAmount, StakingPoolError>;

    /// Moves the amount of idle pending delegation straight into `to_claim`, crediting the oldest
    /// withdrawal claims without touching a staking agent. A partly covered claim keeps its
    /// remainder queued.
    ///
    /// Returns the amount that was credited to delegators, which is always `amount`.
    ///
    /// ## Errors
    /// - ZERO_AMOUNT if the amount is zero
    /// - NOTHING_TO_NET if the amount exceeds either pending side
    /// - INVALID_STATE if the withdrawal batches within the iteration limit cannot absorb the amount
    fn make_claimable(
        &mut self,
        caller: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<UnderlyingAmount, StakingPoolError>;

    /// Draws the amount from the pending undelegation (oldest withdrawal batches first) and
    /// enqueues undelegation requests against the ledger's delegation to the agent.
    ///
    /// Returns the tickets of the enqueued requests.
    ///
    /// ## Errors
    /// - INVALID_LEDGER if the ledger does not exist
    /// - INVALID_STATE if the ledger does not delegate to the agent, if the amount exceeds the
    ///   pending undelegation, or if the batches within the iteration limit cannot absorb the amount
    /// - INSUFFICIENT_LEDGER_BALANCE if the amount plus already queued undelegations exceed the
    ///   ledger's delegation to the agent
    fn schedule_undelegation(
        &mut self,
        caller: &AccountId,
        ledger_index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<Vec<u64>, StakingPoolError>;

    /// Issues bond-less / revoke requests for the oldest undelegation queue entries. Blocked
    /// entries are moved to the back of the queue.
    ///
    /// ## Errors
    /// - UNDELEGATION_STALLED if an entry within the processing window has used up its retries
    fn process_undelegation_queue(
        &mut self,
        caller: &AccountId,
    ) -> Result<QueueRunSummary, StakingPoolError>;

    /// Executes up to `max_iterations` issued undelegation requests in FIFO order, stopping at the
    /// first request whose delay has not yet elapsed. Released funds settle their withdrawal batches,
    /// and up to `max_iterations` settled withdrawal claims are credited to the delegators.
    ///
    /// `max_iterations` is capped by the configured `undelegation_queue_max_iter`.
    fn execute_undelegations(
        &mut self,
        caller: &AccountId,
        max_iterations: u32,
    ) -> Result<UndelegationRun, StakingPoolError>;

    /// Reserves the amount from the pending delegation and enqueues it for delegation through the
    /// ledger to the agent.
    ///
    /// ## Errors
    /// - INSUFFICIENT_PENDING_DELEGATION if the pending delegation is too low
    fn enqueue_delegation(
        &mut self,
        caller: &AccountId,
        ledger_index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<u64, StakingPoolError>;

    fn process_delegation_queue(
        &mut self,
        caller: &AccountId,
    ) -> Result<QueueRunSummary, StakingPoolError>;

    /// One-way switch that unlocks withdrawing ledger funds regardless of pending requests.
    fn activate_in_liquidation(&mut self, caller: &AccountId) -> Result<(), StakingPoolError>;

    /// ## Errors
    /// - INVALID_CONFIG if the merged config is invalid - the config is left unchanged
    fn update_config(
        &mut self,
        caller: &AccountId,
        updates: ConfigUpdate,
    ) -> Result<ConfigView, StakingPoolError>;
}
