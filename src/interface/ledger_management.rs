use crate::domain::{Percent, UnderlyingAmount};
use crate::errors::StakingPoolError;
use crate::interface::LedgerView;
use near_sdk::AccountId;

/// Ledger lifecycle, ledger funds and the per ledger delegation state machine.
///
/// Ledgers are addressed by their index in the pool's ordered ledger list. Removing a ledger moves
/// the last ledger into the removed ledger's index.
pub trait LedgerManagement {
    ////////////////////////////
    //     VIEW METHODS    ///
    // //////////////////////

    fn ledgers(&self) -> Vec<LedgerView>;

    fn ledger(&self, index: usize) -> Option<LedgerView>;

    //////////////////////////////
    //     CHANGE METHODS    ///
    // ////////////////////////

    /// returns the index of the new ledger
    fn add_ledger(&mut self, caller: &AccountId) -> Result<usize, StakingPoolError>;

    /// ## Errors
    /// - LEDGER_NOT_EMPTY if the ledger holds funds, delegations or pending requests, or is
    ///   referenced by a queue entry
    fn remove_ledger(&mut self, caller: &AccountId, index: usize) -> Result<(), StakingPoolError>;

    /// moves pending delegation into the ledger balance
    fn deposit_to_ledger(
        &mut self,
        caller: &AccountId,
        index: usize,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError>;

    /// moves ledger balance back into the pending delegation
    ///
    /// ## Errors
    /// - INVALID_STATE if the ledger has pending delegation requests
    fn withdraw_from_ledger(
        &mut self,
        caller: &AccountId,
        index: usize,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError>;

    /// moves ledger balance back into the pending delegation regardless of pending requests
    ///
    /// ## Errors
    /// - NOT_IN_LIQUIDATION if the pool is not in liquidation
    fn withdraw_from_ledger_in_liquidation(
        &mut self,
        caller: &AccountId,
        index: usize,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError>;

    /// ## Errors
    /// - INSUFFICIENT_LEDGER_BALANCE
    /// - MAX_DELEGATION_EXCEEDED if the agent's delegations across all ledgers would exceed the max
    /// - INVALID_STATE if the ledger already delegates to the agent
    fn delegate(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
        auto_compound: Option<Percent>,
    ) -> Result<(), StakingPoolError>;

    fn bond_more(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError>;

    /// ## Errors
    /// - INVALID_STATE if a request is already pending for the ledger and agent
    fn schedule_bond_less(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError>;

    fn schedule_revoke(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
    ) -> Result<(), StakingPoolError>;

    /// ## Errors
    /// - NO_PENDING_REQUEST
    /// - INVALID_STATE if the request was issued on behalf of a withdrawal batch
    fn cancel_request(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
    ) -> Result<(), StakingPoolError>;

    /// Executes an operator issued request. The released funds are credited to the ledger balance.
    ///
    /// ## Errors
    /// - NO_PENDING_REQUEST
    /// - INVALID_STATE if the request was issued on behalf of a withdrawal batch
    fn execute_request(
        &mut self,
        caller: &AccountId,
        index: usize,
        agent: &AccountId,
    ) -> Result<UnderlyingAmount, StakingPoolError>;
}
