use crate::domain::{LstAmount, UnderlyingAmount};
use crate::errors::StakingPoolError;
use crate::interface::{ExchangeRate, PoolBalances};
use near_sdk::{json_types::U128, AccountId};

pub trait StakingService {
    ////////////////////////////
    //     VIEW METHODS    ///
    // //////////////////////

    fn balances(&self) -> PoolBalances;

    /// returns the published exchange rate
    fn exchange_rate(&self) -> ExchangeRate;

    fn underlying_per_lst(&self) -> U128;

    fn lst_per_underlying(&self) -> U128;

    fn pending_delegation(&self) -> U128;

    fn in_undelegation(&self) -> U128;

    fn delegated_total(&self) -> U128;

    fn bootstrap_deposits(&self) -> U128;

    /// total amount claimed by all delegators
    fn claimed(&self) -> U128;

    /// amount the account can claim
    fn claimable(&self, account: &AccountId) -> U128;

    fn lst_balance(&self, account: &AccountId) -> U128;

    //////////////////////////////
    //     CHANGE METHODS    ///
    // ////////////////////////

    /// Deposits the amount into the pool and mints LST at the published exchange rate.
    ///
    /// The deposit is added to the pending delegation. Returns the amount of LST minted.
    ///
    /// ## Errors
    /// - ZERO_PAYMENT if the amount is zero
    /// - MAX_DELEGATION if the amount exceeds the per deposit ceiling
    /// - MAX_SUPPLY if minting would exceed the max LST supply
    /// - ZERO_AMOUNT if the amount is too small to mint any LST
    fn deposit(
        &mut self,
        caller: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<LstAmount, StakingPoolError>;

    /// Treasury deposit that pre-funds the pool. Accounted identically to [deposit] and tracked in
    /// the bootstrap deposits.
    ///
    /// ## Errors
    /// - NOT_AUTHORIZED if the caller is not permitted to bootstrap the pool
    /// - same as [deposit]
    fn bootstrap(
        &mut self,
        caller: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<LstAmount, StakingPoolError>;

    /// Burns LST at the published exchange rate and records a withdrawal claim for its underlying
    /// value in the open withdrawal batch.
    ///
    /// The claim is credited once the batch has been settled.
    ///
    /// ## Errors
    /// - ZERO_AMOUNT if the amount is zero, or if its underlying value rounds down to zero
    /// - INSUFFICIENT_BALANCE if the caller's LST balance is too low
    fn schedule_withdraw(
        &mut self,
        caller: &AccountId,
        amount: LstAmount,
    ) -> Result<UnderlyingAmount, StakingPoolError>;

    /// Pays out the caller's claimable balance.
    ///
    /// ## Errors
    /// - NOTHING_TO_CLAIM if the caller has nothing to claim
    fn claim(&mut self, caller: &AccountId) -> Result<UnderlyingAmount, StakingPoolError>;

    /// Recomputes the exchange rate from the current pool totals and publishes it. No funds move.
    fn rebase(&mut self, caller: &AccountId) -> Result<ExchangeRate, StakingPoolError>;

    /// Direct transfers of the underlying asset outside of the entry points are always rejected.
    fn receive_transfer(
        &mut self,
        from: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError>;
}
