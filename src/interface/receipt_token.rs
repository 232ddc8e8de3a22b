use crate::domain::LstAmount;
use crate::errors::StakingPoolError;
use near_sdk::AccountId;

/// Fungible receipt token ledger that the pool mints and burns LST through.
pub trait ReceiptToken {
    fn mint(&mut self, to: &AccountId, amount: LstAmount) -> Result<(), StakingPoolError>;

    /// ## Errors
    /// - INSUFFICIENT_BALANCE if the account balance is too low
    fn burn(&mut self, from: &AccountId, amount: LstAmount) -> Result<(), StakingPoolError>;

    fn total_supply(&self) -> LstAmount;

    fn balance_of(&self, account: &AccountId) -> LstAmount;
}
