//! Liquid staking receipt token ledger.

use crate::domain::LstAmount;
use crate::errors::StakingPoolError;
use crate::interface::ReceiptToken;
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};
use near_sdk::AccountId;
use std::collections::BTreeMap;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct LiquidStakingToken {
    balances: BTreeMap<AccountId, LstAmount>,
    total_supply: LstAmount,
}

impl LiquidStakingToken {
    /// ## Errors
    /// - ZERO_AMOUNT if the amount is zero
    /// - INSUFFICIENT_BALANCE if the sender's balance is too low
    pub fn transfer(
        &mut self,
        sender: &AccountId,
        receiver: &AccountId,
        amount: LstAmount,
    ) -> Result<(), StakingPoolError> {
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        self.debit(sender, amount)?;
        let balance = self.balance_of(receiver);
        self.balances.insert(receiver.clone(), balance + amount);
        Ok(())
    }

    pub fn holders(&self) -> usize {
        self.balances.len()
    }

    fn debit(&mut self, account: &AccountId, amount: LstAmount) -> Result<(), StakingPoolError> {
        let balance = self.balance_of(account);
        let remaining =
            balance
                .checked_sub(amount)
                .ok_or(StakingPoolError::InsufficientBalance {
                    balance: balance.value(),
                    requested: amount.value(),
                })?;
        if remaining.is_zero() {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), remaining);
        }
        Ok(())
    }
}

impl ReceiptToken for LiquidStakingToken {
    fn mint(&mut self, to: &AccountId, amount: LstAmount) -> Result<(), StakingPoolError> {
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(StakingPoolError::ArithmeticOverflow)?;
        let balance = self.balance_of(to) + amount;
        self.total_supply = total_supply;
        self.balances.insert(to.clone(), balance);
        Ok(())
    }

    fn burn(&mut self, from: &AccountId, amount: LstAmount) -> Result<(), StakingPoolError> {
        self.debit(from, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    fn total_supply(&self) -> LstAmount {
        self.total_supply
    }

    fn balance_of(&self, account: &AccountId) -> LstAmount {
        self.balances
            .get(account)
            .copied()
            .unwrap_or(LstAmount::ZERO)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn alice() -> AccountId {
        "alice.near".parse().unwrap()
    }

    fn bob() -> AccountId {
        "bob.near".parse().unwrap()
    }

    #[test]
    fn mint_transfer_burn() {
        let mut token = LiquidStakingToken::default();
        token.mint(&alice(), 100.into()).unwrap();
        token.transfer(&alice(), &bob(), 40.into()).unwrap();
        assert_eq!(token.balance_of(&alice()), LstAmount(60));
        assert_eq!(token.balance_of(&bob()), LstAmount(40));
        assert_eq!(token.total_supply(), LstAmount(100));

        token.burn(&bob(), 40.into()).unwrap();
        assert_eq!(token.total_supply(), LstAmount(60));
        // zero balances are pruned
        assert_eq!(token.holders(), 1);
    }

    #[test]
    fn burn_more_than_balance_fails() {
        let mut token = LiquidStakingToken::default();
        token.mint(&alice(), 10.into()).unwrap();
        let err = token.burn(&alice(), 11.into()).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
        assert_eq!(token.balance_of(&alice()), LstAmount(10));
        assert_eq!(token.total_supply(), LstAmount(10));

        let err = token.transfer(&alice(), &bob(), 11.into()).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
    }
}
