//! Operator access list used as the pool's authorizer.
//!
//! - [Operation::Rebase] is open to every account
//! - [Operation::Bootstrap] is reserved for the treasury account
//! - every other operation requires an operator account

use crate::interface::{Authorizer, Operation};
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};
use near_sdk::AccountId;
use std::collections::BTreeSet;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct OperatorAccessList {
    operators: BTreeSet<AccountId>,
    treasury: AccountId,
}

impl OperatorAccessList {
    pub fn new(operator: AccountId, treasury: AccountId) -> Self {
        let mut operators = BTreeSet::new();
        operators.insert(operator);
        Self {
            operators,
            treasury,
        }
    }

    pub fn treasury(&self) -> &AccountId {
        &self.treasury
    }

    pub fn is_operator(&self, account: &AccountId) -> bool {
        self.operators.contains(account)
    }

    /// returns false if the account was already an operator
    pub fn add_operator(&mut self, account: AccountId) -> bool {
        self.operators.insert(account)
    }

    /// returns false if the account was not an operator
    pub fn remove_operator(&mut self, account: &AccountId) -> bool {
        self.operators.remove(account)
    }
}

impl Authorizer for OperatorAccessList {
    fn authorize(&self, operation: Operation, caller: &AccountId) -> bool {
        match operation {
            Operation::Rebase => true,
            Operation::Bootstrap => caller == &self.treasury,
            _ => self.is_operator(caller),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn account(id: &str) -> AccountId {
        id.parse().unwrap()
    }

    #[test]
    fn authorize() {
        let mut access = OperatorAccessList::new(account("operator.near"), account("treasury.near"));
        assert!(access.authorize(Operation::Rebase, &account("alice.near")));
        assert!(access.authorize(Operation::Bootstrap, &account("treasury.near")));
        assert!(!access.authorize(Operation::Bootstrap, &account("operator.near")));
        assert!(access.authorize(Operation::NetOutPending, &account("operator.near")));
        assert!(!access.authorize(Operation::NetOutPending, &account("treasury.near")));

        assert!(access.add_operator(account("alice.near")));
        assert!(access.authorize(Operation::UpdateConfig, &account("alice.near")));
        assert!(access.remove_operator(&account("alice.near")));
        assert!(!access.authorize(Operation::UpdateConfig, &account("alice.near")));
    }
}
