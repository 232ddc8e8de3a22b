use crate::domain::{BatchId, UnderlyingAmount};
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};
use near_sdk::AccountId;

/// A single withdrawal request waiting for its batch to be settled.
///
/// `amount` is the underlying value of the burned LST at the published exchange rate when the
/// request was made.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct WithdrawalClaim {
    pub delegator: AccountId,
    pub batch_id: BatchId,
    pub amount: UnderlyingAmount,
}
