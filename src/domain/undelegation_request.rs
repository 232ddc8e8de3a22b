use crate::domain::{BatchId, LedgerId, UnderlyingAmount};
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};
use near_sdk::AccountId;

/// Undelegation scheduled on behalf of a withdrawal batch.
///
/// The request is issued against the staking agent when the undelegation queue is processed.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct UndelegationRequest {
    pub ledger_id: LedgerId,
    pub agent: AccountId,
    pub amount: UnderlyingAmount,
    pub batch_id: BatchId,
}

/// Undelegation request that was issued against the staking agent and is waiting for the agent's
/// delay to elapse before it can be executed.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct IssuedUndelegation {
    pub ledger_id: LedgerId,
    pub agent: AccountId,
    pub batch_id: BatchId,
}
