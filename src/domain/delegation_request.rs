use crate::domain::{LedgerId, UnderlyingAmount};
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};
use near_sdk::AccountId;

/// Pending delegation funds reserved for a ledger and agent.
///
/// When processed, the funds are moved into the ledger and delegated, either as a new delegation or
/// by bonding more on the existing one.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct DelegationRequest {
    pub ledger_id: LedgerId,
    pub agent: AccountId,
    pub amount: UnderlyingAmount,
}
