use near_sdk::{
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    AccountId,
};

/// permission checked pool operations
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq,
)]
#[borsh(crate = "near_sdk::borsh")]
#[serde(crate = "near_sdk::serde")]
pub enum Operation {
    Bootstrap,
    Rebase,
    NetOutPending,
    MakeClaimable,
    ScheduleUndelegation,
    ProcessUndelegationQueue,
    ExecuteUndelegations,
    EnqueueDelegation,
    ProcessDelegationQueue,
    ManageLedgers,
    MoveLedgerFunds,
    ManageDelegations,
    ActivateInLiquidation,
    UpdateConfig,
}

/// Decides who may invoke permission checked pool operations.
pub trait Authorizer {
    fn authorize(&self, operation: Operation, caller: &AccountId) -> bool;
}
