//! JSON view models exposed to clients

use crate::config::Config;
use crate::domain::{self, Ledger, QueueRun, RequestKind, RequestOrigin};
use near_sdk::{
    json_types::{U128, U64},
    serde::{Deserialize, Serialize},
    AccountId,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct BlockTimeHeight {
    pub block_height: U64,
    pub block_timestamp: U64,
    pub epoch_height: U64,
}

impl From<domain::BlockTimeHeight> for BlockTimeHeight {
    fn from(value: domain::BlockTimeHeight) -> Self {
        Self {
            block_height: value.block_height().into(),
            block_timestamp: value.block_timestamp().into(),
            epoch_height: value.epoch_height().into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct ExchangeRate {
    /// fixed point with 18 decimals
    pub underlying_per_lst: U128,
    /// fixed point with 18 decimals
    pub lst_per_underlying: U128,
    pub total_backing: U128,
    pub lst_supply: U128,
    pub block_time_height: BlockTimeHeight,
}

impl From<domain::ExchangeRate> for ExchangeRate {
    fn from(value: domain::ExchangeRate) -> Self {
        Self {
            underlying_per_lst: value.underlying_per_lst().into(),
            lst_per_underlying: value.lst_per_underlying().into(),
            total_backing: value.total_backing().value().into(),
            lst_supply: value.lst_supply().value().into(),
            block_time_height: value.block_time_height().into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct PoolBalances {
    /// funds held directly by the pool
    pub underlying_balance: U128,
    pub pending_delegation: U128,
    pub pending_undelegation: U128,
    /// reserved for the delegation queue
    pub queued_delegation: U128,
    /// idle funds earmarked for withdrawal batches that have not been distributed
    pub withdrawal_reserve: U128,
    pub to_claim: U128,
    /// withdrawal requests that have not yet been credited to the delegators
    pub in_undelegation: U128,
    /// deposits minus withdrawal requests
    pub delegated_total: U128,
    pub bootstrap_deposits: U128,
    pub total_deposited: U128,
    pub total_claimed: U128,
    pub ledger_balances: U128,
    pub ledger_delegations: U128,
    pub lst_supply: U128,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct QueueLengths {
    pub undelegation_queue: u32,
    pub execution_queue: u32,
    pub delegation_queue: u32,
    pub withdrawal_claims: u32,
    pub unstake_batches: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub enum PendingRequest {
    BondLess { amount: U128, batch_id: Option<U64> },
    Revoke { batch_id: Option<U64> },
}

impl From<domain::PendingRequest> for PendingRequest {
    fn from(value: domain::PendingRequest) -> Self {
        let batch_id = match value.origin {
            RequestOrigin::Operator => None,
            RequestOrigin::Withdrawal(batch_id) => Some(batch_id.value().into()),
        };
        match value.kind {
            RequestKind::BondLess(amount) => PendingRequest::BondLess {
                amount: amount.value().into(),
                batch_id,
            },
            RequestKind::Revoke => PendingRequest::Revoke { batch_id },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct Delegation {
    pub agent: AccountId,
    pub amount: U128,
    pub pending_request: Option<PendingRequest>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct LedgerView {
    pub index: u32,
    pub id: U64,
    pub balance: U128,
    pub delegations: Vec<Delegation>,
}

impl LedgerView {
    pub fn new(index: usize, ledger: &Ledger) -> Self {
        Self {
            index: index as u32,
            id: ledger.id().value().into(),
            balance: ledger.balance().value().into(),
            delegations: ledger
                .delegations()
                .iter()
                .map(|(agent, amount)| Delegation {
                    agent: agent.clone(),
                    amount: amount.value().into(),
                    pending_request: ledger.pending_request(agent).map(Into::into),
                })
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct ConfigView {
    pub undelegation_queue_max_iter: u32,
    pub dao_delegation_queue_max_iter: u32,
    pub round_unscheduled_undelegations_max_iter: u32,
    pub queue_entry_max_retries: u32,
    pub max_lst_supply: U128,
    pub max_delegation_per_agent: U128,
    pub max_deposit: U128,
}

impl From<Config> for ConfigView {
    fn from(config: Config) -> Self {
        Self {
            undelegation_queue_max_iter: config.undelegation_queue_max_iter(),
            dao_delegation_queue_max_iter: config.dao_delegation_queue_max_iter(),
            round_unscheduled_undelegations_max_iter: config
                .round_unscheduled_undelegations_max_iter(),
            queue_entry_max_retries: config.queue_entry_max_retries(),
            max_lst_supply: config.max_lst_supply().value().into(),
            max_delegation_per_agent: config.max_delegation_per_agent().value().into(),
            max_deposit: config.max_deposit().value().into(),
        }
    }
}

/// config fields to update - unset fields are left unchanged
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(crate = "near_sdk::serde")]
pub struct ConfigUpdate {
    pub undelegation_queue_max_iter: Option<u32>,
    pub dao_delegation_queue_max_iter: Option<u32>,
    pub round_unscheduled_undelegations_max_iter: Option<u32>,
    pub queue_entry_max_retries: Option<u32>,
    pub max_lst_supply: Option<U128>,
    pub max_delegation_per_agent: Option<U128>,
    pub max_deposit: Option<U128>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(crate = "near_sdk::serde")]
pub struct QueueRunSummary {
    pub consumed: u32,
    pub requeued: u32,
    pub halted: bool,
}

impl From<QueueRun> for QueueRunSummary {
    fn from(run: QueueRun) -> Self {
        Self {
            consumed: run.consumed,
            requeued: run.requeued,
            halted: run.halted,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(crate = "near_sdk::serde")]
pub struct UndelegationRun {
    /// agent requests that were executed
    pub executed: u32,
    /// agent requests that were rejected and requeued
    pub requeued: u32,
    /// withdrawal claims that were credited to delegators
    pub distributed: u32,
}
