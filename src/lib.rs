//! Liquid staking pool accounting and scheduling engine.
//!
//! Users deposit the underlying asset and receive a liquid staking receipt token (LST). The pool
//! delegates the deposits to external staking agents through ledgers, and redeems LST through
//! withdrawal batches that are settled once the staking agents release the undelegated funds.
//!
//! [StakingPool] owns all pool state together with its collaborators:
//! - [StakingAgent](interface::StakingAgent) - the external staking system
//! - [ReceiptToken](interface::ReceiptToken) - the LST ledger
//! - [Authorizer](interface::Authorizer) - decides who may invoke permission checked operations
//!
//! Every entry point takes `&mut self`, which serializes all state transitions on a pool instance.
//! Entry points either complete, or fail without changing any state.
//!
//! Each entry point is one transaction against the NEAR runtime. Events are written to the runtime
//! log, which is bounded per transaction, so the host must start a new runtime context per call.

pub mod access;
pub mod config;
pub mod contract;
pub mod domain;
pub mod errors;
pub mod events;
pub mod interface;
pub mod math;
pub mod near;
pub mod token;

#[cfg(test)]
pub(crate) mod test_utils;

use crate::config::Config;
use crate::domain::{
    BatchId, BoundedQueue, DelegationRequest, ExchangeRate, IssuedUndelegation, Ledger, LedgerId,
    UnderlyingAmount, UndelegationRequest, UnstakeBatch, WithdrawalClaim,
};
use crate::errors::StakingPoolError;
use near_sdk::{
    borsh::{BorshDeserialize, BorshSerialize},
    AccountId,
};
use std::collections::BTreeMap;

#[derive(BorshSerialize, BorshDeserialize)]
#[borsh(crate = "near_sdk::borsh")]
pub struct StakingPool<A, T, Z> {
    config: Config,

    agent: A,
    token: T,
    authorizer: Z,

    /// funds held directly by the pool
    /// - `underlying_balance = pending_delegation + queued_delegation + withdrawal_reserve + to_claim`
    underlying_balance: UnderlyingAmount,
    /// deposits that have not yet been moved into a ledger
    pending_delegation: UnderlyingAmount,
    /// withdrawal requests that are neither netted nor scheduled for undelegation
    pending_undelegation: UnderlyingAmount,
    /// pending delegation reserved by the delegation queue
    queued_delegation: UnderlyingAmount,
    /// netted and undelegated funds held for withdrawal batches until they are distributed
    withdrawal_reserve: UnderlyingAmount,
    /// sum of [delegator_to_claim]
    to_claim: UnderlyingAmount,
    /// withdrawal requests that have not yet been credited to [delegator_to_claim]
    in_undelegation: UnderlyingAmount,
    delegator_to_claim: BTreeMap<AccountId, UnderlyingAmount>,

    bootstrap_deposits: UnderlyingAmount,
    delegated_total: UnderlyingAmount,
    total_deposited: UnderlyingAmount,
    total_claimed: UnderlyingAmount,

    ledgers: Vec<Ledger>,
    ledger_id_sequence: LedgerId,

    batch_id_sequence: BatchId,
    open_batch: Option<BatchId>,
    batches: BTreeMap<BatchId, UnstakeBatch>,
    withdrawal_claims: BoundedQueue<WithdrawalClaim>,

    undelegation_queue: BoundedQueue<UndelegationRequest>,
    execution_queue: BoundedQueue<IssuedUndelegation>,
    delegation_queue: BoundedQueue<DelegationRequest>,

    exchange_rate: ExchangeRate,
    in_liquidation: bool,
}

impl<A, T, Z> StakingPool<A, T, Z> {
    /// ## Errors
    /// - INVALID_CONFIG if the config is invalid
    pub fn new(config: Config, agent: A, token: T, authorizer: Z) -> Result<Self, StakingPoolError> {
        config.validate()?;
        Ok(Self {
            config,
            agent,
            token,
            authorizer,
            underlying_balance: UnderlyingAmount::ZERO,
            pending_delegation: UnderlyingAmount::ZERO,
            pending_undelegation: UnderlyingAmount::ZERO,
            queued_delegation: UnderlyingAmount::ZERO,
            withdrawal_reserve: UnderlyingAmount::ZERO,
            to_claim: UnderlyingAmount::ZERO,
            in_undelegation: UnderlyingAmount::ZERO,
            delegator_to_claim: BTreeMap::new(),
            bootstrap_deposits: UnderlyingAmount::ZERO,
            delegated_total: UnderlyingAmount::ZERO,
            total_deposited: UnderlyingAmount::ZERO,
            total_claimed: UnderlyingAmount::ZERO,
            ledgers: vec![],
            ledger_id_sequence: LedgerId::default(),
            batch_id_sequence: BatchId::default(),
            open_batch: None,
            batches: BTreeMap::new(),
            withdrawal_claims: BoundedQueue::default(),
            undelegation_queue: BoundedQueue::default(),
            execution_queue: BoundedQueue::default(),
            delegation_queue: BoundedQueue::default(),
            exchange_rate: ExchangeRate::default(),
            in_liquidation: false,
        })
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// the agent is an external system - mutating it directly does not change pool state
    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    /// used for receipt token operations outside of the pool's scope, e.g., transfers
    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn authorizer(&self) -> &Z {
        &self.authorizer
    }

    pub fn authorizer_mut(&mut self) -> &mut Z {
        &mut self.authorizer
    }

    pub fn underlying_balance(&self) -> UnderlyingAmount {
        self.underlying_balance
    }

    pub fn pending_undelegation(&self) -> UnderlyingAmount {
        self.pending_undelegation
    }

    pub fn to_claim(&self) -> UnderlyingAmount {
        self.to_claim
    }

    pub fn batch(&self, batch_id: BatchId) -> Option<&UnstakeBatch> {
        self.batches.get(&batch_id)
    }

    pub fn published_exchange_rate(&self) -> ExchangeRate {
        self.exchange_rate
    }
}
