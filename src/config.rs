use crate::domain::{LstAmount, UnderlyingAmount};
use crate::errors::StakingPoolError;
use crate::interface::ConfigUpdate;
use crate::near::UNIT;
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct Config {
    /// max number of issued undelegation requests executed per call
    undelegation_queue_max_iter: u32,
    /// max number of delegation queue entries processed per call
    dao_delegation_queue_max_iter: u32,
    /// max number of withdrawal batches visited per netting / scheduling call, and max number of
    /// undelegation queue entries processed per call
    round_unscheduled_undelegations_max_iter: u32,
    /// number of times a queue entry may be requeued before the queue is reported as stalled
    queue_entry_max_retries: u32,
    max_lst_supply: LstAmount,
    /// applies to the sum of delegations to an agent across all ledgers
    max_delegation_per_agent: UnderlyingAmount,
    /// per deposit ceiling
    max_deposit: UnderlyingAmount,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            undelegation_queue_max_iter: 10,
            dao_delegation_queue_max_iter: 10,
            round_unscheduled_undelegations_max_iter: 10,
            queue_entry_max_retries: 5,
            max_lst_supply: LstAmount(1_000_000_000 * UNIT),
            max_delegation_per_agent: UnderlyingAmount(100_000_000 * UNIT),
            max_deposit: UnderlyingAmount(10_000_000 * UNIT),
        }
    }
}

impl Config {
    pub fn undelegation_queue_max_iter(&self) -> u32 {
        self.undelegation_queue_max_iter
    }

    pub fn dao_delegation_queue_max_iter(&self) -> u32 {
        self.dao_delegation_queue_max_iter
    }

    pub fn round_unscheduled_undelegations_max_iter(&self) -> u32 {
        self.round_unscheduled_undelegations_max_iter
    }

    pub fn queue_entry_max_retries(&self) -> u32 {
        self.queue_entry_max_retries
    }

    pub fn max_lst_supply(&self) -> LstAmount {
        self.max_lst_supply
    }

    pub fn max_delegation_per_agent(&self) -> UnderlyingAmount {
        self.max_delegation_per_agent
    }

    pub fn max_deposit(&self) -> UnderlyingAmount {
        self.max_deposit
    }

    /// Merges the specified updates.
    ///
    /// The config is left untouched if the merged config is invalid.
    pub fn apply_updates(&mut self, updates: &ConfigUpdate) -> Result<(), StakingPoolError> {
        let mut config = *self;
        if let Some(value) = updates.undelegation_queue_max_iter {
            config.undelegation_queue_max_iter = value;
        }
        if let Some(value) = updates.dao_delegation_queue_max_iter {
            config.dao_delegation_queue_max_iter = value;
        }
        if let Some(value) = updates.round_unscheduled_undelegations_max_iter {
            config.round_unscheduled_undelegations_max_iter = value;
        }
        if let Some(value) = updates.queue_entry_max_retries {
            config.queue_entry_max_retries = value;
        }
        if let Some(value) = updates.max_lst_supply {
            config.max_lst_supply = value.0.into();
        }
        if let Some(value) = updates.max_delegation_per_agent {
            config.max_delegation_per_agent = value.0.into();
        }
        if let Some(value) = updates.max_deposit {
            config.max_deposit = value.0.into();
        }
        config.validate()?;
        *self = config;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), StakingPoolError> {
        if self.undelegation_queue_max_iter == 0
            || self.dao_delegation_queue_max_iter == 0
            || self.round_unscheduled_undelegations_max_iter == 0
        {
            return Err(StakingPoolError::InvalidConfig(
                "queue iteration limits must not be zero",
            ));
        }
        if self.queue_entry_max_retries == 0 {
            return Err(StakingPoolError::InvalidConfig(
                "queue entry max retries must not be zero",
            ));
        }
        if self.max_lst_supply.is_zero()
            || self.max_delegation_per_agent.is_zero()
            || self.max_deposit.is_zero()
        {
            return Err(StakingPoolError::InvalidConfig("ceilings must not be zero"));
        }
        Ok(())
    }
}
