use near_sdk::{
    borsh::{BorshDeserialize, BorshSerialize},
    env,
};
use std::cmp::Ordering;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[borsh(crate = "near_sdk::borsh")]
pub struct BlockTimeHeight {
    block_height: u64,
    block_timestamp: u64,
    epoch_height: u64,
}

impl PartialOrd for BlockTimeHeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.block_height.cmp(&other.block_height))
    }
}

impl BlockTimeHeight {
    /// [block_height], [block_timestamp], and [epoch_height] are initialized from the NEAR runtime
    /// environment
    ///
    /// ## Panics
    /// if NEAR runtime context is not available
    pub fn from_env() -> Self {
        Self {
            block_height: env::block_height(),
            block_timestamp: env::block_timestamp(),
            epoch_height: env::epoch_height(),
        }
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn block_timestamp(&self) -> u64 {
        self.block_timestamp
    }

    pub fn epoch_height(&self) -> u64 {
        self.epoch_height
    }
}
