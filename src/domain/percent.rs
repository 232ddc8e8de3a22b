use crate::errors::StakingPoolError;
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};

/// whole percentage in the range [0, 100]
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, Eq, PartialEq, Default)]
#[borsh(crate = "near_sdk::borsh")]
pub struct Percent(u8);

impl TryFrom<u8> for Percent {
    type Error = StakingPoolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 100 {
            return Err(StakingPoolError::InvalidPercent(value));
        }
        Ok(Self(value))
    }
}

impl Percent {
    pub fn value(&self) -> u8 {
        self.0
    }
}
