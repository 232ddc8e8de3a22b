use crate::domain::{BlockTimeHeight, LstAmount, UnderlyingAmount};
use crate::errors::{illegal_state, StakingPoolError};
use crate::math::mul_div_floor;
use crate::near::UNIT;
use near_sdk::borsh::{BorshDeserialize, BorshSerialize};

/// Published conversion between the underlying asset and the LST at a point in time.
///
/// Both rates are fixed-point numbers scaled by [UNIT]:
/// - `underlying_per_lst = UNIT * total_backing / lst_supply`
/// - `lst_per_underlying = UNIT * lst_supply / total_backing`
///
/// While there is no LST supply the rate is fixed at 1:1. When LST is outstanding but nothing backs
/// it anymore, both rates are zero and no LST can be minted.
///
/// NOTE: conversions always round down
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(crate = "near_sdk::borsh")]
pub struct ExchangeRate {
    underlying_per_lst: u128,
    lst_per_underlying: u128,
    total_backing: UnderlyingAmount,
    lst_supply: LstAmount,
    block_time_height: BlockTimeHeight,
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self {
            underlying_per_lst: UNIT,
            lst_per_underlying: UNIT,
            total_backing: UnderlyingAmount::ZERO,
            lst_supply: LstAmount::ZERO,
            block_time_height: BlockTimeHeight::default(),
        }
    }
}

impl ExchangeRate {
    pub fn compute(
        total_backing: UnderlyingAmount,
        lst_supply: LstAmount,
        block_time_height: BlockTimeHeight,
    ) -> Result<Self, StakingPoolError> {
        if lst_supply.is_zero() {
            return Ok(Self {
                total_backing,
                lst_supply,
                block_time_height,
                ..Self::default()
            });
        }
        if total_backing.is_zero() {
            return Ok(Self {
                underlying_per_lst: 0,
                lst_per_underlying: 0,
                total_backing,
                lst_supply,
                block_time_height,
            });
        }
        let underlying_per_lst = mul_div_floor(UNIT, total_backing.value(), lst_supply.value())
            .ok_or(StakingPoolError::ArithmeticOverflow)?;
        let lst_per_underlying = mul_div_floor(UNIT, lst_supply.value(), total_backing.value())
            .ok_or(StakingPoolError::ArithmeticOverflow)?;
        Ok(Self {
            underlying_per_lst,
            lst_per_underlying,
            total_backing,
            lst_supply,
            block_time_height,
        })
    }

    pub fn underlying_per_lst(&self) -> u128 {
        self.underlying_per_lst
    }

    pub fn lst_per_underlying(&self) -> u128 {
        self.lst_per_underlying
    }

    pub fn total_backing(&self) -> UnderlyingAmount {
        self.total_backing
    }

    pub fn lst_supply(&self) -> LstAmount {
        self.lst_supply
    }

    pub fn block_time_height(&self) -> BlockTimeHeight {
        self.block_time_height
    }

    /// converts underlying to LST rounded down - used to mint
    ///
    /// ## Errors
    /// - INVALID_STATE if the outstanding LST is not backed by any underlying
    pub fn underlying_to_lst(&self, amount: UnderlyingAmount) -> Result<LstAmount, StakingPoolError> {
        if self.is_unbacked() {
            return Err(StakingPoolError::InvalidState(illegal_state::LST_NOT_BACKED));
        }
        mul_div_floor(amount.value(), self.lst_per_underlying, UNIT)
            .map(LstAmount)
            .ok_or(StakingPoolError::ArithmeticOverflow)
    }

    /// converts LST to underlying rounded down - used to burn
    pub fn lst_to_underlying(&self, amount: LstAmount) -> Result<UnderlyingAmount, StakingPoolError> {
        mul_div_floor(amount.value(), self.underlying_per_lst, UNIT)
            .map(UnderlyingAmount)
            .ok_or(StakingPoolError::ArithmeticOverflow)
    }

    pub fn is_base_rate(&self) -> bool {
        self.underlying_per_lst == UNIT && self.lst_per_underlying == UNIT
    }

    /// true if LST is outstanding while the backing is zero
    pub fn is_unbacked(&self) -> bool {
        !self.lst_supply.is_zero() && self.total_backing.is_zero()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn when_lst_supply_is_zero() {
        let rate = ExchangeRate::compute(100.into(), 0.into(), BlockTimeHeight::default()).unwrap();
        assert!(rate.is_base_rate());
        assert_eq!(rate.underlying_to_lst(10.into()).unwrap(), LstAmount(10));
        assert_eq!(rate.lst_to_underlying(10.into()).unwrap(), UnderlyingAmount(10));
    }

    /// Given outstanding LST
    /// When the backing has been slashed to zero
    /// Then the rate is zero instead of the base rate and minting is rejected
    #[test]
    fn when_backing_is_zero() {
        let rate = ExchangeRate::compute(0.into(), 100.into(), BlockTimeHeight::default()).unwrap();
        assert!(!rate.is_base_rate());
        assert!(rate.is_unbacked());
        assert_eq!(rate.underlying_per_lst(), 0);
        assert_eq!(rate.lst_per_underlying(), 0);
        assert_eq!(
            rate.underlying_to_lst(100.into()).unwrap_err().code(),
            "INVALID_STATE"
        );
        assert_eq!(rate.lst_to_underlying(100.into()).unwrap(), UnderlyingAmount::ZERO);

        // once the supply is gone the base rate applies again
        let rate = ExchangeRate::compute(0.into(), 0.into(), BlockTimeHeight::default()).unwrap();
        assert!(rate.is_base_rate());
        assert!(!rate.is_unbacked());
    }

    #[test]
    fn when_rewards_have_accrued() {
        // 6 LST backed by 6 deposited + 3 rewards
        let rate = ExchangeRate::compute(9.into(), 6.into(), BlockTimeHeight::default()).unwrap();
        assert_eq!(rate.underlying_per_lst(), 3 * UNIT / 2);
        assert_eq!(rate.lst_to_underlying(2.into()).unwrap(), UnderlyingAmount(3));
        // lst_per_underlying is floored, so 3 underlying mints 1.99.. LST which rounds down
        assert_eq!(rate.underlying_to_lst(3.into()).unwrap(), LstAmount(1));
    }

    #[test]
    fn conversions_round_down() {
        let rate = ExchangeRate::compute(10.into(), 3.into(), BlockTimeHeight::default()).unwrap();
        // 1 LST = 3.333.. underlying
        assert_eq!(rate.lst_to_underlying(1.into()).unwrap(), UnderlyingAmount(3));
        // 1 underlying = 0.3 LST
        assert_eq!(rate.underlying_to_lst(1.into()).unwrap(), LstAmount(0));
        // product of the two rates never drifts above UNIT
        let product = crate::math::mul_div_floor(
            rate.underlying_per_lst(),
            rate.lst_per_underlying(),
            UNIT,
        )
        .unwrap();
        assert!(product <= UNIT && UNIT - product <= 1);
    }
}
