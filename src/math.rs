use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer.
    pub struct U256(4);
}

/// computes `value * numerator / denominator` rounded down
///
/// returns None if the denominator is zero or the result does not fit into u128
pub fn mul_div_floor(value: u128, numerator: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    let result = U256::from(value) * U256::from(numerator) / U256::from(denominator);
    if result > U256::from(u128::MAX) {
        return None;
    }
    Some(result.as_u128())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mul_div_floor_does_not_overflow_on_intermediate_product() {
        assert_eq!(mul_div_floor(u128::MAX, 2, 2), Some(u128::MAX));
        assert_eq!(mul_div_floor(10, 1, 3), Some(3));
        assert_eq!(mul_div_floor(u128::MAX, 3, 2), None);
        assert_eq!(mul_div_floor(1, 1, 0), None);
    }
}
