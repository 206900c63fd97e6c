use {
    alloy::primitives::U256,
    num::{BigInt, BigUint, bigint::Sign},
};

pub fn u256_to_big_int(input: &U256) -> BigInt {
    BigInt::from_biguint(Sign::Plus, BigUint::from_bytes_be(&input.to_be_bytes::<32>()))
}

/// `None` for negative values and values wider than 256 bits.
pub fn big_int_to_u256(input: &BigInt) -> Option<U256> {
    if input.sign() == Sign::Minus {
        return None;
    }
    U256::try_from_be_slice(&input.magnitude().to_bytes_be())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u256_bounds_survive_big_int() {
        assert_eq!(u256_to_big_int(&U256::ZERO), BigInt::from(0));
        assert_eq!(
            big_int_to_u256(&u256_to_big_int(&U256::MAX)),
            Some(U256::MAX)
        );
    }

    #[test]
    fn out_of_range_big_ints_are_rejected() {
        assert_eq!(big_int_to_u256(&BigInt::from(-1)), None);
        let too_large = u256_to_big_int(&U256::MAX) + 1;
        assert_eq!(big_int_to_u256(&too_large), None);
    }
}
