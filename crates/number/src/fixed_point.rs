//! Host side amounts are arbitrary precision decimals, contracts only ever see
//! integers scaled by `10^decimals`. Everything crossing that boundary goes
//! through this module.

use {
    crate::conversions::{big_int_to_u256, u256_to_big_int},
    alloy::primitives::U256,
    bigdecimal::{BigDecimal, RoundingMode, num_bigint::Sign},
    std::str::FromStr,
    thiserror::Error,
};

/// Precision used by the reserve asset and every protocol token unless the
/// project configuration says otherwise.
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrecisionError {
    #[error("amount {0} is negative")]
    Negative(String),
    #[error("amount {amount} does not fit into 256 bits at {decimals} decimals")]
    Overflow { amount: String, decimals: u8 },
    #[error("{0:?} is not a decimal amount")]
    Malformed(String),
}

/// Converts a decimal amount into its on-chain integer representation.
///
/// The amount is truncated to `decimals` fractional digits before scaling, so
/// the result never exceeds what the user asked for.
pub fn to_fixed_point(amount: &BigDecimal, decimals: u8) -> Result<U256, PrecisionError> {
    if amount.sign() == Sign::Minus {
        return Err(PrecisionError::Negative(amount.to_string()));
    }
    let (digits, _) = amount
        .with_scale_round(i64::from(decimals), RoundingMode::Down)
        .into_bigint_and_exponent();
    big_int_to_u256(&digits).ok_or_else(|| PrecisionError::Overflow {
        amount: amount.to_string(),
        decimals,
    })
}

/// Converts an on-chain integer back into a decimal amount. Exact.
pub fn from_fixed_point(amount: U256, decimals: u8) -> BigDecimal {
    BigDecimal::new(u256_to_big_int(&amount), i64::from(decimals))
}

/// Parses a user supplied amount.
///
/// Only plain decimal notation is accepted. Hex and exponent forms are
/// rejected because they are how already scaled integers usually sneak in.
pub fn parse_amount(input: &str) -> Result<BigDecimal, PrecisionError> {
    let trimmed = input.trim();
    let plain = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-');
    if !plain {
        return Err(PrecisionError::Malformed(input.to_string()));
    }
    let amount =
        BigDecimal::from_str(trimmed).map_err(|_| PrecisionError::Malformed(input.to_string()))?;
    if amount.sign() == Sign::Minus {
        return Err(PrecisionError::Negative(amount.to_string()));
    }
    Ok(amount)
}

/// Renders an on-chain amount for humans with `digits` fractional digits and
/// `,` as thousands separator. Rounds up, owed amounts are never understated.
pub fn format_visible(amount: U256, decimals: u8, digits: u8) -> String {
    let rounded = from_fixed_point(amount, decimals)
        .with_scale_round(i64::from(digits), RoundingMode::Up)
        .to_plain_string();
    let (whole, fraction) = match rounded.split_once('.') {
        Some((whole, fraction)) => (whole.to_string(), Some(fraction.to_string())),
        None => (rounded, None),
    };
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match fraction {
        Some(fraction) => format!("{grouped}.{fraction}"),
        None => grouped,
    }
}
