//! Commissions charged by the protocol on mints and the choice of the asset
//! paying for them.

use {
    super::{
        balance::UserBalance,
        mode::PaymentAsset,
        snapshot::{Field, StateSnapshot},
    },
    alloy::primitives::U256,
    bigdecimal::{BigDecimal, Zero},
    number::{DEFAULT_DECIMALS, from_fixed_point},
    serde::Serialize,
};

/// Commission amounts as computed by the inrate contract, in wei.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommissionQuote {
    pub commission_in_reserve: U256,
    pub commission_in_governance: U256,
    pub vendor_markup: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub asset: PaymentAsset,
    /// Commission plus vendor markup when paid with the reserve asset.
    pub commission_in_reserve: BigDecimal,
    /// Commission plus vendor markup when paid with the governance token.
    /// `None` when the prices needed for the conversion are unavailable.
    pub commission_in_governance: Option<BigDecimal>,
    /// Reserve amount the user has to provide for the trade.
    pub total: BigDecimal,
}

/// Decides which asset pays the commission of a trade worth
/// `trade_reserve_amount` and how much reserve the transaction needs.
///
/// The governance token pays when the account holds enough of it and has
/// granted the protocol a non-zero allowance covering the commission. The
/// contract then deducts the commission itself and no extra reserve is sent.
/// The account's governance balance and allowance are scaled by
/// `governance_decimals`; quoted amounts use the protocol precision.
pub fn decide_payment_and_total(
    snapshot: &StateSnapshot,
    balance: &UserBalance,
    trade_reserve_amount: &BigDecimal,
    quote: &CommissionQuote,
    governance_decimals: u8,
) -> Payment {
    let decimal = |value: U256| from_fixed_point(value, DEFAULT_DECIMALS);
    let markup = decimal(quote.vendor_markup);
    let commission_in_reserve = decimal(quote.commission_in_reserve) + &markup;
    let commission_in_governance = match (
        snapshot.price(Field::ReservePrice),
        snapshot.price(Field::GovernancePrice),
    ) {
        (Ok(reserve_price), Ok(governance_price)) => Some(
            (decimal(quote.commission_in_governance) + &markup) * reserve_price
                / governance_price,
        ),
        _ => {
            tracing::warn!("prices unavailable, commission can only be paid with reserve");
            None
        }
    };

    let held =
        |value: Option<U256>| from_fixed_point(value.unwrap_or_default(), governance_decimals);
    let governance = held(balance.governance);
    let allowance = held(balance.governance_allowance);
    let pays_with_governance = commission_in_governance.as_ref().is_some_and(|required| {
        governance >= *required && !allowance.is_zero() && allowance >= *required
    });

    if pays_with_governance {
        tracing::debug!(commission = ?commission_in_governance, "paying commission with governance token");
        Payment {
            asset: PaymentAsset::Governance,
            total: trade_reserve_amount.clone(),
            commission_in_reserve,
            commission_in_governance,
        }
    } else {
        tracing::debug!(commission = %commission_in_reserve, "paying commission with reserve");
        Payment {
            asset: PaymentAsset::Reserve,
            total: trade_reserve_amount + &commission_in_reserve,
            commission_in_reserve,
            commission_in_governance,
        }
    }
}
