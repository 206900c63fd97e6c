//! Protocol state as read in one pass over the contracts.
//!
//! The snapshot is a flat map from [`Field`] to decoded value. A field whose
//! read failed is kept as `None` so one misbehaving getter never hides the
//! rest of the state.

use {
    super::mode::{Action, Mode, PaymentAsset, TokenKind},
    alloy::primitives::{Address, U256},
    bigdecimal::BigDecimal,
    number::{DEFAULT_DECIMALS, from_fixed_point},
    serde::Serialize,
    serde_with::{DisplayFromStr, serde_as},
    std::{
        collections::BTreeMap,
        fmt::{self, Display, Formatter},
    },
    thiserror::Error,
};

/// Return type of a protocol getter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Uint,
    Address,
    Bool,
}

#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Uint(#[serde_as(as = "DisplayFromStr")] U256),
    Address(Address),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ReservePrice,
    GovernancePrice,
    TcAvailableToRedeem,
    TxAvailableToMint,
    TpAvailableToMint,
    TpAvailableToRedeem,
    C0Leverage,
    C0TargetCoverage,
    X2Leverage,
    TotalReserve,
    ReserveEmaPrice,
    C0InrateBag,
    C0Reserve,
    C0Pegged,
    C0Collateral,
    X2Reserve,
    X2Pegged,
    X2Collateral,
    GlobalCoverage,
    ReservePrecision,
    MocPrecision,
    X2Coverage,
    TcPriceInReserve,
    TcPriceInUsd,
    TcDiscountRate,
    MaxTcWithDiscount,
    TcDiscountPrice,
    TxPriceInReserve,
    TxPriceInTc,
    SpotInrate,
    DayBlockSpan,
    BlockSpan,
    BlocksToSettlement,
    State,
    Paused,
    LiquidationEnabled,
    Protected,
    GovernanceToken,
    GovernancePriceProvider,
    ReservePriceProvider,
    Vendors,
}

impl Field {
    /// Every field, in the order the reads go over the wire.
    pub const ALL: [Self; 41] = [
        Self::ReservePrice,
        Self::GovernancePrice,
        Self::TcAvailableToRedeem,
        Self::TxAvailableToMint,
        Self::TpAvailableToMint,
        Self::TpAvailableToRedeem,
        Self::C0Leverage,
        Self::C0TargetCoverage,
        Self::X2Leverage,
        Self::TotalReserve,
        Self::ReserveEmaPrice,
        Self::C0InrateBag,
        Self::C0Reserve,
        Self::C0Pegged,
        Self::C0Collateral,
        Self::X2Reserve,
        Self::X2Pegged,
        Self::X2Collateral,
        Self::GlobalCoverage,
        Self::ReservePrecision,
        Self::MocPrecision,
        Self::X2Coverage,
        Self::TcPriceInReserve,
        Self::TcPriceInUsd,
        Self::TcDiscountRate,
        Self::MaxTcWithDiscount,
        Self::TcDiscountPrice,
        Self::TxPriceInReserve,
        Self::TxPriceInTc,
        Self::SpotInrate,
        Self::DayBlockSpan,
        Self::BlockSpan,
        Self::BlocksToSettlement,
        Self::State,
        Self::Paused,
        Self::LiquidationEnabled,
        Self::Protected,
        Self::GovernanceToken,
        Self::GovernancePriceProvider,
        Self::ReservePriceProvider,
        Self::Vendors,
    ];
    /// Prices re-read at a past block for the day-over-day comparison.
    pub const HISTORIC: [Self; 4] = [
        Self::ReservePrice,
        Self::GovernancePrice,
        Self::TcPriceInUsd,
        Self::TxPriceInReserve,
    ];

    pub fn kind(self) -> Kind {
        match self {
            Self::Paused | Self::LiquidationEnabled => Kind::Bool,
            Self::GovernanceToken
            | Self::GovernancePriceProvider
            | Self::ReservePriceProvider
            | Self::Vendors => Kind::Address,
            _ => Kind::Uint,
        }
    }
}

/// Identifies one of the twelve commission rate types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateKey {
    pub action: Action,
    pub token: TokenKind,
    pub asset: PaymentAsset,
}

impl RateKey {
    /// Reserve denominated rates first, then governance denominated ones.
    pub fn all() -> impl Iterator<Item = Self> {
        PaymentAsset::ALL.into_iter().flat_map(|asset| {
            TokenKind::ALL.into_iter().flat_map(move |token| {
                Action::ALL
                    .into_iter()
                    .map(move |action| Self { action, token, asset })
            })
        })
    }
}

impl Display for RateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.action, self.token, self.asset)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{0:?} is unavailable in the current snapshot")]
pub struct Unavailable(pub Field);

#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub block: u64,
    pub mode: Mode,
    pub values: BTreeMap<Field, Option<Value>>,
    /// Rate type identifiers as exposed by the inrate contract.
    #[serde_as(as = "BTreeMap<DisplayFromStr, Option<DisplayFromStr>>")]
    pub rate_types: BTreeMap<RateKey, Option<U256>>,
    /// Rate value behind each identifier.
    #[serde_as(as = "BTreeMap<DisplayFromStr, Option<DisplayFromStr>>")]
    pub rates: BTreeMap<RateKey, Option<U256>>,
    pub historic: Option<Historic>,
}

impl StateSnapshot {
    pub fn value(&self, field: Field) -> Option<Value> {
        self.values.get(&field).copied().flatten()
    }

    pub fn uint(&self, field: Field) -> Option<U256> {
        match self.value(field)? {
            Value::Uint(value) => Some(value),
            _ => None,
        }
    }

    pub fn address(&self, field: Field) -> Option<Address> {
        match self.value(field)? {
            Value::Address(value) => Some(value),
            _ => None,
        }
    }

    pub fn flag(&self, field: Field) -> Option<bool> {
        match self.value(field)? {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Field scaled down by the protocol precision.
    pub fn decimal(&self, field: Field) -> Result<BigDecimal, Unavailable> {
        self.uint(field)
            .map(|value| from_fixed_point(value, DEFAULT_DECIMALS))
            .ok_or(Unavailable(field))
    }

    /// Like [`Self::decimal`] but a zero price counts as unavailable since
    /// every consumer divides or multiplies by it.
    pub fn price(&self, field: Field) -> Result<BigDecimal, Unavailable> {
        match self.uint(field) {
            Some(value) if !value.is_zero() => Ok(from_fixed_point(value, DEFAULT_DECIMALS)),
            _ => Err(Unavailable(field)),
        }
    }

    pub fn rate_type(&self, key: RateKey) -> Option<U256> {
        self.rate_types.get(&key).copied().flatten()
    }
}

/// Subset of the snapshot evaluated at `block`, roughly a day earlier.
#[derive(Debug, Clone, Serialize)]
pub struct Historic {
    pub block: u64,
    pub values: BTreeMap<Field, Option<Value>>,
}

impl Historic {
    pub fn uint(&self, field: Field) -> Option<U256> {
        match self.values.get(&field).copied().flatten()? {
            Value::Uint(value) => Some(value),
            _ => None,
        }
    }
}
