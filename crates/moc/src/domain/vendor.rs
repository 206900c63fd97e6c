use {
    alloy::primitives::{Address, U256},
    serde::Serialize,
    serde_with::{DisplayFromStr, serde_as},
};

/// Registration of a vendor, the referrer collecting a markup on the trades
/// routed through it.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vendor {
    pub account: Address,
    pub is_active: bool,
    #[serde_as(as = "DisplayFromStr")]
    pub markup: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub total_paid_in_governance: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub staking: U256,
}
