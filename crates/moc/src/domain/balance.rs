use {
    alloy::primitives::{Address, U256},
    serde::Serialize,
    serde_with::{DisplayFromStr, serde_as},
};

/// Balances and allowances of one account. Reads that failed are `None`.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserBalance {
    pub block: u64,
    pub account: Address,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub governance: Option<U256>,
    /// Governance tokens the protocol may pull to pay commissions.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub governance_allowance: Option<U256>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub pegged: Option<U256>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub collateral: Option<U256>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub leveraged: Option<U256>,
    /// Native coin or reserve token, depending on the mode.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub reserve: Option<U256>,
    /// Reserve tokens the protocol may pull. In coinbase mode there is no
    /// allowance and this mirrors the native balance.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub reserve_allowance: Option<U256>,
    /// Pegged tokens queued for redemption at settlement.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub pegged_to_redeem: Option<U256>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub legacy_pegged: Option<U256>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub legacy_pegged_allowance: Option<U256>,
    /// Interest owed if the whole reserve balance went into the leveraged
    /// token.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub potential_leveraged_interest: Option<U256>,
}
