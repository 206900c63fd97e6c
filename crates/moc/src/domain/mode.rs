use {
    serde::{Deserialize, Serialize},
    std::fmt::{self, Display, Formatter},
};

/// How a deployment is collateralised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Backed by the chain's native coin.
    #[serde(alias = "MoC")]
    Coinbase,
    /// Backed by an ERC20 reserve token.
    #[serde(alias = "RRC20")]
    ReserveToken,
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coinbase => f.write_str("Coinbase"),
            Self::ReserveToken => f.write_str("ReserveToken"),
        }
    }
}

/// Tokens that can be minted and redeemed against the reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// TP
    Pegged,
    /// TC
    Collateral,
    /// TX, lives in bucket X2.
    Leveraged,
}

impl TokenKind {
    pub const ALL: [Self; 3] = [Self::Collateral, Self::Pegged, Self::Leveraged];
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pegged => f.write_str("pegged"),
            Self::Collateral => f.write_str("collateral"),
            Self::Leveraged => f.write_str("leveraged"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Mint,
    Redeem,
}

impl Action {
    pub const ALL: [Self; 2] = [Self::Mint, Self::Redeem];
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mint => f.write_str("mint"),
            Self::Redeem => f.write_str("redeem"),
        }
    }
}

/// Asset a protocol commission is paid with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentAsset {
    Reserve,
    Governance,
}

impl PaymentAsset {
    pub const ALL: [Self; 2] = [Self::Reserve, Self::Governance];
}

impl Display for PaymentAsset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserve => f.write_str("reserve"),
            Self::Governance => f.write_str("governance"),
        }
    }
}
