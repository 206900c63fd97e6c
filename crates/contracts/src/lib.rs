//! Bindings for every contract the client talks to.
//!
//! Only the functions that are actually called are declared. Reads that
//! differ between the collateral modes are encoded from signatures at runtime
//! and do not need a binding.

pub mod erc20;
pub mod moc;
pub mod multicall;

pub use {
    erc20::ERC20,
    moc::{MoC, MoCConnector, MoCInrate, MoCState, MoCVendors, TokenMigrator},
    multicall::Multicall2,
};

/// Bucket identifiers are the ASCII bucket name right padded to 32 bytes.
pub mod buckets {
    use alloy::primitives::{B256, b256};

    /// Base bucket holding the pegged and collateral tokens.
    pub const C0: B256 =
        b256!("0x4330000000000000000000000000000000000000000000000000000000000000");
    /// Leveraged bucket holding the leveraged position token.
    pub const X2: B256 =
        b256!("0x5832000000000000000000000000000000000000000000000000000000000000");
}
