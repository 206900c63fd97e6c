alloy::sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface MoC {
        function connector() external view returns (address);

        function docAmountToRedeem(address owner) external view returns (uint256);
        function bproxBalanceOf(bytes32 bucket, address owner) external view returns (uint256);
        function stableTokenAmountToRedeem(address owner) external view returns (uint256);
        function riskProxBalanceOf(bytes32 bucket, address owner) external view returns (uint256);

        function mintDocVendors(uint256 btcToMint, address vendorAccount) external payable;
        function redeemFreeDocVendors(uint256 docAmount, address vendorAccount) external;
        function mintBProVendors(uint256 btcToMint, address vendorAccount) external payable;
        function redeemBProVendors(uint256 bproAmount, address vendorAccount) external;
        function mintBProxVendors(bytes32 bucket, uint256 btcToMint, address vendorAccount)
            external
            payable;
        function redeemBProxVendors(bytes32 bucket, uint256 bproxAmount, address vendorAccount)
            external;

        function mintStableTokenVendors(uint256 resTokensToMint, address vendorAccount) external;
        function redeemFreeStableTokenVendors(uint256 stableTokenAmount, address vendorAccount)
            external;
        function mintRiskProVendors(uint256 resTokensToMint, address vendorAccount) external;
        function redeemRiskProVendors(uint256 riskProAmount, address vendorAccount) external;
        function mintRiskProxVendors(bytes32 bucket, uint256 resTokensToMint, address vendorAccount)
            external;
        function redeemRiskProxVendors(bytes32 bucket, uint256 riskProxAmount, address vendorAccount)
            external;
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface MoCConnector {
        function mocState() external view returns (address);
        function mocInrate() external view returns (address);
        function mocExchange() external view returns (address);
        function mocSettlement() external view returns (address);
        function docToken() external view returns (address);
        function bproToken() external view returns (address);
        function stableToken() external view returns (address);
        function riskProToken() external view returns (address);
        function reserveToken() external view returns (address);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface MoCState {
        function getMoCToken() external view returns (address);
        function getMoCVendors() external view returns (address);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface MoCInrate {
        function commissionRatesByTxType(uint8 txType) external view returns (uint256);
        function calcCommissionValue(uint256 amount, uint8 txType) external view returns (uint256);
        function calculateVendorMarkup(address vendorAccount, uint256 amount)
            external
            view
            returns (uint256 markup);
        function calcMintInterestValues(bytes32 bucket, uint256 amount)
            external
            view
            returns (uint256);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface MoCVendors {
        function vendors(address account)
            external
            view
            returns (bool isActive, uint256 markup, uint256 totalPaidInMoC, uint256 staking);
        function addStake(uint256 staking) external;
        function removeStake(uint256 staking) external;
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface TokenMigrator {
        function migrateToken() external;
    }
}
