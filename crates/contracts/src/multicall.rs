alloy::sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface Multicall2 {
        struct Call {
            address target;
            bytes callData;
        }

        struct CallResult {
            bool success;
            bytes returnData;
        }

        function tryBlockAndAggregate(bool requireSuccess, Call[] calls)
            external
            returns (uint256 blockNumber, bytes32 blockHash, CallResult[] returnData);

        function getEthBalance(address addr) external view returns (uint256 balance);
    }
}

pub type Instance = Multicall2::Multicall2Instance<alloy::providers::DynProvider>;
