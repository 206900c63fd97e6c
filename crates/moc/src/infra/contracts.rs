//! Resolution of the protocol contract addresses.
//!
//! Only the aggregator and the root protocol contract are configured. Every
//! other address is read from the chain once at startup.

use {
    crate::domain::mode::Mode,
    alloy::{dyn_abi::DynSolType, primitives::Address, sol_types::SolCall},
    contracts::{MoC, MoCConnector, MoCState},
    ethrpc::{Aggregator, Batch, Decoded, multicall},
    serde::Serialize,
    thiserror::Error,
    tracing::instrument,
};

/// Addresses known before anything is read from the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bootstrap {
    pub multicall: Address,
    pub moc: Address,
    pub legacy: Option<Legacy>,
}

/// Pegged token being replaced and the contract swapping it for the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Legacy {
    pub pegged: Address,
    pub migrator: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractSet {
    pub mode: Mode,
    pub multicall: Address,
    pub moc: Address,
    pub connector: Address,
    pub state: Address,
    pub inrate: Address,
    pub exchange: Address,
    pub settlement: Address,
    pub pegged: Address,
    pub collateral: Address,
    /// Only deployments collateralized by a token have one.
    pub reserve_token: Option<Address>,
    pub governance: Address,
    pub vendors: Address,
    pub legacy: Option<Legacy>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read the connector address")]
    Connector(#[source] alloy::contract::Error),
    #[error(transparent)]
    Aggregate(#[from] multicall::Error),
    #[error("could not resolve the {0} address")]
    Unresolved(&'static str),
}

impl ContractSet {
    #[instrument(skip_all, fields(%mode))]
    pub async fn resolve(
        aggregator: &Aggregator,
        mode: Mode,
        bootstrap: Bootstrap,
    ) -> Result<Self, Error> {
        let connector = MoC::new(bootstrap.moc, aggregator.provider().clone())
            .connector()
            .call()
            .await
            .map_err(Error::Connector)?;
        tracing::debug!(%connector, "read connector");

        let mut batch = Batch::new();
        let mut push = |name: &'static str, data: Vec<u8>| {
            batch.push(name, connector, data, DynSolType::Address);
        };
        push("mocState", MoCConnector::mocStateCall {}.abi_encode());
        push("mocInrate", MoCConnector::mocInrateCall {}.abi_encode());
        push("mocExchange", MoCConnector::mocExchangeCall {}.abi_encode());
        push("mocSettlement", MoCConnector::mocSettlementCall {}.abi_encode());
        let (pegged, collateral) = match mode {
            Mode::Coinbase => {
                push("docToken", MoCConnector::docTokenCall {}.abi_encode());
                push("bproToken", MoCConnector::bproTokenCall {}.abi_encode());
                ("docToken", "bproToken")
            }
            Mode::ReserveToken => {
                push("stableToken", MoCConnector::stableTokenCall {}.abi_encode());
                push("riskProToken", MoCConnector::riskProTokenCall {}.abi_encode());
                push("reserveToken", MoCConnector::reserveTokenCall {}.abi_encode());
                ("stableToken", "riskProToken")
            }
        };
        let resolved = batch.execute(aggregator, None).await?;
        let state = required(&resolved, "mocState")?;

        let mut batch = Batch::new();
        batch
            .push(
                "getMoCToken",
                state,
                MoCState::getMoCTokenCall {}.abi_encode(),
                DynSolType::Address,
            )
            .push(
                "getMoCVendors",
                state,
                MoCState::getMoCVendorsCall {}.abi_encode(),
                DynSolType::Address,
            );
        let governance = batch.execute(aggregator, None).await?;

        let contracts = Self {
            mode,
            multicall: bootstrap.multicall,
            moc: bootstrap.moc,
            connector,
            state,
            inrate: required(&resolved, "mocInrate")?,
            exchange: required(&resolved, "mocExchange")?,
            settlement: required(&resolved, "mocSettlement")?,
            pegged: required(&resolved, pegged)?,
            collateral: required(&resolved, collateral)?,
            reserve_token: match mode {
                Mode::Coinbase => None,
                Mode::ReserveToken => Some(required(&resolved, "reserveToken")?),
            },
            governance: required(&governance, "getMoCToken")?,
            vendors: required(&governance, "getMoCVendors")?,
            legacy: bootstrap.legacy,
        };
        tracing::info!(?contracts, "resolved protocol contracts");
        Ok(contracts)
    }
}

fn required(decoded: &Decoded<&'static str>, name: &'static str) -> Result<Address, Error> {
    decoded
        .address(&name)
        .filter(|address| !address.is_zero())
        .ok_or(Error::Unresolved(name))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{primitives::Bytes, providers::mock::Asserter, sol_types::SolValue},
        ethrpc::{mock_provider, multicall::testing::aggregate_response},
    };

    fn bootstrap() -> Bootstrap {
        Bootstrap {
            multicall: Address::repeat_byte(0xaa),
            moc: Address::repeat_byte(0xbb),
            legacy: None,
        }
    }

    fn address(byte: u8) -> (bool, Vec<u8>) {
        (true, Address::repeat_byte(byte).abi_encode())
    }

    #[tokio::test]
    async fn resolves_reserve_token_deployment() {
        let asserter = Asserter::new();
        let aggregator = Aggregator::new(Address::repeat_byte(0xaa), mock_provider(asserter.clone()));
        asserter.push_success(&Bytes::from(Address::repeat_byte(0xcc).abi_encode()));
        asserter.push_success(&aggregate_response(
            10,
            (1..=7).map(address).collect(),
        ));
        asserter.push_success(&aggregate_response(10, vec![address(8), address(9)]));

        let contracts = ContractSet::resolve(&aggregator, Mode::ReserveToken, bootstrap())
            .await
            .unwrap();

        assert_eq!(contracts.connector, Address::repeat_byte(0xcc));
        assert_eq!(contracts.state, Address::repeat_byte(1));
        assert_eq!(contracts.settlement, Address::repeat_byte(4));
        assert_eq!(contracts.pegged, Address::repeat_byte(5));
        assert_eq!(contracts.collateral, Address::repeat_byte(6));
        assert_eq!(contracts.reserve_token, Some(Address::repeat_byte(7)));
        assert_eq!(contracts.governance, Address::repeat_byte(8));
        assert_eq!(contracts.vendors, Address::repeat_byte(9));
    }

    #[tokio::test]
    async fn coinbase_deployment_has_no_reserve_token() {
        let asserter = Asserter::new();
        let aggregator = Aggregator::new(Address::repeat_byte(0xaa), mock_provider(asserter.clone()));
        asserter.push_success(&Bytes::from(Address::repeat_byte(0xcc).abi_encode()));
        asserter.push_success(&aggregate_response(
            10,
            (1..=6).map(address).collect(),
        ));
        asserter.push_success(&aggregate_response(10, vec![address(8), address(9)]));

        let contracts = ContractSet::resolve(&aggregator, Mode::Coinbase, bootstrap())
            .await
            .unwrap();

        assert_eq!(contracts.reserve_token, None);
        assert_eq!(contracts.collateral, Address::repeat_byte(6));
    }

    #[tokio::test]
    async fn failed_address_read_is_unresolved() {
        let asserter = Asserter::new();
        let aggregator = Aggregator::new(Address::repeat_byte(0xaa), mock_provider(asserter.clone()));
        asserter.push_success(&Bytes::from(Address::repeat_byte(0xcc).abi_encode()));
        let mut results = (1..=6).map(address).collect::<Vec<_>>();
        results[1] = (false, vec![]);
        asserter.push_success(&aggregate_response(10, results));
        asserter.push_success(&aggregate_response(10, vec![address(8), address(9)]));

        let err = ContractSet::resolve(&aggregator, Mode::Coinbase, bootstrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unresolved("mocInrate")));
    }
}
