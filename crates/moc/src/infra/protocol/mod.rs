//! Read access to the protocol contracts.

use {
    crate::{
        domain::{
            balance::UserBalance,
            commission::CommissionQuote,
            mode::{Action, Mode, PaymentAsset, TokenKind},
            snapshot::{RateKey, StateSnapshot},
            vendor::Vendor,
        },
        infra::contracts::ContractSet,
    },
    alloy::{
        dyn_abi::DynSolType,
        primitives::{Address, U256},
        sol_types::SolCall,
    },
    contracts::{ERC20, MoC, MoCInrate, MoCVendors, Multicall2, buckets},
    ethrpc::{Aggregator, Batch, errors::ignore_non_node_error, multicall},
    std::sync::Arc,
    thiserror::Error,
    tracing::instrument,
};

mod pipeline;
pub mod schema;

pub use schema::SchemaError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Aggregate(#[from] multicall::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("contract call failed")]
    Call(#[from] alloy::contract::Error),
    #[error("rate type of {0} is unavailable")]
    RateType(RateKey),
    #[error("commission read {0} failed")]
    Commission(&'static str),
}

/// Everything operations need to know about the chain.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProtocolReading: Send + Sync {
    /// Fresh state of the protocol. Individual failed reads are `None`.
    async fn snapshot(&self) -> Result<StateSnapshot, Error>;

    async fn user_balance(&self, account: Address) -> Result<UserBalance, Error>;

    /// Commissions the protocol charges for a trade worth `reserve_amount`.
    async fn quote(
        &self,
        snapshot: &StateSnapshot,
        reserve_amount: U256,
        token: TokenKind,
        action: Action,
    ) -> Result<CommissionQuote, Error>;

    /// Interest charged for minting the leveraged token with `reserve_amount`.
    async fn mint_interest(&self, reserve_amount: U256) -> Result<U256, Error>;

    async fn vendor(&self, account: Address) -> Result<Vendor, Error>;
}

pub struct Protocol {
    aggregator: Aggregator,
    contracts: Arc<ContractSet>,
    vendor: Address,
    historic: bool,
}

impl Protocol {
    pub fn new(
        aggregator: Aggregator,
        contracts: Arc<ContractSet>,
        vendor: Address,
        historic: bool,
    ) -> Self {
        Self {
            aggregator,
            contracts,
            vendor,
            historic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BalanceSlot {
    Governance,
    GovernanceAllowance,
    Pegged,
    Collateral,
    Reserve,
    PeggedToRedeem,
    Leveraged,
    ReserveAllowance,
    LegacyPegged,
    LegacyPeggedAllowance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum QuoteSlot {
    Reserve,
    Governance,
    Markup,
}

#[async_trait::async_trait]
impl ProtocolReading for Protocol {
    async fn snapshot(&self) -> Result<StateSnapshot, Error> {
        pipeline::Pipeline {
            aggregator: &self.aggregator,
            contracts: &self.contracts,
            historic: self.historic,
        }
        .run()
        .await
    }

    #[instrument(skip_all, fields(%account))]
    async fn user_balance(&self, account: Address) -> Result<UserBalance, Error> {
        let contracts = &self.contracts;
        let uint = DynSolType::Uint(256);
        let mut batch = Batch::new();
        batch
            .push(
                BalanceSlot::Governance,
                contracts.governance,
                ERC20::balanceOfCall { owner: account }.abi_encode(),
                uint.clone(),
            )
            .push(
                BalanceSlot::GovernanceAllowance,
                contracts.governance,
                ERC20::allowanceCall {
                    owner: account,
                    spender: contracts.moc,
                }
                .abi_encode(),
                uint.clone(),
            )
            .push(
                BalanceSlot::Pegged,
                contracts.pegged,
                ERC20::balanceOfCall { owner: account }.abi_encode(),
                uint.clone(),
            )
            .push(
                BalanceSlot::Collateral,
                contracts.collateral,
                ERC20::balanceOfCall { owner: account }.abi_encode(),
                uint.clone(),
            );

        match (contracts.mode, contracts.reserve_token) {
            (Mode::ReserveToken, Some(reserve_token)) => {
                batch
                    .push(
                        BalanceSlot::Reserve,
                        reserve_token,
                        ERC20::balanceOfCall { owner: account }.abi_encode(),
                        uint.clone(),
                    )
                    .push(
                        BalanceSlot::PeggedToRedeem,
                        contracts.moc,
                        MoC::stableTokenAmountToRedeemCall { owner: account }.abi_encode(),
                        uint.clone(),
                    )
                    .push(
                        BalanceSlot::Leveraged,
                        contracts.moc,
                        MoC::riskProxBalanceOfCall {
                            bucket: buckets::X2,
                            owner: account,
                        }
                        .abi_encode(),
                        uint.clone(),
                    )
                    .push(
                        BalanceSlot::ReserveAllowance,
                        reserve_token,
                        ERC20::allowanceCall {
                            owner: account,
                            spender: contracts.moc,
                        }
                        .abi_encode(),
                        uint.clone(),
                    );
            }
            _ => {
                // Native coin needs no allowance, the spendable balance is
                // reported in its place.
                let native = Multicall2::getEthBalanceCall { addr: account }.abi_encode();
                batch
                    .push(
                        BalanceSlot::Reserve,
                        contracts.multicall,
                        native.clone(),
                        uint.clone(),
                    )
                    .push(
                        BalanceSlot::PeggedToRedeem,
                        contracts.moc,
                        MoC::docAmountToRedeemCall { owner: account }.abi_encode(),
                        uint.clone(),
                    )
                    .push(
                        BalanceSlot::Leveraged,
                        contracts.moc,
                        MoC::bproxBalanceOfCall {
                            bucket: buckets::X2,
                            owner: account,
                        }
                        .abi_encode(),
                        uint.clone(),
                    )
                    .push(
                        BalanceSlot::ReserveAllowance,
                        contracts.multicall,
                        native,
                        uint.clone(),
                    );
            }
        }

        if let Some(legacy) = contracts.legacy {
            batch
                .push(
                    BalanceSlot::LegacyPegged,
                    legacy.pegged,
                    ERC20::balanceOfCall { owner: account }.abi_encode(),
                    uint.clone(),
                )
                .push(
                    BalanceSlot::LegacyPeggedAllowance,
                    legacy.pegged,
                    ERC20::allowanceCall {
                        owner: account,
                        spender: legacy.migrator,
                    }
                    .abi_encode(),
                    uint,
                );
        }

        let decoded = batch.execute(&self.aggregator, None).await?;
        let reserve = decoded.uint(&BalanceSlot::Reserve);
        let potential_leveraged_interest = match reserve {
            Some(reserve) => ignore_non_node_error(
                MoCInrate::new(contracts.inrate, self.aggregator.provider().clone())
                    .calcMintInterestValues(buckets::X2, reserve)
                    .call()
                    .await,
            )?,
            None => None,
        };

        Ok(UserBalance {
            block: decoded.block,
            account,
            governance: decoded.uint(&BalanceSlot::Governance),
            governance_allowance: decoded.uint(&BalanceSlot::GovernanceAllowance),
            pegged: decoded.uint(&BalanceSlot::Pegged),
            collateral: decoded.uint(&BalanceSlot::Collateral),
            leveraged: decoded.uint(&BalanceSlot::Leveraged),
            reserve,
            reserve_allowance: decoded.uint(&BalanceSlot::ReserveAllowance),
            pegged_to_redeem: decoded.uint(&BalanceSlot::PeggedToRedeem),
            legacy_pegged: decoded.uint(&BalanceSlot::LegacyPegged),
            legacy_pegged_allowance: decoded.uint(&BalanceSlot::LegacyPeggedAllowance),
            potential_leveraged_interest,
        })
    }

    #[instrument(skip_all, fields(%reserve_amount, %token, %action))]
    async fn quote(
        &self,
        snapshot: &StateSnapshot,
        reserve_amount: U256,
        token: TokenKind,
        action: Action,
    ) -> Result<CommissionQuote, Error> {
        let rate_type = |asset| {
            let key = RateKey {
                action,
                token,
                asset,
            };
            snapshot
                .rate_type(key)
                .and_then(|value| u8::try_from(value).ok())
                .ok_or(Error::RateType(key))
        };
        let inrate = self.contracts.inrate;
        let uint = DynSolType::Uint(256);

        let mut batch = Batch::new();
        batch
            .push(
                QuoteSlot::Reserve,
                inrate,
                MoCInrate::calcCommissionValueCall {
                    amount: reserve_amount,
                    txType: rate_type(PaymentAsset::Reserve)?,
                }
                .abi_encode(),
                uint.clone(),
            )
            .push(
                QuoteSlot::Governance,
                inrate,
                MoCInrate::calcCommissionValueCall {
                    amount: reserve_amount,
                    txType: rate_type(PaymentAsset::Governance)?,
                }
                .abi_encode(),
                uint.clone(),
            )
            .push(
                QuoteSlot::Markup,
                inrate,
                MoCInrate::calculateVendorMarkupCall {
                    vendorAccount: self.vendor,
                    amount: reserve_amount,
                }
                .abi_encode(),
                uint,
            );
        let decoded = batch.execute(&self.aggregator, None).await?;

        let quote = CommissionQuote {
            commission_in_reserve: decoded
                .uint(&QuoteSlot::Reserve)
                .ok_or(Error::Commission("commission in reserve"))?,
            commission_in_governance: decoded
                .uint(&QuoteSlot::Governance)
                .ok_or(Error::Commission("commission in governance"))?,
            vendor_markup: decoded
                .uint(&QuoteSlot::Markup)
                .ok_or(Error::Commission("vendor markup"))?,
        };
        tracing::debug!(?quote, "quoted commissions");
        Ok(quote)
    }

    async fn mint_interest(&self, reserve_amount: U256) -> Result<U256, Error> {
        Ok(
            MoCInrate::new(self.contracts.inrate, self.aggregator.provider().clone())
                .calcMintInterestValues(buckets::X2, reserve_amount)
                .call()
                .await?,
        )
    }

    async fn vendor(&self, account: Address) -> Result<Vendor, Error> {
        let vendor = MoCVendors::new(self.contracts.vendors, self.aggregator.provider().clone())
            .vendors(account)
            .call()
            .await?;
        Ok(Vendor {
            account,
            is_active: vendor.isActive,
            markup: vendor.markup,
            total_paid_in_governance: vendor.totalPaidInMoC,
            staking: vendor.staking,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::domain::snapshot::{Field, Value},
        alloy::{
            primitives::Bytes,
            providers::mock::Asserter,
            sol_types::SolValue,
        },
        ethrpc::{mock_provider, multicall::testing::aggregate_response},
    };

    fn contracts(mode: Mode) -> ContractSet {
        ContractSet {
            mode,
            multicall: Address::repeat_byte(0x01),
            moc: Address::repeat_byte(0x02),
            connector: Address::repeat_byte(0x03),
            state: Address::repeat_byte(0x04),
            inrate: Address::repeat_byte(0x05),
            exchange: Address::repeat_byte(0x06),
            settlement: Address::repeat_byte(0x07),
            pegged: Address::repeat_byte(0x08),
            collateral: Address::repeat_byte(0x09),
            reserve_token: match mode {
                Mode::Coinbase => None,
                Mode::ReserveToken => Some(Address::repeat_byte(0x0a)),
            },
            governance: Address::repeat_byte(0x0b),
            vendors: Address::repeat_byte(0x0c),
            legacy: None,
        }
    }

    fn protocol(asserter: &Asserter, mode: Mode, historic: bool) -> Protocol {
        let provider = mock_provider(asserter.clone());
        Protocol::new(
            Aggregator::new(Address::repeat_byte(0x01), provider),
            Arc::new(contracts(mode)),
            Address::repeat_byte(0xee),
            historic,
        )
    }

    fn uint(value: u64) -> (bool, Vec<u8>) {
        (true, U256::from(value).abi_encode())
    }

    /// State round response where every uint reads `value`, every flag
    /// `false` and every address `0x11..`, except `failed` which reverted.
    fn state_response(block: u64, value: u64, failed: Option<Field>) -> Bytes {
        let mut results = Vec::new();
        for field in Field::ALL {
            results.push(if Some(field) == failed {
                (false, vec![])
            } else {
                match field.kind() {
                    crate::domain::snapshot::Kind::Uint => uint(value),
                    crate::domain::snapshot::Kind::Bool => (true, false.abi_encode()),
                    crate::domain::snapshot::Kind::Address => {
                        (true, Address::repeat_byte(0x11).abi_encode())
                    }
                }
            });
            if field == Field::SpotInrate {
                results.extend((1..=12).map(uint));
            }
        }
        aggregate_response(block, results)
    }

    #[tokio::test]
    async fn failed_read_only_nulls_its_field() {
        let asserter = Asserter::new();
        asserter.push_success(&state_response(1000, 7, Some(Field::TcDiscountPrice)));
        asserter.push_success(&aggregate_response(1000, (1..=12).map(uint).collect()));

        let snapshot = protocol(&asserter, Mode::Coinbase, false)
            .snapshot()
            .await
            .unwrap();

        assert_eq!(snapshot.block, 1000);
        assert_eq!(snapshot.mode, Mode::Coinbase);
        assert_eq!(snapshot.value(Field::TcDiscountPrice), None);
        for field in Field::ALL {
            if field != Field::TcDiscountPrice {
                assert!(snapshot.value(field).is_some(), "{field:?}");
            }
        }
        assert_eq!(snapshot.uint(Field::ReservePrice), Some(U256::from(7)));
        assert_eq!(snapshot.flag(Field::Paused), Some(false));
        assert_eq!(
            snapshot.address(Field::Vendors),
            Some(Address::repeat_byte(0x11))
        );
        assert!(snapshot.historic.is_none());
    }

    #[tokio::test]
    async fn rate_values_follow_rate_types() {
        let asserter = Asserter::new();
        asserter.push_success(&state_response(1000, 7, None));
        asserter.push_success(&aggregate_response(
            1000,
            (1..=12).map(|rate| uint(rate * 100)).collect(),
        ));

        let snapshot = protocol(&asserter, Mode::ReserveToken, false)
            .snapshot()
            .await
            .unwrap();

        let keys = RateKey::all().collect::<Vec<_>>();
        assert_eq!(snapshot.rate_type(keys[0]), Some(U256::from(1)));
        assert_eq!(snapshot.rates[&keys[0]], Some(U256::from(100)));
        assert_eq!(snapshot.rates[&keys[11]], Some(U256::from(1200)));
    }

    #[tokio::test]
    async fn historic_round_reads_a_day_back() {
        let asserter = Asserter::new();
        // Every uint, including the day block span, reads 400.
        asserter.push_success(&state_response(1000, 400, None));
        asserter.push_success(&aggregate_response(1000, (1..=12).map(uint).collect()));
        asserter.push_success(&aggregate_response(
            600,
            vec![uint(1), (false, vec![]), uint(3), uint(4)],
        ));

        let snapshot = protocol(&asserter, Mode::Coinbase, true)
            .snapshot()
            .await
            .unwrap();

        let historic = snapshot.historic.unwrap();
        assert_eq!(historic.block, 600);
        assert_eq!(historic.uint(Field::ReservePrice), Some(U256::from(1)));
        assert_eq!(historic.uint(Field::GovernancePrice), None);
        assert_eq!(historic.values[&Field::TxPriceInReserve], Some(Value::Uint(U256::from(4))));
    }

    #[tokio::test]
    async fn network_failure_aborts_the_snapshot() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("connection refused");

        let err = protocol(&asserter, Mode::Coinbase, false)
            .snapshot()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Aggregate(multicall::Error::Node(_))));
    }

    #[tokio::test]
    async fn coinbase_balance_reports_native_coin_as_allowance() {
        let asserter = Asserter::new();
        asserter.push_success(&aggregate_response(
            50,
            vec![uint(1), uint(2), uint(3), uint(4), uint(5), uint(6), uint(7), uint(5)],
        ));
        asserter.push_success(&Bytes::from(U256::from(99).abi_encode()));

        let balance = protocol(&asserter, Mode::Coinbase, false)
            .user_balance(Address::repeat_byte(0x42))
            .await
            .unwrap();

        assert_eq!(balance.block, 50);
        assert_eq!(balance.governance, Some(U256::from(1)));
        assert_eq!(balance.reserve, Some(U256::from(5)));
        assert_eq!(balance.reserve_allowance, Some(U256::from(5)));
        assert_eq!(balance.leveraged, Some(U256::from(7)));
        assert_eq!(balance.legacy_pegged, None);
        assert_eq!(balance.potential_leveraged_interest, Some(U256::from(99)));
    }

    fn with_rate_types(mode: Mode) -> StateSnapshot {
        StateSnapshot {
            block: 1,
            mode,
            values: Default::default(),
            rate_types: RateKey::all()
                .enumerate()
                .map(|(i, key)| (key, Some(U256::from(i + 1))))
                .collect(),
            rates: Default::default(),
            historic: None,
        }
    }

    #[tokio::test]
    async fn quotes_commissions_in_one_round() {
        let asserter = Asserter::new();
        asserter.push_success(&aggregate_response(
            5,
            vec![uint(10), uint(20), uint(3)],
        ));

        let quote = protocol(&asserter, Mode::Coinbase, false)
            .quote(
                &with_rate_types(Mode::Coinbase),
                U256::from(1000),
                TokenKind::Pegged,
                Action::Mint,
            )
            .await
            .unwrap();

        assert_eq!(
            quote,
            CommissionQuote {
                commission_in_reserve: U256::from(10),
                commission_in_governance: U256::from(20),
                vendor_markup: U256::from(3),
            }
        );
    }

    #[tokio::test]
    async fn quote_without_rate_type_fails_before_reading() {
        let asserter = Asserter::new();
        let mut snapshot = with_rate_types(Mode::Coinbase);
        let key = RateKey {
            action: Action::Mint,
            token: TokenKind::Leveraged,
            asset: PaymentAsset::Governance,
        };
        snapshot.rate_types.insert(key, None);

        let err = protocol(&asserter, Mode::Coinbase, false)
            .quote(&snapshot, U256::from(1), TokenKind::Leveraged, Action::Mint)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateType(missing) if missing == key));
    }
}
