//! Mint, redeem and administrative operations against a deployment.
//!
//! Every operation reads fresh state, checks locally whatever can be checked
//! before spending gas and only then hands an encoded call to the submitter.

use {
    super::{
        Error,
        balance::UserBalance,
        commission::{Payment, decide_payment_and_total},
        mode::{Action, Mode, TokenKind},
        snapshot::{Field, StateSnapshot},
        token::Tokens,
        vendor::Vendor,
    },
    crate::infra::{
        contracts::ContractSet,
        protocol::ProtocolReading,
        submitter::{Call, Submission, Submitter},
    },
    alloy::{
        primitives::{Address, U256},
        sol_types::SolCall,
    },
    bigdecimal::{BigDecimal, Zero},
    contracts::{ERC20, MoC, MoCVendors, TokenMigrator, buckets},
    number::{from_fixed_point, to_fixed_point},
    std::sync::Arc,
    tracing::instrument,
};

/// Local guard that failed before anything was submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Verification {
    #[error("insufficient {asset} balance: {required} required, {available} available")]
    InsufficientBalance {
        asset: String,
        required: BigDecimal,
        available: BigDecimal,
    },
    #[error("insufficient {asset} allowance: {required} required, {available} allowed")]
    InsufficientAllowance {
        asset: String,
        required: BigDecimal,
        available: BigDecimal,
    },
    #[error("insufficient {asset} available to {action}: {requested} requested, {available} available")]
    InsufficientLiquidity {
        asset: String,
        action: Action,
        requested: BigDecimal,
        available: BigDecimal,
    },
}

/// Allowance granted when approving without a specific amount, the largest
/// whole token amount that survives a round trip through a double.
const UNLIMITED_TOKENS: u64 = 9_007_199_254_740_991;

#[derive(Debug, Clone)]
pub struct Settings {
    pub vendor: Address,
    /// Extra reserve sent on mints, in percent of the trade.
    pub slippage: BigDecimal,
    pub tokens: Tokens,
}

pub struct Operations {
    reader: Arc<dyn ProtocolReading>,
    submitter: Submitter,
    contracts: Arc<ContractSet>,
    settings: Settings,
}

impl Operations {
    pub fn new(
        reader: Arc<dyn ProtocolReading>,
        submitter: Submitter,
        contracts: Arc<ContractSet>,
        settings: Settings,
    ) -> Self {
        Self {
            reader,
            submitter,
            contracts,
            settings,
        }
    }

    pub fn account(&self) -> Address {
        self.submitter.sender()
    }

    pub async fn status(&self) -> Result<StateSnapshot, Error> {
        Ok(self.reader.snapshot().await?)
    }

    pub async fn balance(&self, account: Address) -> Result<UserBalance, Error> {
        Ok(self.reader.user_balance(account).await?)
    }

    #[instrument(skip_all, fields(%token, %amount))]
    pub async fn mint(&self, token: TokenKind, amount: &BigDecimal) -> Result<Submission, Error> {
        let snapshot = self.reader.snapshot().await?;
        let balance = self.reader.user_balance(self.account()).await?;
        let tokens = &self.settings.tokens;

        let reserve_amount = match token {
            TokenKind::Pegged => amount / snapshot.price(Field::ReservePrice)?,
            TokenKind::Collateral => amount * snapshot.price(Field::TcPriceInReserve)?,
            TokenKind::Leveraged => amount * snapshot.price(Field::TxPriceInReserve)?,
        };
        let reserve_wei = to_fixed_point(&reserve_amount, tokens.reserve.decimals)?;

        let quote = self
            .reader
            .quote(&snapshot, reserve_wei, token, Action::Mint)
            .await?;
        let Payment {
            asset,
            total,
            ..
        } = decide_payment_and_total(
            &snapshot,
            &balance,
            &reserve_amount,
            &quote,
            tokens.governance.decimals,
        );
        let interest = match token {
            TokenKind::Leveraged => from_fixed_point(
                self.reader.mint_interest(reserve_wei).await?,
                tokens.reserve.decimals,
            ),
            _ => BigDecimal::zero(),
        };
        let slippage = &self.settings.slippage / BigDecimal::from(100) * &reserve_amount;
        let value = total + interest + &slippage;
        tracing::info!(%reserve_amount, %value, %slippage, commission_asset = %asset, "mint amounts");

        self.verify_reserve(&balance, &value)?;
        let ceiling = match token {
            TokenKind::Pegged => Some(Field::TpAvailableToMint),
            TokenKind::Leveraged => Some(Field::TxAvailableToMint),
            TokenKind::Collateral => None,
        };
        if let Some(field) = ceiling {
            self.verify_liquidity(&snapshot, field, token, Action::Mint, amount)?;
        }

        let vendor = self.settings.vendor;
        let mode = self.contracts.mode;
        let data = match (mode, token) {
            (Mode::Coinbase, TokenKind::Pegged) => MoC::mintDocVendorsCall {
                btcToMint: reserve_wei,
                vendorAccount: vendor,
            }
            .abi_encode(),
            (Mode::Coinbase, TokenKind::Collateral) => MoC::mintBProVendorsCall {
                btcToMint: reserve_wei,
                vendorAccount: vendor,
            }
            .abi_encode(),
            (Mode::Coinbase, TokenKind::Leveraged) => MoC::mintBProxVendorsCall {
                bucket: buckets::X2,
                btcToMint: reserve_wei,
                vendorAccount: vendor,
            }
            .abi_encode(),
            (Mode::ReserveToken, TokenKind::Pegged) => MoC::mintStableTokenVendorsCall {
                resTokensToMint: reserve_wei,
                vendorAccount: vendor,
            }
            .abi_encode(),
            (Mode::ReserveToken, TokenKind::Collateral) => MoC::mintRiskProVendorsCall {
                resTokensToMint: reserve_wei,
                vendorAccount: vendor,
            }
            .abi_encode(),
            (Mode::ReserveToken, TokenKind::Leveraged) => MoC::mintRiskProxVendorsCall {
                bucket: buckets::X2,
                resTokensToMint: reserve_wei,
                vendorAccount: vendor,
            }
            .abi_encode(),
        };
        // The reserve token is pulled through the allowance, only the native
        // coin travels as value.
        let value = match mode {
            Mode::Coinbase => to_fixed_point(&value, tokens.reserve.decimals)?,
            Mode::ReserveToken => U256::ZERO,
        };

        Ok(self
            .submitter
            .submit(Call {
                to: self.contracts.moc,
                data: data.into(),
                value,
            })
            .await?)
    }

    #[instrument(skip_all, fields(%token, %amount))]
    pub async fn redeem(&self, token: TokenKind, amount: &BigDecimal) -> Result<Submission, Error> {
        let snapshot = self.reader.snapshot().await?;
        let balance = self.reader.user_balance(self.account()).await?;
        let tokens = &self.settings.tokens;

        let expected = match token {
            TokenKind::Pegged => snapshot
                .price(Field::ReservePrice)
                .map(|price| amount / price),
            TokenKind::Collateral => snapshot
                .price(Field::TcPriceInReserve)
                .map(|price| amount * price),
            TokenKind::Leveraged => snapshot
                .price(Field::TxPriceInReserve)
                .map(|price| amount * price),
        };
        tracing::info!(expected_reserve = ?expected.ok(), "redeem amounts");

        let (held, name) = match token {
            TokenKind::Pegged => (balance.pegged, "pegged"),
            TokenKind::Collateral => (balance.collateral, "collateral"),
            TokenKind::Leveraged => (balance.leveraged, "leveraged"),
        };
        let held = from_fixed_point(
            held.ok_or(Error::BalanceUnavailable(name))?,
            tokens.get(token).decimals,
        );
        if *amount > held {
            return Err(Verification::InsufficientBalance {
                asset: tokens.get(token).name.clone(),
                required: amount.clone(),
                available: held,
            }
            .into());
        }
        let ceiling = match token {
            TokenKind::Pegged => Some(Field::TpAvailableToRedeem),
            TokenKind::Collateral => Some(Field::TcAvailableToRedeem),
            TokenKind::Leveraged => None,
        };
        if let Some(field) = ceiling {
            self.verify_liquidity(&snapshot, field, token, Action::Redeem, amount)?;
        }

        let amount = to_fixed_point(amount, tokens.get(token).decimals)?;
        let vendor = self.settings.vendor;
        let data = match (self.contracts.mode, token) {
            (Mode::Coinbase, TokenKind::Pegged) => MoC::redeemFreeDocVendorsCall {
                docAmount: amount,
                vendorAccount: vendor,
            }
            .abi_encode(),
            (Mode::Coinbase, TokenKind::Collateral) => MoC::redeemBProVendorsCall {
                bproAmount: amount,
                vendorAccount: vendor,
            }
            .abi_encode(),
            (Mode::Coinbase, TokenKind::Leveraged) => MoC::redeemBProxVendorsCall {
                bucket: buckets::X2,
                bproxAmount: amount,
                vendorAccount: vendor,
            }
            .abi_encode(),
            (Mode::ReserveToken, TokenKind::Pegged) => MoC::redeemFreeStableTokenVendorsCall {
                stableTokenAmount: amount,
                vendorAccount: vendor,
            }
            .abi_encode(),
            (Mode::ReserveToken, TokenKind::Collateral) => MoC::redeemRiskProVendorsCall {
                riskProAmount: amount,
                vendorAccount: vendor,
            }
            .abi_encode(),
            (Mode::ReserveToken, TokenKind::Leveraged) => MoC::redeemRiskProxVendorsCall {
                bucket: buckets::X2,
                riskProxAmount: amount,
                vendorAccount: vendor,
            }
            .abi_encode(),
        };

        Ok(self
            .submitter
            .submit(Call {
                to: self.contracts.moc,
                data: data.into(),
                value: U256::ZERO,
            })
            .await?)
    }

    /// Lets the protocol pull governance tokens to pay commissions.
    pub async fn allow_governance_commission(&self, allow: bool) -> Result<Submission, Error> {
        self.approve(self.contracts.governance, self.contracts.moc, unlimited(allow))
            .await
    }

    /// Lets the protocol pull reserve tokens on mints.
    pub async fn allow_reserve(&self, allow: bool) -> Result<Submission, Error> {
        let reserve_token = match (self.contracts.mode, self.contracts.reserve_token) {
            (Mode::ReserveToken, Some(reserve_token)) => reserve_token,
            (actual, _) => {
                return Err(Error::WrongMode {
                    expected: Mode::ReserveToken,
                    actual,
                });
            }
        };
        let amount = if allow { U256::MAX } else { U256::ZERO };
        self.approve(reserve_token, self.contracts.moc, amount).await
    }

    pub async fn vendor_info(&self, account: Option<Address>) -> Result<Vendor, Error> {
        Ok(self
            .reader
            .vendor(account.unwrap_or(self.settings.vendor))
            .await?)
    }

    /// Lets the vendors contract pull governance tokens for staking.
    pub async fn vendor_allowance(&self, allow: bool) -> Result<Submission, Error> {
        self.approve(self.contracts.governance, self.contracts.vendors, unlimited(allow))
            .await
    }

    pub async fn add_stake(&self, amount: &BigDecimal) -> Result<Submission, Error> {
        let staking = to_fixed_point(amount, self.settings.tokens.governance.decimals)?;
        self.send(
            self.contracts.vendors,
            MoCVendors::addStakeCall { staking }.abi_encode(),
        )
        .await
    }

    pub async fn remove_stake(&self, amount: &BigDecimal) -> Result<Submission, Error> {
        let staking = to_fixed_point(amount, self.settings.tokens.governance.decimals)?;
        self.send(
            self.contracts.vendors,
            MoCVendors::removeStakeCall { staking }.abi_encode(),
        )
        .await
    }

    /// Lets the migrator pull the legacy pegged tokens.
    pub async fn allow_token_migrator(&self, allow: bool) -> Result<Submission, Error> {
        let legacy = self
            .contracts
            .legacy
            .ok_or(Error::NotConfigured("token migrator"))?;
        self.approve(legacy.pegged, legacy.migrator, unlimited(allow))
            .await
    }

    pub async fn migrate_token(&self) -> Result<Submission, Error> {
        let legacy = self
            .contracts
            .legacy
            .ok_or(Error::NotConfigured("token migrator"))?;
        self.send(legacy.migrator, TokenMigrator::migrateTokenCall {}.abi_encode())
            .await
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Submission, Error> {
        tracing::info!(%token, %spender, %amount, "approving");
        self.send(token, ERC20::approveCall { spender, amount }.abi_encode())
            .await
    }

    async fn send(&self, to: Address, data: Vec<u8>) -> Result<Submission, Error> {
        Ok(self
            .submitter
            .submit(Call {
                to,
                data: data.into(),
                value: U256::ZERO,
            })
            .await?)
    }

    fn verify_reserve(&self, balance: &UserBalance, value: &BigDecimal) -> Result<(), Error> {
        let reserve = &self.settings.tokens.reserve;
        let available = from_fixed_point(
            balance.reserve.ok_or(Error::BalanceUnavailable("reserve"))?,
            reserve.decimals,
        );
        if *value > available {
            return Err(Verification::InsufficientBalance {
                asset: reserve.name.clone(),
                required: value.clone(),
                available,
            }
            .into());
        }
        if self.contracts.mode == Mode::ReserveToken {
            let allowed = from_fixed_point(
                balance
                    .reserve_allowance
                    .ok_or(Error::BalanceUnavailable("reserve allowance"))?,
                reserve.decimals,
            );
            if *value > allowed {
                return Err(Verification::InsufficientAllowance {
                    asset: reserve.name.clone(),
                    required: value.clone(),
                    available: allowed,
                }
                .into());
            }
        }
        Ok(())
    }

    fn verify_liquidity(
        &self,
        snapshot: &StateSnapshot,
        field: Field,
        token: TokenKind,
        action: Action,
        requested: &BigDecimal,
    ) -> Result<(), Error> {
        let available = snapshot.decimal(field)?;
        if *requested > available {
            return Err(Verification::InsufficientLiquidity {
                asset: self.settings.tokens.get(token).name.clone(),
                action,
                requested: requested.clone(),
                available,
            }
            .into());
        }
        Ok(())
    }
}

fn unlimited(allow: bool) -> U256 {
    if allow {
        U256::from(UNLIMITED_TOKENS) * U256::from(10).pow(U256::from(18))
    } else {
        U256::ZERO
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            domain::{
                commission::CommissionQuote,
                testing::{dec, snapshot, wei},
                token::Token,
            },
            infra::{
                contracts::Legacy,
                protocol::MockProtocolReading,
                submitter::{EventRegistry, MockNode},
            },
        },
        alloy::{
            network::EthereumWallet,
            primitives::{B256, TxKind},
            signers::local::PrivateKeySigner,
        },
        mockall::predicate::eq,
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
            reserve_token: (mode == Mode::ReserveToken).then(|| Address::repeat_byte(0x0a)),
            governance: Address::repeat_byte(0x0b),
            vendors: Address::repeat_byte(0x0c),
            legacy: None,
        }
    }

    fn settings() -> Settings {
        Settings {
            vendor: Address::repeat_byte(0xee),
            slippage: dec("1"),
            tokens: Tokens {
                reserve: Token::new("RBTC"),
                pegged: Token::new("DOC"),
                collateral: Token::new("BPRO"),
                leveraged: Token::new("BTCX"),
                governance: Token::new("MOC"),
            },
        }
    }

    fn operations(reader: MockProtocolReading, node: MockNode, contracts: ContractSet) -> Operations {
        observe::tracing::initialize_reentrant(
            &observe::Config::default().with_env_filter("moc=debug"),
        );
        let signer = PrivateKeySigner::from_bytes(&B256::repeat_byte(0x01)).unwrap();
        let sender = signer.address();
        let submitter = Submitter::new(
            Arc::new(node),
            EthereumWallet::from(signer),
            sender,
            dec("1.2"),
            None,
            EventRegistry::default(),
        );
        Operations::new(Arc::new(reader), submitter, Arc::new(contracts), settings())
    }

    /// A node that must never be asked for anything.
    fn untouched_node() -> MockNode {
        let mut node = MockNode::new();
        node.expect_estimate_gas().never();
        node.expect_broadcast().never();
        node
    }

    fn reader(state: StateSnapshot, balance: UserBalance) -> MockProtocolReading {
        let mut reader = MockProtocolReading::new();
        reader
            .expect_snapshot()
            .returning(move || Ok(state.clone()));
        reader
            .expect_user_balance()
            .returning(move |_| Ok(balance.clone()));
        reader
    }

    fn coinbase_state(available_to_mint: &str) -> StateSnapshot {
        snapshot(
            Mode::Coinbase,
            &[
                (Field::ReservePrice, wei("20000")),
                (Field::GovernancePrice, wei("0.5")),
                (Field::TpAvailableToMint, wei(available_to_mint)),
                (Field::TpAvailableToRedeem, wei("1000")),
            ],
        )
    }

    fn rich_balance() -> UserBalance {
        UserBalance {
            reserve: Some(wei("1")),
            reserve_allowance: Some(wei("1")),
            governance: Some(U256::ZERO),
            governance_allowance: Some(U256::ZERO),
            pegged: Some(wei("50")),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn mint_pegged_in_coinbase_mode() {
        let mut reader = reader(coinbase_state("1000"), rich_balance());
        reader
            .expect_quote()
            .withf(|_, amount, token, action| {
                *amount == wei("0.005") && *token == TokenKind::Pegged && *action == Action::Mint
            })
            .returning(|_, _, _, _| Ok(CommissionQuote::default()));
        reader.expect_mint_interest().never();

        let expected_data = MoC::mintDocVendorsCall {
            btcToMint: wei("0.005"),
            vendorAccount: Address::repeat_byte(0xee),
        }
        .abi_encode();
        let mut node = MockNode::new();
        node.expect_estimate_gas()
            .withf(move |tx| {
                tx.to == Some(TxKind::Call(Address::repeat_byte(0x02)))
                    && tx.value == Some(wei("0.00505"))
                    && tx.input.input().map(|input| input.to_vec()) == Some(expected_data.clone())
            })
            .times(1)
            .returning(|_| Ok(100_000));
        node.expect_gas_price().returning(|| Ok(60_000_000));
        node.expect_nonce().returning(|_| Ok(0));
        node.expect_chain_id().returning(|| Ok(31));
        node.expect_broadcast()
            .times(1)
            .returning(|_| Ok(B256::repeat_byte(0x77)));
        node.expect_wait_for_receipt()
            .with(eq(B256::repeat_byte(0x77)), eq(None))
            .returning(|_, _| Ok(None));

        let submission = operations(reader, node, contracts(Mode::Coinbase))
            .mint(TokenKind::Pegged, &dec("100"))
            .await
            .unwrap();

        assert!(matches!(
            submission,
            Submission::PendingConfirmation { tx_hash } if tx_hash == B256::repeat_byte(0x77)
        ));
    }

    #[tokio::test]
    async fn mint_above_ceiling_never_reaches_the_node() {
        let mut reader = reader(coinbase_state("50"), rich_balance());
        reader
            .expect_quote()
            .returning(|_, _, _, _| Ok(CommissionQuote::default()));

        let err = operations(reader, untouched_node(), contracts(Mode::Coinbase))
            .mint(TokenKind::Pegged, &dec("100"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Verification(Verification::InsufficientLiquidity {
                action: Action::Mint,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn mint_beyond_reserve_balance_fails() {
        let balance = UserBalance {
            reserve: Some(wei("0.005")),
            ..rich_balance()
        };
        let mut reader = reader(coinbase_state("1000"), balance);
        reader
            .expect_quote()
            .returning(|_, _, _, _| Ok(CommissionQuote::default()));

        let err = operations(reader, untouched_node(), contracts(Mode::Coinbase))
            .mint(TokenKind::Pegged, &dec("100"))
            .await
            .unwrap_err();

        // 0.005 plus one percent slippage does not fit into 0.005.
        assert!(matches!(
            err,
            Error::Verification(Verification::InsufficientBalance { .. })
        ));
    }

    #[tokio::test]
    async fn reserve_token_mint_needs_allowance_and_sends_no_value() {
        let state = snapshot(
            Mode::ReserveToken,
            &[
                (Field::ReservePrice, wei("1")),
                (Field::TcPriceInReserve, wei("2")),
            ],
        );
        let balance = UserBalance {
            reserve: Some(wei("100")),
            reserve_allowance: Some(wei("10")),
            ..Default::default()
        };
        let mut reader = reader(state, balance);
        reader
            .expect_quote()
            .returning(|_, _, _, _| Ok(CommissionQuote::default()));

        let ops = operations(reader, untouched_node(), contracts(Mode::ReserveToken));
        let err = ops
            .mint(TokenKind::Collateral, &dec("5"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Verification(Verification::InsufficientAllowance { .. })
        ));

        let state = snapshot(Mode::ReserveToken, &[(Field::TcPriceInReserve, wei("2"))]);
        let balance = UserBalance {
            reserve: Some(wei("100")),
            reserve_allowance: Some(wei("100")),
            ..Default::default()
        };
        let mut reader = self::reader(state, balance);
        reader
            .expect_quote()
            .returning(|_, _, _, _| Ok(CommissionQuote::default()));
        let mut node = MockNode::new();
        node.expect_estimate_gas()
            .withf(|tx| tx.value == Some(U256::ZERO))
            .returning(|_| Err(alloy::transports::TransportErrorKind::custom_str("revert")));
        node.expect_broadcast().never();

        let err = operations(reader, node, contracts(Mode::ReserveToken))
            .mint(TokenKind::Collateral, &dec("5"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Submission(crate::infra::submitter::Error::GasEstimation { .. })
        ));
    }

    #[tokio::test]
    async fn leveraged_mint_adds_interest() {
        let state = snapshot(
            Mode::Coinbase,
            &[
                (Field::TxPriceInReserve, wei("0.5")),
                (Field::TxAvailableToMint, wei("10")),
            ],
        );
        let balance = UserBalance {
            reserve: Some(wei("1.02")),
            ..Default::default()
        };
        let mut reader = reader(state, balance);
        reader
            .expect_quote()
            .returning(|_, _, _, _| Ok(CommissionQuote::default()));
        reader
            .expect_mint_interest()
            .with(eq(wei("1")))
            .times(1)
            .returning(|_| Ok(wei("0.02")));

        // 1 + 0.02 interest + 0.01 slippage exceeds the 1.02 balance.
        let err = operations(reader, untouched_node(), contracts(Mode::Coinbase))
            .mint(TokenKind::Leveraged, &dec("2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Verification(Verification::InsufficientBalance { ref required, .. })
                if *required == dec("1.03")
        ));
    }

    #[tokio::test]
    async fn redeem_beyond_balance_fails_before_quoting() {
        let mut reader = reader(coinbase_state("1000"), rich_balance());
        reader.expect_quote().never();

        let err = operations(reader, untouched_node(), contracts(Mode::Coinbase))
            .redeem(TokenKind::Pegged, &dec("60"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "insufficient DOC balance: 60 required, 50 available"
        );
    }

    #[test]
    fn guard_failures_surface_through_the_domain_error() {
        let err = Error::from(Verification::InsufficientLiquidity {
            asset: "BTCX".to_owned(),
            action: Action::Mint,
            requested: dec("2"),
            available: dec("1.5"),
        });

        assert_eq!(
            err.to_string(),
            "insufficient BTCX available to mint: 2 requested, 1.5 available"
        );
        assert!(matches!(
            err,
            Error::Verification(Verification::InsufficientLiquidity { .. })
        ));
    }

    #[tokio::test]
    async fn redeem_beyond_free_pegged_fails() {
        let state = snapshot(
            Mode::Coinbase,
            &[
                (Field::ReservePrice, wei("20000")),
                (Field::TpAvailableToRedeem, wei("10")),
            ],
        );
        let reader = reader(state, rich_balance());

        let err = operations(reader, untouched_node(), contracts(Mode::Coinbase))
            .redeem(TokenKind::Pegged, &dec("20"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Verification(Verification::InsufficientLiquidity {
                action: Action::Redeem,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unreadable_ceiling_is_unavailable() {
        let state = snapshot(Mode::Coinbase, &[(Field::ReservePrice, wei("20000"))]);
        let reader = reader(state, rich_balance());

        let err = operations(reader, untouched_node(), contracts(Mode::Coinbase))
            .redeem(TokenKind::Pegged, &dec("20"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Unavailable(unavailable) if unavailable.0 == Field::TpAvailableToRedeem
        ));
    }

    #[tokio::test]
    async fn reserve_allowance_requires_reserve_token_mode() {
        let ops = operations(
            MockProtocolReading::new(),
            untouched_node(),
            contracts(Mode::Coinbase),
        );

        let err = ops.allow_reserve(true).await.unwrap_err();

        assert!(matches!(
            err,
            Error::WrongMode {
                expected: Mode::ReserveToken,
                actual: Mode::Coinbase,
            }
        ));
    }

    #[tokio::test]
    async fn migration_requires_legacy_contracts() {
        let ops = operations(
            MockProtocolReading::new(),
            untouched_node(),
            contracts(Mode::Coinbase),
        );
        assert!(matches!(
            ops.migrate_token().await.unwrap_err(),
            Error::NotConfigured(_)
        ));
    }

    #[tokio::test]
    async fn governance_allowance_approves_the_protocol() {
        let expected = ERC20::approveCall {
            spender: Address::repeat_byte(0x02),
            amount: wei("9007199254740991"),
        }
        .abi_encode();
        let mut node = MockNode::new();
        node.expect_estimate_gas()
            .withf(move |tx| {
                tx.to == Some(TxKind::Call(Address::repeat_byte(0x0b)))
                    && tx.input.input().map(|input| input.to_vec()) == Some(expected.clone())
            })
            .returning(|_| Err(alloy::transports::TransportErrorKind::custom_str("stop")));

        let err = operations(MockProtocolReading::new(), node, contracts(Mode::Coinbase))
            .allow_governance_commission(true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Submission(crate::infra::submitter::Error::GasEstimation { .. })
        ));
    }

    #[tokio::test]
    async fn token_migrator_allowance_targets_legacy_token() {
        let mut contracts = contracts(Mode::Coinbase);
        contracts.legacy = Some(Legacy {
            pegged: Address::repeat_byte(0x21),
            migrator: Address::repeat_byte(0x22),
        });
        let expected = ERC20::approveCall {
            spender: Address::repeat_byte(0x22),
            amount: U256::ZERO,
        }
        .abi_encode();
        let mut node = MockNode::new();
        node.expect_estimate_gas()
            .withf(move |tx| {
                tx.to == Some(TxKind::Call(Address::repeat_byte(0x21)))
                    && tx.input.input().map(|input| input.to_vec()) == Some(expected.clone())
            })
            .returning(|_| Err(alloy::transports::TransportErrorKind::custom_str("stop")));

        let err = operations(MockProtocolReading::new(), node, contracts)
            .allow_token_migrator(false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Submission(_)));
    }
}
